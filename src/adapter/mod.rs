//! 起動時に構築する外部分類器の実体。
pub mod linear_model;
pub mod remote_vision;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::classification::{CapabilitySet, ClassIndex};
use crate::config::Config;

pub use linear_model::{LinearImageModel, load_class_indices};
pub use remote_vision::{RemoteVisionClient, RemoteVisionConfig};

const VISION_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// 設定に従って分類器を構築する。未設定のものは `Absent` のまま。
///
/// # Errors
/// 設定された成果物の読み込みやクライアント構築に失敗した場合はエラーを返す。
pub fn load_capabilities(config: &Config) -> Result<CapabilitySet> {
    let mut capabilities = CapabilitySet::absent();

    if let Some(path) = config.model_weights_path() {
        let model = LinearImageModel::from_path(path).context("failed to load trained model")?;
        let classes = match config.model_class_indices_path() {
            Some(indices) => load_class_indices(indices)?,
            None => ClassIndex::default(),
        };
        anyhow::ensure!(
            classes.len() == model.class_count(),
            "class index has {} entries but the model outputs {}",
            classes.len(),
            model.class_count()
        );
        info!(path = ?path, classes = classes.len(), "trained model loaded");
        capabilities = capabilities.with_trained_model(Arc::new(model), classes);
    } else if config.model_class_indices_path().is_some() {
        warn!("class indices configured without model weights; ignoring");
    }

    if let Some(base_url) = config.vision_base_url() {
        let client = RemoteVisionClient::new(RemoteVisionConfig {
            base_url: base_url.to_string(),
            connect_timeout: VISION_CONNECT_TIMEOUT.min(config.vision_timeout()),
            total_timeout: config.vision_timeout(),
        })
        .context("failed to build vision client")?;
        info!(base_url, "generic vision client configured");
        capabilities = capabilities.with_generic_vision(Arc::new(client));
    }

    if capabilities.trained().is_absent() && capabilities.vision().is_absent() {
        info!("no image classifier configured; using filename heuristic");
    }
    Ok(capabilities)
}
