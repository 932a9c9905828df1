//! HTTP 越しの汎用画像認識サービスクライアント。
//!
//! コアからは同期的に見える。構築時に捕まえたランタイムハンドルで非同期呼び出しを待つため、
//! `predict` はブロッキングスレッドからのみ呼ぶこと。
use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use image::ImageFormat;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::CapabilityError;
use crate::port::{Detection, GenericVision, ModelInput};

const LABELS_PATH: &str = "v1/labels";

#[derive(Debug, Deserialize)]
struct LabelsResponse {
    labels: Vec<LabelScore>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Clone)]
pub struct RemoteVisionConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RemoteVisionClient {
    client: Client,
    labels_url: Url,
    name: String,
    handle: Handle,
}

impl RemoteVisionClient {
    /// 現在のランタイムのハンドルを捕まえてクライアントを作る。
    ///
    /// # Errors
    /// ランタイム外で呼ばれた場合、URL が不正な場合、HTTP クライアントの構築に失敗した場合。
    pub fn new(config: RemoteVisionConfig) -> Result<Self> {
        let handle = Handle::try_current().context("vision client requires a tokio runtime")?;
        Self::with_handle(config, handle)
    }

    /// # Errors
    /// URL が不正、または HTTP クライアントの構築に失敗した場合はエラーを返す。
    pub fn with_handle(config: RemoteVisionConfig, handle: Handle) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build vision HTTP client")?;

        // trailing slash so join keeps any path prefix
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).context("invalid vision base URL")?;
        let labels_url = base_url
            .join(LABELS_PATH)
            .context("failed to build vision labels URL")?;
        let name = format!("remote:{}", base_url.host_str().unwrap_or("unknown"));

        Ok(Self {
            client,
            labels_url,
            name,
            handle,
        })
    }

    /// PNG 画像を送り、スコア降順のラベル列を受け取る。
    ///
    /// # Errors
    /// 通信失敗、非 2xx 応答、応答のパース失敗は [`CapabilityError::Transport`]。
    pub async fn labels(&self, png: Vec<u8>) -> Result<Vec<Detection>, CapabilityError> {
        let response = self
            .client
            .post(self.labels_url.clone())
            .header(CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await
            .map_err(|error| CapabilityError::Transport(format!("vision request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Transport(format!(
                "vision service returned {status}: {body}"
            )));
        }

        let parsed: LabelsResponse = response.json().await.map_err(|error| {
            CapabilityError::Transport(format!("failed to parse vision response: {error}"))
        })?;

        let mut detections = parsed
            .labels
            .into_iter()
            .map(|entry| Detection {
                label: entry.label,
                score: entry.score,
            })
            .collect::<Vec<_>>();
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!(count = detections.len(), "vision labels received");
        Ok(detections)
    }
}

impl GenericVision for RemoteVisionClient {
    fn predict(&self, input: &ModelInput) -> Result<Vec<Detection>, CapabilityError> {
        let mut png = Vec::new();
        input
            .rgb
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|error| CapabilityError::Input(format!("failed to encode png: {error}")))?;
        self.handle.block_on(self.labels(png))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
