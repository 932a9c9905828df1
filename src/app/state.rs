use std::sync::Arc;
use std::time::Duration;

use crate::classification::WasteClassifier;
use crate::config::Config;
use crate::observability::Telemetry;

/// ハンドラ間で共有する状態。すべて読み取り専用。
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: Arc<WasteClassifier>,
    pub telemetry: Telemetry,
    /// 1回の分類に許す時間。
    pub classify_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    #[must_use]
    pub fn from_config(config: &Config, classifier: WasteClassifier, telemetry: Telemetry) -> Self {
        Self {
            classifier: Arc::new(classifier),
            telemetry,
            classify_timeout: config.classify_timeout(),
            max_upload_bytes: config.max_upload_bytes(),
        }
    }
}
