//! Prometheusメトリクス定義。
use std::fmt;

use prometheus::{
    HistogramVec, IntCounterVec, Registry, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry,
};

use crate::classification::ImageClassification;
use crate::domain::Category;

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// 分類経路。ラベル値として使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyPath {
    Text,
    Image,
}

impl ClassifyPath {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// メトリクスコレクター。
#[derive(Clone)]
pub struct Metrics {
    pub classifications: IntCounterVec,
    pub decisions: IntCounterVec,
    pub escalations: IntCounterVec,
    pub failures: IntCounterVec,
    pub duration: HistogramVec,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// # Errors
    /// 同名のメトリクスが登録済みの場合はエラーを返す。
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            classifications: register_int_counter_vec_with_registry!(
                "waste_classifications_total",
                "Total number of successful classifications",
                &["path", "category"],
                registry
            )?,
            decisions: register_int_counter_vec_with_registry!(
                "waste_pipeline_decisions_total",
                "Image classifications by deciding tier",
                &["tier"],
                registry
            )?,
            escalations: register_int_counter_vec_with_registry!(
                "waste_pipeline_escalations_total",
                "Tier escalations by tier and reason",
                &["tier", "reason"],
                registry
            )?,
            failures: register_int_counter_vec_with_registry!(
                "waste_classification_failures_total",
                "Classification requests that returned an error",
                &["path", "kind"],
                registry
            )?,
            duration: register_histogram_vec_with_registry!(
                "waste_classification_duration_seconds",
                "Classification latency in seconds",
                &["path"],
                DURATION_BUCKETS.to_vec(),
                registry
            )?,
        })
    }

    pub fn record_text(&self, category: Category, seconds: f64) {
        self.record_success(ClassifyPath::Text, category, seconds);
    }

    pub fn record_image(&self, classification: &ImageClassification, seconds: f64) {
        self.record_success(ClassifyPath::Image, classification.result.category, seconds);
        self.decisions
            .with_label_values(&[classification.decided_by.as_str()])
            .inc();
        for (tier, reason) in &classification.escalations {
            self.escalations
                .with_label_values(&[tier.as_str(), reason.reason()])
                .inc();
        }
    }

    pub fn record_failure(&self, path: ClassifyPath, kind: &str) {
        self.failures.with_label_values(&[path.as_str(), kind]).inc();
    }

    fn record_success(&self, path: ClassifyPath, category: Category, seconds: f64) {
        self.classifications
            .with_label_values(&[path.as_str(), category.as_str()])
            .inc();
        self.duration
            .with_label_values(&[path.as_str()])
            .observe(seconds);
    }
}
