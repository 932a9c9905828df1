use serde::Serialize;

use super::category::Category;
use super::knowledge::{
    DisposalGuide, EnvironmentalImpact, MonitoringGuide, ProsCons, SanitizationGuide,
    StorageGuide,
};

/// 1リクエスト分の分類結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// 常に [0, 1] に収まる。
    pub confidence: f64,
    /// 判定経路を示す人間向けの説明。
    pub method: String,
}

impl ClassificationResult {
    #[must_use]
    pub fn new(category: Category, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            category,
            confidence: clamp_unit(confidence),
            method: method.into(),
        }
    }
}

/// 呼び出し元に返す最終結果。分類フィールドと知識ベースの案内をまとめたもの。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalResult {
    pub category: Category,
    pub confidence: f64,
    pub detection_method: String,
    pub waste_name: String,
    pub examples: Vec<String>,
    pub risk_level: String,
    pub risk_reason: String,
    pub storage: StorageGuide,
    pub sanitization: SanitizationGuide,
    pub disposal: DisposalGuide,
    pub monitoring: MonitoringGuide,
    pub tools_required: Vec<String>,
    pub environmental_impact: EnvironmentalImpact,
    pub pros_cons: ProsCons,
}

/// NaN は 0 に倒す。
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
