use tracing::warn;

use crate::domain::{ClassificationResult, FinalResult, KnowledgeBase, KnowledgeRecord};

/// 分類結果に知識ベースの案内を結合する。該当がなければ名前だけの代替を使う。
#[must_use]
pub fn join(result: ClassificationResult, knowledge: &KnowledgeBase) -> FinalResult {
    let record = match knowledge.get(result.category) {
        Some(record) => record.clone(),
        None => {
            warn!(category = %result.category, "no knowledge record; using placeholder");
            KnowledgeRecord::placeholder(result.category)
        }
    };

    let waste_name = if record.name.is_empty() {
        result.category.as_str().to_string()
    } else {
        record.name
    };

    FinalResult {
        category: result.category,
        confidence: result.confidence,
        detection_method: result.method,
        waste_name,
        examples: record.examples,
        risk_level: record.risk_level,
        risk_reason: record.risk_reason,
        storage: record.storage,
        sanitization: record.sanitization,
        disposal: record.disposal,
        monitoring: record.monitoring,
        tools_required: record.tools_required,
        environmental_impact: record.environmental_impact,
        pros_cons: record.pros_cons,
    }
}
