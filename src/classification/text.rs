//! テキスト記述の分類。
use tracing::debug;

use super::calibration::{CalibrationParams, calibrate};
use super::keywords::{RuleTable, TEXT_RULES, normalize_text, score};
use crate::domain::{Category, ClassificationResult};

/// どのキーワードにも一致しなかった場合の既定カテゴリ。
pub const DEFAULT_CATEGORY: Category = Category::DryWaste;
/// 既定カテゴリを返すときの固定確信度。
pub const DEFAULT_CONFIDENCE: f64 = 0.50;

const SNIPPET_CHARS: usize = 50;

/// 3段重みのキーワード分類器。入力に対して純粋関数として振る舞う。
#[derive(Debug, Clone)]
pub struct TextClassifier {
    rules: &'static RuleTable,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self { rules: &TEXT_RULES }
    }
}

impl TextClassifier {
    #[must_use]
    pub fn with_rules(rules: &'static RuleTable) -> Self {
        Self { rules }
    }

    /// 空でない文字列を前提とする。空入力の検証は境界側の責務。
    #[must_use]
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = normalize_text(text);
        let method = describe(text);

        match score(&normalized, self.rules) {
            Some(hit) => {
                let confidence =
                    calibrate(hit.best_score, hit.total_score, CalibrationParams::TEXT);
                debug!(
                    category = %hit.category,
                    best_score = hit.best_score,
                    total_score = hit.total_score,
                    keywords = ?hit.matched_keywords,
                    "text keywords matched"
                );
                ClassificationResult::new(hit.category, confidence, method)
            }
            None => {
                debug!("no text keywords matched; using default category");
                ClassificationResult::new(DEFAULT_CATEGORY, DEFAULT_CONFIDENCE, method)
            }
        }
    }
}

fn describe(text: &str) -> String {
    let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("Classified based on text analysis: '{snippet}...'")
}
