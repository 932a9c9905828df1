//! 画像分類の段階的フォールバック。
//!
//! 段は上から順に一度ずつだけ試行し、最初に確定した段の結果を返す。
//! 学習済みモデル → 汎用認識 → ファイル名 → ランダム の順で、最後の段は必ず確定する。
use rand::Rng;
use tracing::{debug, info};

use super::calibration::{CalibrationParams, calibrate};
use super::capability::{CapabilitySet, Escalation, TierOutcome};
use super::keywords::{FILENAME_RULES, RuleTable, normalize_filename, score};
use super::preprocess::DecodedImage;
use crate::domain::{Category, ClassificationResult};

/// ランダム段の確信度の範囲（上端は含まない）。
pub const RANDOM_CONFIDENCE_MIN: f64 = 0.55;
pub const RANDOM_CONFIDENCE_MAX: f64 = 0.70;

pub const RANDOM_METHOD: &str = "Low confidence - train a model for better accuracy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    CustomModel,
    GenericVision,
    FilenameHeuristic,
    Random,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CustomModel => "custom_model",
            Self::GenericVision => "generic_vision",
            Self::FilenameHeuristic => "filename_heuristic",
            Self::Random => "random",
        }
    }
}

/// パイプライン1回分の結果と経路。
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub result: ClassificationResult,
    pub decided_by: Tier,
    /// 確定前に通過した段とその理由。
    pub escalations: Vec<(Tier, Escalation)>,
}

#[derive(Debug, Clone)]
pub struct ClassificationPipeline {
    capabilities: CapabilitySet,
    filename_rules: &'static RuleTable,
}

impl ClassificationPipeline {
    #[must_use]
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities,
            filename_rules: &FILENAME_RULES,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// スレッドローカルの乱数でパイプラインを実行する。
    #[must_use]
    pub fn run(&self, image: &DecodedImage, filename: &str) -> PipelineOutcome {
        self.run_with_rng(image, filename, &mut rand::rng())
    }

    /// `filename` は小文字化済みを想定する。
    pub fn run_with_rng<R: Rng>(
        &self,
        image: &DecodedImage,
        filename: &str,
        rng: &mut R,
    ) -> PipelineOutcome {
        let mut escalations = Vec::new();
        // Random is terminal and handled after the loop
        let attempts: [(Tier, &dyn Fn() -> TierOutcome); 3] = [
            (Tier::CustomModel, &|| self.capabilities.trained().classify(image)),
            (Tier::GenericVision, &|| self.capabilities.vision().classify(image)),
            (Tier::FilenameHeuristic, &|| filename_tier(filename, self.filename_rules)),
        ];

        for (tier, attempt) in attempts {
            match attempt() {
                TierOutcome::Decided(result) => {
                    return decided(result, tier, escalations);
                }
                TierOutcome::Escalate(reason) => {
                    debug!(tier = tier.as_str(), reason = %reason, "tier escalated");
                    escalations.push((tier, reason));
                }
            }
        }

        let result = random_tier(image.byte_len(), rng);
        decided(result, Tier::Random, escalations)
    }
}

fn decided(
    result: ClassificationResult,
    tier: Tier,
    escalations: Vec<(Tier, Escalation)>,
) -> PipelineOutcome {
    info!(
        tier = tier.as_str(),
        category = %result.category,
        confidence = result.confidence,
        escalations = escalations.len(),
        "image classified"
    );
    PipelineOutcome {
        result,
        decided_by: tier,
        escalations,
    }
}

/// ファイル名のキーワードだけで判定する。一致がなければ昇格。
#[must_use]
pub fn filename_tier(filename: &str, rules: &RuleTable) -> TierOutcome {
    let normalized = normalize_filename(filename);
    let Some(hit) = score(&normalized, rules) else {
        return TierOutcome::Escalate(Escalation::NoMatch);
    };

    let confidence = calibrate(hit.best_score, hit.total_score, CalibrationParams::FILENAME);
    let detected = hit
        .matched_keywords
        .iter()
        .take(2)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    TierOutcome::Decided(ClassificationResult::new(
        hit.category,
        confidence,
        format!("Filename analysis: detected '{detected}'"),
    ))
}

/// 最終段。カテゴリはバイト長から決まるが、確信度は呼び出しごとに変わる。
///
/// パイプラインで唯一の非決定的な箇所。テストでは `rng` にシード付きの乱数を渡す。
pub fn random_tier<R: Rng>(byte_len: usize, rng: &mut R) -> ClassificationResult {
    let category = Category::ALL[byte_len % Category::ALL.len()];
    let confidence = rng.random_range(RANDOM_CONFIDENCE_MIN..RANDOM_CONFIDENCE_MAX);
    ClassificationResult::new(category, confidence, RANDOM_METHOD)
}
