//! 廃棄物分類のコア。テキスト経路と画像の段階的パイプラインを束ねる。
pub mod calibration;
pub mod capability;
pub mod join;
pub mod keywords;
pub mod pipeline;
pub mod preprocess;
pub mod text;

use std::sync::Arc;

use tracing::instrument;

use crate::domain::{FinalResult, KnowledgeBase};
use crate::error::ClassifyError;

pub use capability::{CapabilitySet, ClassIndex, ClassifierCapability, Escalation, TierOutcome};
pub use pipeline::{ClassificationPipeline, PipelineOutcome, Tier};
pub use text::TextClassifier;

/// 画像分類の最終結果と、どの段で確定したか。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageClassification {
    pub result: FinalResult,
    pub decided_by: Tier,
    pub escalations: Vec<(Tier, Escalation)>,
}

/// 分類の入口。構築後は不変で、スレッド間で共有できる。
#[derive(Debug, Clone)]
pub struct WasteClassifier {
    text: TextClassifier,
    pipeline: ClassificationPipeline,
    knowledge: Arc<KnowledgeBase>,
}

impl WasteClassifier {
    #[must_use]
    pub fn new(capabilities: CapabilitySet, knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            text: TextClassifier::default(),
            pipeline: ClassificationPipeline::new(capabilities),
            knowledge,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        self.pipeline.capabilities()
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// # Errors
    /// 空または空白だけの入力は [`ClassifyError::InputValidation`]。
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn classify_text(&self, text: &str) -> Result<FinalResult, ClassifyError> {
        if text.trim().is_empty() {
            return Err(ClassifyError::InputValidation("text is empty".into()));
        }
        let result = self.text.classify(text);
        Ok(join::join(result, &self.knowledge))
    }

    /// # Errors
    /// 画像としてデコードできない場合は [`ClassifyError::Processing`]。
    pub fn classify_image(&self, bytes: &[u8], filename: &str) -> Result<FinalResult, ClassifyError> {
        self.classify_image_traced(bytes, filename)
            .map(|classification| classification.result)
    }

    /// [`Self::classify_image`] に加えて、確定した段と昇格の履歴を返す。
    ///
    /// # Errors
    /// 画像としてデコードできない場合は [`ClassifyError::Processing`]。
    #[instrument(skip_all, fields(bytes = bytes.len(), filename = %filename))]
    pub fn classify_image_traced(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<ImageClassification, ClassifyError> {
        let decoded = preprocess::decode(bytes)?;
        let outcome = self.pipeline.run(&decoded, &filename.to_lowercase());
        Ok(ImageClassification {
            result: join::join(outcome.result, &self.knowledge),
            decided_by: outcome.decided_by,
            escalations: outcome.escalations,
        })
    }
}
