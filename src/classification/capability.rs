//! 起動時に一度だけ構築される外部分類器ハンドル。
//!
//! 有無は `Option` ではなく [`ClassifierCapability::Absent`] で明示する。
//! 分類器内部の失敗はここで [`TierOutcome::Escalate`] に変換され、呼び出し元には出ない。
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;

use super::preprocess::{DecodedImage, prepare};
use crate::domain::{Category, ClassificationResult};
use crate::error::CapabilityError;
use crate::port::{GenericVision, PixelScale, TrainedModel};

/// 汎用認識の結果を採用する最低スコア。これ未満は出力があっても次の段へ回す。
pub const VISION_MIN_SCORE: f64 = 0.5;

/// 汎用認識ラベル → カテゴリの対応。上から順に評価し、最初に一致した規則を採用する。
const LABEL_RULES: &[(&[&str], Category)] = &[
    (&["banana", "apple", "orange", "food"], Category::Organic),
    (&["bottle", "can", "paper", "plastic"], Category::Recyclable),
    (&["battery", "chemical", "medicine"], Category::Hazardous),
    (&["phone", "computer", "electronic"], Category::EWaste),
    (&["diaper", "tissue", "wrapper"], Category::DryWaste),
];

/// どの規則にも一致しないラベルの行き先。
pub const LABEL_DEFAULT: Category = Category::Recyclable;

/// 1段の結果。確定するか、次の段へ昇格するか。
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    Decided(ClassificationResult),
    Escalate(Escalation),
}

/// 昇格理由。エラーではなく、呼び出し元に見えることはない。
#[derive(Debug, Clone, PartialEq)]
pub enum Escalation {
    /// 分類器が構築されていない。
    Absent,
    Failed(CapabilityError),
    /// 出力はあったが採用基準に届かない。
    LowConfidence(f64),
    /// キーワードが一つも一致しない。
    NoMatch,
}

impl Escalation {
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Failed(_) => "failed",
            Self::LowConfidence(_) => "low_confidence",
            Self::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("capability absent"),
            Self::Failed(error) => write!(f, "capability failed: {error}"),
            Self::LowConfidence(score) => write!(f, "top score {score:.3} below threshold"),
            Self::NoMatch => f.write_str("no keyword matched"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassIndexError {
    #[error("class index is empty")]
    Empty,
    #[error("unknown category in class index: {0}")]
    UnknownCategory(String),
    #[error("class index {index} is out of range for {len} classes")]
    OutOfRange { index: usize, len: usize },
    #[error("class index {0} is assigned twice")]
    Duplicate(usize),
}

/// 学習済みモデルの出力添字 → カテゴリ。モデル構築時に外部ファイルから読み込む。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndex {
    classes: Vec<Category>,
}

impl Default for ClassIndex {
    /// 宣言順をそのまま添字とみなす。
    fn default() -> Self {
        Self {
            classes: Category::ALL.to_vec(),
        }
    }
}

impl ClassIndex {
    /// `{"Organic": 0, "Recyclable": 1, ...}` 形式の対応から構築する。
    ///
    /// # Errors
    /// 空、未知のカテゴリ名、範囲外や重複した添字を含む場合はエラーを返す。
    pub fn from_indices(indices: &HashMap<String, usize>) -> Result<Self, ClassIndexError> {
        if indices.is_empty() {
            return Err(ClassIndexError::Empty);
        }
        let len = indices.len();
        let mut slots: Vec<Option<Category>> = vec![None; len];
        for (name, &index) in indices {
            let category: Category = name
                .parse()
                .map_err(|_| ClassIndexError::UnknownCategory(name.clone()))?;
            let slot = slots
                .get_mut(index)
                .ok_or(ClassIndexError::OutOfRange { index, len })?;
            if slot.replace(category).is_some() {
                return Err(ClassIndexError::Duplicate(index));
            }
        }
        // len distinct indices all < len, so every slot is filled
        let classes = slots.into_iter().flatten().collect();
        Ok(Self { classes })
    }

    #[must_use]
    pub fn category(&self, index: usize) -> Option<Category> {
        self.classes.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// 外部分類器ハンドル。オーケストレータはこの型だけに依存する。
#[derive(Clone)]
pub enum ClassifierCapability {
    TrainedModel {
        model: Arc<dyn TrainedModel>,
        classes: ClassIndex,
    },
    GenericVision(Arc<dyn GenericVision>),
    Absent,
}

impl fmt::Debug for ClassifierCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrainedModel { classes, .. } => f
                .debug_struct("TrainedModel")
                .field("classes", classes)
                .finish_non_exhaustive(),
            Self::GenericVision(vision) => f.debug_tuple("GenericVision").field(&vision.name()).finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

impl ClassifierCapability {
    /// 画像を分類する。内部の失敗やパニックはすべて昇格として返す。
    #[must_use]
    pub fn classify(&self, image: &DecodedImage) -> TierOutcome {
        let attempt = match self {
            Self::Absent => return TierOutcome::Escalate(Escalation::Absent),
            Self::TrainedModel { model, classes } => {
                catch_unwind(AssertUnwindSafe(|| classify_trained(model.as_ref(), classes, image)))
            }
            Self::GenericVision(vision) => {
                catch_unwind(AssertUnwindSafe(|| classify_vision(vision.as_ref(), image)))
            }
        };

        match attempt {
            Ok(outcome) => outcome,
            Err(_) => TierOutcome::Escalate(Escalation::Failed(CapabilityError::Inference(
                "capability panicked".into(),
            ))),
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// ヘルスチェック向けの短い説明。
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::TrainedModel { classes, .. } => format!("trained_model ({} classes)", classes.len()),
            Self::GenericVision(vision) => format!("generic_vision ({})", vision.name()),
            Self::Absent => "absent".to_string(),
        }
    }
}

fn classify_trained(
    model: &dyn TrainedModel,
    classes: &ClassIndex,
    image: &DecodedImage,
) -> TierOutcome {
    match trained_result(model, classes, image) {
        Ok(result) => TierOutcome::Decided(result),
        Err(error) => TierOutcome::Escalate(Escalation::Failed(error)),
    }
}

fn trained_result(
    model: &dyn TrainedModel,
    classes: &ClassIndex,
    image: &DecodedImage,
) -> Result<ClassificationResult, CapabilityError> {
    let input = prepare(image, model.input_shape(), PixelScale::Unit)?;
    let probabilities = model.predict(&input)?;

    if probabilities.is_empty() || probabilities.len() != classes.len() {
        return Err(CapabilityError::Shape {
            expected: classes.len(),
            actual: probabilities.len(),
        });
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(CapabilityError::NonFinite);
    }

    // stable sort: equal probabilities keep the lower index first
    let mut ranked: Vec<usize> = (0..probabilities.len()).collect();
    ranked.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    let labelled = ranked
        .iter()
        .filter_map(|&idx| classes.category(idx).map(|c| (c, f64::from(probabilities[idx]))))
        .collect::<Vec<_>>();
    let &(category, confidence) = labelled.first().ok_or(CapabilityError::Shape {
        expected: classes.len(),
        actual: 0,
    })?;

    let top_two = labelled
        .iter()
        .take(2)
        .map(|(category, p)| format!("{category} ({})", percent(*p)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(ClassificationResult::new(
        category,
        confidence,
        format!("AI Model (Trained): {top_two}"),
    ))
}

fn classify_vision(vision: &dyn GenericVision, image: &DecodedImage) -> TierOutcome {
    let detections = match prepare(image, vision.input_shape(), PixelScale::Symmetric)
        .and_then(|input| vision.predict(&input))
    {
        Ok(detections) => detections,
        Err(error) => return TierOutcome::Escalate(Escalation::Failed(error)),
    };

    let Some(top) = detections.first() else {
        return TierOutcome::Escalate(Escalation::Failed(CapabilityError::Inference(
            "no labels returned".into(),
        )));
    };
    if !top.score.is_finite() {
        return TierOutcome::Escalate(Escalation::Failed(CapabilityError::NonFinite));
    }
    if top.score < VISION_MIN_SCORE {
        return TierOutcome::Escalate(Escalation::LowConfidence(top.score));
    }

    let category = map_label(&top.label);
    TierOutcome::Decided(ClassificationResult::new(
        category,
        top.score,
        format!(
            "AI Vision ({}): {} ({})",
            vision.name(),
            top.label,
            percent(top.score)
        ),
    ))
}

/// 汎用認識のラベルを廃棄物カテゴリに写す。
#[must_use]
pub fn map_label(label: &str) -> Category {
    let lowered = label.to_lowercase();
    LABEL_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map_or(LABEL_DEFAULT, |(_, category)| *category)
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// パイプラインが参照する分類器の組。構築後は不変。
#[derive(Debug, Clone)]
pub struct CapabilitySet {
    trained: ClassifierCapability,
    vision: ClassifierCapability,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::absent()
    }
}

impl CapabilitySet {
    /// 外部分類器なし。ファイル名とランダム段だけで動く。
    #[must_use]
    pub fn absent() -> Self {
        Self {
            trained: ClassifierCapability::Absent,
            vision: ClassifierCapability::Absent,
        }
    }

    #[must_use]
    pub fn with_trained_model(mut self, model: Arc<dyn TrainedModel>, classes: ClassIndex) -> Self {
        self.trained = ClassifierCapability::TrainedModel { model, classes };
        self
    }

    #[must_use]
    pub fn with_generic_vision(mut self, vision: Arc<dyn GenericVision>) -> Self {
        self.vision = ClassifierCapability::GenericVision(vision);
        self
    }

    #[must_use]
    pub fn trained(&self) -> &ClassifierCapability {
        &self.trained
    }

    #[must_use]
    pub fn vision(&self) -> &ClassifierCapability {
        &self.vision
    }

    /// 最初に使われる分類器の説明。
    #[must_use]
    pub fn summary(&self) -> String {
        match (&self.trained, &self.vision) {
            (ClassifierCapability::Absent, ClassifierCapability::Absent) => {
                "filename_heuristic".to_string()
            }
            (ClassifierCapability::Absent, vision) => vision.summary(),
            (trained, ClassifierCapability::Absent) => trained.summary(),
            (trained, vision) => format!("{} + {}", trained.summary(), vision.summary()),
        }
    }
}
