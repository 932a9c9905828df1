//! 重み付きキーワード照合。テキスト分類とファイル名ヒューリスティックで共有する。
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Category;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern compiles"));

/// キーワード1件あたりの重み区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordWeight {
    High,
    Medium,
    Low,
    /// ファイル名用の単一区分。
    Flat,
}

impl KeywordWeight {
    #[must_use]
    pub fn value(self) -> u32 {
        match self {
            Self::High => 5,
            Self::Medium | Self::Flat => 3,
            Self::Low => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub category: Category,
    pub weight: KeywordWeight,
    pub keyword: &'static str,
}

/// 起動時に一度だけ構築される不変のルール表。
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<KeywordRule>,
}

impl RuleTable {
    #[must_use]
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    fn from_groups(groups: &[(Category, KeywordWeight, &[&'static str])]) -> Self {
        let rules = groups
            .iter()
            .flat_map(|(category, weight, keywords)| {
                keywords.iter().map(move |keyword| KeywordRule {
                    category: *category,
                    weight: *weight,
                    keyword,
                })
            })
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

/// テキスト記述用の3段重みルール。
pub static TEXT_RULES: Lazy<RuleTable> = Lazy::new(|| {
    use Category::{DryWaste, EWaste, Hazardous, Organic, Recyclable};
    use KeywordWeight::{High, Low, Medium};

    RuleTable::from_groups(&[
        (
            Organic,
            High,
            &["compost", "biodegradable", "food waste", "garden waste", "organic"],
        ),
        (
            Organic,
            Medium,
            &["fruit", "vegetable", "peel", "leftover", "scraps", "leaves", "grass"],
        ),
        (
            Organic,
            Low,
            &["banana", "apple", "orange", "potato", "coffee", "tea", "egg", "bread"],
        ),
        (Recyclable, High, &["recyclable", "recycle", "recycling"]),
        (
            Recyclable,
            Medium,
            &["plastic", "bottle", "paper", "cardboard", "glass", "aluminum", "can"],
        ),
        (
            Recyclable,
            Low,
            &["container", "packaging", "box", "jar", "newspaper", "magazine", "metal"],
        ),
        (
            Hazardous,
            High,
            &[
                "hazardous", "toxic", "poison", "dangerous", "chemical", "fire", "flammable",
                "explosive",
            ],
        ),
        (
            Hazardous,
            Medium,
            &[
                "battery", "paint", "medicine", "pesticide", "oil", "acid", "bleach", "lighter",
                "matches",
            ],
        ),
        (
            Hazardous,
            Low,
            &["cleaner", "solvent", "pharmaceutical", "expired", "drug", "aerosol", "spray"],
        ),
        (EWaste, High, &["electronic", "e-waste", "ewaste", "circuit"]),
        (
            EWaste,
            Medium,
            &["phone", "computer", "laptop", "charger", "printer", "monitor"],
        ),
        (
            EWaste,
            Low,
            &["cable", "keyboard", "mouse", "device", "gadget", "led", "bulb"],
        ),
        (DryWaste, High, &["dry waste", "non-recyclable"]),
        (
            DryWaste,
            Medium,
            &["diaper", "napkin", "tissue", "styrofoam", "rubber"],
        ),
        (
            DryWaste,
            Low,
            &["leather", "cloth", "ceramic", "wrapper", "straw"],
        ),
    ])
});

/// ファイル名用の単一重みルール。画像専用の Medical Waste を含む。
pub static FILENAME_RULES: Lazy<RuleTable> = Lazy::new(|| {
    use Category::{DryWaste, EWaste, Hazardous, MedicalWaste, Organic, Recyclable};
    use KeywordWeight::Flat;

    RuleTable::from_groups(&[
        (
            Organic,
            Flat,
            &[
                "food", "fruit", "vegetable", "peel", "banana", "apple", "orange", "leftover",
                "compost", "garden", "leaves", "coffee", "tea", "organic",
            ],
        ),
        (
            Recyclable,
            Flat,
            &[
                "plastic", "bottle", "paper", "cardboard", "can", "aluminum", "glass",
                "newspaper", "magazine", "container", "recyclable",
            ],
        ),
        (
            Hazardous,
            Flat,
            &[
                "battery", "paint", "chemical", "medicine", "drug", "pesticide", "oil",
                "cleaner", "toxic", "poison", "acid", "bleach", "hazardous",
            ],
        ),
        (
            EWaste,
            Flat,
            &[
                "phone", "computer", "laptop", "electronic", "charger", "cable", "printer",
                "monitor", "keyboard", "mouse", "circuit", "led", "bulb",
            ],
        ),
        (
            DryWaste,
            Flat,
            &[
                "diaper", "napkin", "tissue", "styrofoam", "rubber", "leather", "cloth",
                "ceramic", "wrapper", "bag", "straw", "cup", "plate",
            ],
        ),
        (
            MedicalWaste,
            Flat,
            &[
                "mask", "syringe", "bandage", "glove", "medical", "hospital", "surgical", "ppe",
                "sanitizer", "swab",
            ],
        ),
    ])
});

/// 照合結果。最高得点が 0 の場合は作られない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordScore {
    pub category: Category,
    pub best_score: u32,
    pub total_score: u32,
    /// 勝ったカテゴリで一致したキーワード（ルール表の順）。
    pub matched_keywords: Vec<&'static str>,
}

/// 小文字化し、記号を空白に置き換える。
#[must_use]
pub fn normalize_text(text: &str) -> String {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), " ")
        .into_owned()
}

/// ファイル名は小文字化のみ。
#[must_use]
pub fn normalize_filename(filename: &str) -> String {
    filename.to_lowercase()
}

/// 正規化済みテキストをルール表で採点する。
///
/// 各キーワードは部分文字列として含まれていれば出現回数に関係なく1回だけ加点する。
/// 最高得点が並んだ場合は [`Category::ALL`] の宣言順で先にあるカテゴリを採用する。
/// どのキーワードにも一致しなければ `None`。既定値の扱いは呼び出し側が決める。
#[must_use]
pub fn score(normalized: &str, table: &RuleTable) -> Option<KeywordScore> {
    let mut scores = [0_u32; Category::ALL.len()];
    let mut matched: [Vec<&'static str>; Category::ALL.len()] = Default::default();

    for rule in table.rules() {
        if normalized.contains(rule.keyword) {
            let slot = rule.category.priority();
            scores[slot] += rule.weight.value();
            matched[slot].push(rule.keyword);
        }
    }

    let total_score: u32 = scores.iter().sum();
    let mut best: Option<Category> = None;
    for category in Category::ALL {
        let candidate = scores[category.priority()];
        // strictly greater keeps the earlier category on ties
        if best.is_none_or(|current| candidate > scores[current.priority()]) {
            best = Some(category);
        }
    }

    let category = best?;
    let best_score = scores[category.priority()];
    if best_score == 0 {
        return None;
    }

    Some(KeywordScore {
        category,
        best_score,
        total_score,
        matched_keywords: std::mem::take(&mut matched[category.priority()]),
    })
}
