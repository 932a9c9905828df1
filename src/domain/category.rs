use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 廃棄物カテゴリ。起動後に増えることはない閉じた集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Organic,
    Recyclable,
    Hazardous,
    #[serde(rename = "E-Waste")]
    EWaste,
    #[serde(rename = "Dry Waste")]
    DryWaste,
    #[serde(rename = "Medical Waste")]
    MedicalWaste,
}

impl Category {
    /// 宣言順。同点時の優先順位、ランダム段の添字、既定のクラス対応すべてがこの順序に従う。
    pub const ALL: [Category; 6] = [
        Category::Organic,
        Category::Recyclable,
        Category::Hazardous,
        Category::EWaste,
        Category::DryWaste,
        Category::MedicalWaste,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organic => "Organic",
            Self::Recyclable => "Recyclable",
            Self::Hazardous => "Hazardous",
            Self::EWaste => "E-Waste",
            Self::DryWaste => "Dry Waste",
            Self::MedicalWaste => "Medical Waste",
        }
    }

    /// 同点解消に使う優先度。小さいほど優先される。
    #[must_use]
    pub fn priority(self) -> usize {
        match self {
            Self::Organic => 0,
            Self::Recyclable => 1,
            Self::Hazardous => 2,
            Self::EWaste => 3,
            Self::DryWaste => 4,
            Self::MedicalWaste => 5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waste category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownCategory(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_order_matches_priority() {
        for (idx, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.priority(), idx);
        }
    }

    #[test]
    fn serializes_with_display_names() {
        let json = serde_json::to_string(&Category::EWaste).unwrap();
        assert_eq!(json, "\"E-Waste\"");
        let parsed: Category = serde_json::from_str("\"Medical Waste\"").unwrap();
        assert_eq!(parsed, Category::MedicalWaste);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("dry waste".parse::<Category>().unwrap(), Category::DryWaste);
        assert_eq!(" Organic ".parse::<Category>().unwrap(), Category::Organic);
        assert!("Compost".parse::<Category>().is_err());
    }
}
