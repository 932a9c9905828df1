//! カテゴリごとの静的な廃棄案内。起動時に一度だけ読み込み、以後は読み取り専用。
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::category::Category;

const DEFAULT_KNOWLEDGE_JSON: &str = include_str!("../resources/knowledge_base.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageGuide {
    pub instructions: Vec<String>,
    pub container_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizationGuide {
    pub steps: Vec<String>,
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisposalGuide {
    pub methods: Vec<String>,
    pub locations: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringGuide {
    pub checks: Vec<String>,
    pub safety: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalImpact {
    pub proper_disposal: Vec<String>,
    pub improper_disposal: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProsCons {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// 1カテゴリ分の案内。欠けたフィールドは空文字列・空コレクションで埋まる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeRecord {
    pub name: String,
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

impl KnowledgeRecord {
    /// 知識ベースに該当がない場合の代替。名前だけを埋める。
    #[must_use]
    pub fn placeholder(category: Category) -> Self {
        Self {
            name: category.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// カテゴリ → 案内の読み取り専用テーブル。
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: HashMap<Category, KnowledgeRecord>,
}

impl KnowledgeBase {
    /// 組み込みの知識ベースを読み込む。
    ///
    /// # Errors
    /// 組み込み JSON のパースに失敗した場合はエラーを返す。
    pub fn embedded() -> Result<Self> {
        Self::from_json(DEFAULT_KNOWLEDGE_JSON).context("failed to parse embedded knowledge base")
    }

    /// パスが指定されていればそのファイルを、なければ組み込み版を読み込む。
    ///
    /// # Errors
    /// ファイルの読み込みやパースに失敗した場合はエラーを返す。
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path.as_ref()).with_context(|| {
                    format!("failed to read knowledge base from {:?}", path.as_ref())
                })?;
                Self::from_json(&raw).with_context(|| {
                    format!("failed to parse knowledge base {:?}", path.as_ref())
                })
            }
            None => Self::embedded(),
        }
    }

    /// # Errors
    /// JSON が不正、またはキーがカテゴリ名でない場合はエラーを返す。
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: HashMap<Category, KnowledgeRecord> = serde_json::from_str(raw)?;
        Ok(Self { records })
    }

    #[must_use]
    pub fn from_records(records: HashMap<Category, KnowledgeRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn get(&self, category: Category) -> Option<&KnowledgeRecord> {
        self.records.get(&category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_base_covers_original_categories() {
        let kb = KnowledgeBase::embedded().expect("embedded knowledge base parses");
        for category in [
            Category::Organic,
            Category::Recyclable,
            Category::Hazardous,
            Category::EWaste,
            Category::DryWaste,
        ] {
            let record = kb.get(category).expect("record present");
            assert!(!record.name.is_empty());
            assert!(!record.disposal.methods.is_empty());
        }
        assert!(kb.get(Category::MedicalWaste).is_none());
    }

    #[test]
    fn partial_record_fills_missing_fields() {
        let kb = KnowledgeBase::from_json(r#"{"Organic": {"name": "Organic Waste"}}"#).unwrap();
        let record = kb.get(Category::Organic).unwrap();
        assert_eq!(record.name, "Organic Waste");
        assert!(record.examples.is_empty());
        assert!(record.pros_cons.cons.is_empty());
    }

    #[test]
    fn rejects_unknown_category_keys() {
        assert!(KnowledgeBase::from_json(r#"{"Glass": {}}"#).is_err());
    }

    #[test]
    fn load_reads_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, r#"{"Hazardous": {"name": "Danger", "risk_level": "High"}}"#).unwrap();

        let kb = KnowledgeBase::load(Some(&path)).unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.get(Category::Hazardous).unwrap().risk_level, "High");
    }
}
