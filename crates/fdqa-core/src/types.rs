//! Domain types shared by the index, retrieval and generation layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type DocId = String;

/// Metadata keys written by ingestion.
pub mod fields {
    pub const CHUNK_NO: &str = "CHNK_NO";
    pub const SMART_CHUNK_NO: &str = "SMRT_CHNK_NO";
    pub const BASE_YEAR: &str = "JNG_BIZ_CRTRA_YR";
    pub const HQ_NAME: &str = "JNGHDQRTRS_CONM_NM";
    pub const BRAND_NAME: &str = "BRAND_NM";
    pub const INFO_SEQ: &str = "JNG_IFRMP_SN";
    pub const ATTRIBUTE_ID: &str = "ATTRB_MNNO";
    pub const ATTRIBUTE_NAME: &str = "KORN_ATTRB_NM";
    pub const PARENT_ATTRIBUTE_ID: &str = "UP_ATTRB_MNNO";
    pub const PARENT_ATTRIBUTE_NAME: &str = "KORN_UP_ATRB_NM";
    pub const SOURCE: &str = "source";
    pub const QA_PAIRS: &str = "QAs";

    /// Fields a metadata filter may reference.
    pub const FILTERABLE: &[&str] = &[
        CHUNK_NO,
        SMART_CHUNK_NO,
        BASE_YEAR,
        HQ_NAME,
        BRAND_NAME,
        INFO_SEQ,
        ATTRIBUTE_ID,
        ATTRIBUTE_NAME,
        PARENT_ATTRIBUTE_ID,
        PARENT_ATTRIBUTE_NAME,
        SOURCE,
    ];
}

/// A scalar metadata value.
///
/// Values compare for filtering by their canonical rendering, so an
/// attribute id stored as `7` matches a filter value of `"7"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl MetaValue {
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// A stored chunk: text plus flat scalar metadata.
///
/// `id` is the `<source_file>_<record_index>` key assigned at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: Metadata::new() }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }
}

/// Conjunctive exact-match predicate over metadata fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    terms: BTreeMap<String, MetaValue>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.terms.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.terms.iter().all(|(key, want)| {
            metadata.get(key).is_some_and(|have| have.canonical() == want.canonical())
        })
    }
}

/// One nearest-neighbour hit. `score` is higher-is-better and stays inside
/// the index layer; the retriever only forwards ranked documents.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
}

/// A question/answer pair attached to QA-collection documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    #[serde(rename = "QUESTION", alias = "question", default)]
    pub question: String,
    #[serde(rename = "ANSWER", alias = "answer", default)]
    pub answer: String,
}

/// A `topic / sub_topic / contents` entry of a structured document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredEntry {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub sub_topic: String,
    #[serde(default)]
    pub contents: String,
}

/// Output record of one inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub original_text: String,
    pub question: String,
    pub answer: String,
}
