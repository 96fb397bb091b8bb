//! Parsing of raw franchise-disclosure records into indexable documents.
//!
//! Ingestion is the only writer of the vector index. A file that is not a
//! JSON array is rejected; individual records that do not fit the expected
//! shape are skipped with a warning and the rest of the file still loads.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{fields, Document, MetaValue, QaPair, StructuredEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct FranchiseRecord {
    #[serde(rename = "CHNK_NO")]
    pub chunk_no: MetaValue,
    #[serde(rename = "SMRT_CHNK_NO")]
    pub smart_chunk_no: MetaValue,
    #[serde(rename = "JNG_INFO")]
    pub franchise: FranchiseInfo,
    #[serde(rename = "ATTRB_INFO")]
    pub attribute: AttributeInfo,
    #[serde(rename = "QL", default)]
    pub body: RecordBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FranchiseInfo {
    #[serde(rename = "JNG_BIZ_CRTRA_YR")]
    pub base_year: MetaValue,
    #[serde(rename = "JNGHDQRTRS_CONM_NM")]
    pub hq_name: MetaValue,
    #[serde(rename = "BRAND_NM")]
    pub brand_name: MetaValue,
    #[serde(rename = "JNG_IFRMP_SN")]
    pub info_seq: MetaValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeInfo {
    #[serde(rename = "ATTRB_MNNO")]
    pub attribute_id: MetaValue,
    #[serde(rename = "KORN_ATTRB_NM")]
    pub attribute_name: MetaValue,
    #[serde(rename = "UP_ATTRB_MNNO")]
    pub parent_attribute_id: MetaValue,
    #[serde(rename = "KORN_UP_ATRB_NM")]
    pub parent_attribute_name: MetaValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordBody {
    #[serde(rename = "EXTRACTED_SUMMARY_TEXT", default)]
    pub extracted_summary: Option<String>,
    #[serde(rename = "ABSTRACTED_SUMMARY_TEXT", default)]
    pub abstracted_summary: Option<String>,
    #[serde(rename = "QAs", default)]
    pub qa_pairs: Vec<QaPair>,
}

/// How a record becomes a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestLayout {
    /// Extracted summary text; records without one are skipped.
    #[default]
    Summary,
    /// Abstracted summary plus the serialized QA pairs in metadata; records
    /// without an abstracted summary are skipped.
    Qa,
    /// Extracted summary wrapped as a `[{topic, sub_topic, contents}]` JSON body.
    Structured,
}

impl std::str::FromStr for IngestLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "qa" => Ok(Self::Qa),
            "structured" => Ok(Self::Structured),
            other => Err(Error::InvalidInput(format!("unknown ingest layout '{other}'"))),
        }
    }
}

/// A question harvested at ingestion time for later batch inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuestion {
    pub question: String,
    pub source_doc: String,
    pub contract_idx: usize,
}

#[derive(Debug, Default)]
pub struct ProcessedBatch {
    pub documents: Vec<Document>,
    pub questions: Vec<ExtractedQuestion>,
    pub skipped: usize,
}

impl ProcessedBatch {
    fn extend(&mut self, other: ProcessedBatch) {
        self.documents.extend(other.documents);
        self.questions.extend(other.questions);
        self.skipped += other.skipped;
    }
}

#[derive(Default)]
pub struct DataProcessor {
    layout: IngestLayout,
}

impl DataProcessor {
    pub fn new(layout: IngestLayout) -> Self {
        Self { layout }
    }

    pub fn process_file(&self, path: &Path) -> Result<ProcessedBatch> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::NotFound(format!("{}: {e}", path.display())))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let batch = self.process_str(&raw, &source)?;
        info!(
            file = %path.display(),
            documents = batch.documents.len(),
            skipped = batch.skipped,
            "processed franchise records"
        );
        Ok(batch)
    }

    /// Every `*.json` under `dir`, in path order.
    pub fn process_directory(&self, dir: &Path) -> Result<ProcessedBatch> {
        let files = list_json_files(dir);
        if files.is_empty() {
            warn!(dir = %dir.display(), "no .json files found");
        }
        let mut all = ProcessedBatch::default();
        for file in &files {
            all.extend(self.process_file(file)?);
        }
        Ok(all)
    }

    /// Parse one JSON array of records. `source` becomes the id prefix and the `source` metadata value.
    pub fn process_str(&self, raw: &str, source: &str) -> Result<ProcessedBatch> {
        let values: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| Error::Malformed(format!("{source}: expected a JSON array of records: {e}")))?;

        let mut batch = ProcessedBatch::default();
        for (idx, value) in values.into_iter().enumerate() {
            let record: FranchiseRecord = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(e) => {
                    warn!(source, idx, error = %e, "skipping malformed record");
                    batch.skipped += 1;
                    continue;
                }
            };
            let Some(document) = self.to_document(&record, source, idx)? else {
                batch.skipped += 1;
                continue;
            };
            if self.layout == IngestLayout::Summary {
                batch.questions.extend(record.body.qa_pairs.iter().map(|qa| ExtractedQuestion {
                    question: qa.question.clone(),
                    source_doc: source.to_string(),
                    contract_idx: idx,
                }));
            }
            batch.documents.push(document);
        }
        Ok(batch)
    }

    fn to_document(&self, record: &FranchiseRecord, source: &str, idx: usize) -> Result<Option<Document>> {
        let extracted = record.body.extracted_summary.as_deref().unwrap_or("").trim();
        let text = match self.layout {
            IngestLayout::Summary => {
                if extracted.is_empty() {
                    return Ok(None);
                }
                extracted.to_string()
            }
            IngestLayout::Qa => {
                let abstracted = record.body.abstracted_summary.as_deref().unwrap_or("").trim();
                if abstracted.is_empty() {
                    return Ok(None);
                }
                abstracted.to_string()
            }
            IngestLayout::Structured => {
                if extracted.is_empty() {
                    return Ok(None);
                }
                serde_json::to_string(&[StructuredEntry {
                    topic: record.attribute.parent_attribute_name.to_string(),
                    sub_topic: record.attribute.attribute_name.to_string(),
                    contents: extracted.to_string(),
                }])?
            }
        };

        let mut doc = Document::new(format!("{source}_{idx}"), text)
            .with_meta(fields::CHUNK_NO, record.chunk_no.clone())
            .with_meta(fields::SMART_CHUNK_NO, record.smart_chunk_no.clone())
            .with_meta(fields::BASE_YEAR, record.franchise.base_year.clone())
            .with_meta(fields::HQ_NAME, record.franchise.hq_name.clone())
            .with_meta(fields::BRAND_NAME, record.franchise.brand_name.clone())
            .with_meta(fields::INFO_SEQ, record.franchise.info_seq.clone())
            .with_meta(fields::ATTRIBUTE_ID, record.attribute.attribute_id.clone())
            .with_meta(fields::ATTRIBUTE_NAME, record.attribute.attribute_name.clone())
            .with_meta(fields::PARENT_ATTRIBUTE_ID, record.attribute.parent_attribute_id.clone())
            .with_meta(fields::PARENT_ATTRIBUTE_NAME, record.attribute.parent_attribute_name.clone())
            .with_meta(fields::SOURCE, source);
        if self.layout == IngestLayout::Qa {
            doc = doc.with_meta(fields::QA_PAIRS, serde_json::to_string(&record.body.qa_pairs)?);
        }
        Ok(Some(doc))
    }
}

/// `extract_question_<file>` next to the input file.
pub fn questions_path_for(json_path: &Path) -> PathBuf {
    let name = json_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    json_path.with_file_name(format!("extract_question_{name}"))
}

pub fn write_questions(path: &Path, questions: &[ExtractedQuestion]) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(questions)?)?;
    Ok(())
}

pub fn read_questions(path: &Path) -> Result<Vec<ExtractedQuestion>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::NotFound(format!("questions file {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
