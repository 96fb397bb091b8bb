//! In-memory collection for tests and small ad-hoc corpora.
//!
//! Brute-force cosine similarity over every stored vector. Documents keep their
//! insertion position on upsert, so equal scores rank in insertion order.
use std::sync::RwLock;

use tracing::debug;

use fdqa_core::traits::VectorIndex;
use fdqa_core::types::fields::FILTERABLE;
use fdqa_core::{Document, Error, MetadataFilter, Result, SearchHit};

use crate::is_zero_vector;

pub struct MemoryIndex {
    name: String,
    rows: RwLock<Vec<(Document, Vec<f32>)>>,
}

impl MemoryIndex {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), rows: RwLock::new(Vec::new()) }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

fn poisoned() -> Error {
    Error::Index("memory index lock poisoned".to_string())
}

impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rows.read().map_err(|_| poisoned())?.len())
    }

    fn insert(&self, documents: &[Document], vectors: &[Vec<f32>]) -> Result<()> {
        if documents.len() != vectors.len() {
            return Err(Error::InvalidInput(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            )));
        }
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let dim = rows.first().map(|(_, v)| v.len()).or_else(|| vectors.first().map(Vec::len));
        if let Some(dim) = dim {
            if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
                return Err(Error::InvalidInput(format!("collection '{}' stores {dim}-d vectors", self.name)));
            }
        }
        if let Some(doc) = documents.iter().zip(vectors).find_map(|(d, v)| is_zero_vector(v).then_some(d)) {
            return Err(Error::InvalidInput(format!("document '{}' has an all-zero vector", doc.id)));
        }
        for (doc, vec) in documents.iter().zip(vectors) {
            match rows.iter_mut().find(|(d, _)| d.id == doc.id) {
                Some(slot) => *slot = (doc.clone(), vec.clone()),
                None => rows.push((doc.clone(), vec.clone())),
            }
        }
        debug!(collection = %self.name, rows = documents.len(), "upserted documents");
        Ok(())
    }

    fn search(&self, query_vec: &[f32], k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<SearchHit>> {
        if let Some(f) = filter {
            if let Some((key, _)) = f.terms().find(|(key, _)| !FILTERABLE.contains(key)) {
                return Err(Error::InvalidInput(format!("metadata field '{key}' is not filterable")));
            }
        }
        if is_zero_vector(query_vec) {
            return Err(Error::InvalidInput("query vector is all zeros".to_string()));
        }
        let rows = self.rows.read().map_err(|_| poisoned())?;
        if let Some((_, v)) = rows.first() {
            if v.len() != query_vec.len() {
                return Err(Error::InvalidInput(format!(
                    "query has {} dimensions, collection '{}' stores {}",
                    query_vec.len(),
                    self.name,
                    v.len()
                )));
            }
        }
        let mut scored: Vec<(f32, &Document)> = rows
            .iter()
            .filter(|(doc, _)| filter.map_or(true, |f| f.matches(&doc.metadata)))
            .map(|(doc, vec)| (Self::cosine_similarity(query_vec, vec), doc))
            .collect();
        // Stable: ties keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, doc)| SearchHit { document: doc.clone(), score })
            .collect())
    }
}
