use std::sync::Arc;

use tracing::debug;

use fdqa_core::traits::{Embedder, VectorIndex};
use fdqa_core::{Document, Error, MetadataFilter, Result};

/// Embeds a query and returns the nearest documents of one collection.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    /// Up to `k` documents, most similar first. No match is an empty vec.
    pub fn retrieve(&self, query: &str, k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        if k == 0 {
            return Err(Error::InvalidInput("k must be >= 1".to_string()));
        }
        let q_vec = self.embedder.embed(query)?;
        let hits = self.index.search(&q_vec, k, filter)?;
        debug!(collection = self.index.name(), k, filtered = filter.is_some(), hits = hits.len(), "retrieved");
        Ok(hits.into_iter().map(|h| h.document).collect())
    }

    /// Embeds and upserts `documents` into this retriever's collection.
    pub fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        self.index.insert(documents, &vectors)?;
        Ok(documents.len())
    }
}
