use crate::error::Result;
use crate::types::{Document, MetadataFilter, SearchHit};

pub trait Embedder: Send + Sync {
    /// Identifier of the resolved model (path or hub id).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

pub trait VectorIndex: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;
    fn count(&self) -> Result<usize>;
    /// Upserts by document id. `vectors[i]` belongs to `documents[i]`.
    fn insert(&self, documents: &[Document], vectors: &[Vec<f32>]) -> Result<()>;
    /// Nearest first. An empty collection or an unmatched filter yields `Ok(vec![])`.
    fn search(&self, query_vec: &[f32], k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<SearchHit>>;
}

pub trait AnswerGenerator: Send + Sync {
    fn model_id(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}
