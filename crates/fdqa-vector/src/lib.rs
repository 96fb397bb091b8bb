//! Vector collections: a persistent LanceDB table per collection plus an
//! in-memory brute-force index with the same semantics.
use std::path::Path;
use std::sync::Arc;

use fdqa_core::traits::VectorIndex;
use fdqa_core::Result;

pub mod filter;
pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::LanceIndex;
pub use memory::MemoryIndex;

/// Cosine similarity is undefined against an all-zero vector, so neither
/// index stores or searches with one.
pub(crate) fn is_zero_vector(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Opens an existing collection for querying.
pub fn open_collection(db_path: &Path, collection: &str) -> Result<Arc<dyn VectorIndex>> {
    Ok(Arc::new(LanceIndex::open(db_path, collection, false)?))
}

/// Opens a collection for ingestion, creating the database directory if needed.
pub fn create_collection(db_path: &Path, collection: &str) -> Result<Arc<dyn VectorIndex>> {
    Ok(Arc::new(LanceIndex::open(db_path, collection, true)?))
}
