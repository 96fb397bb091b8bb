//! LanceDB-backed collection.
//!
//! One table per collection under the database directory. The table is created
//! on first insert, so a freshly opened collection may have no table yet; such
//! a collection counts zero rows and answers every search with no hits.
use std::path::Path;
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use fdqa_core::traits::VectorIndex;
use fdqa_core::types::fields::FILTERABLE;
use fdqa_core::{Document, Error, Metadata, MetadataFilter, Result, SearchHit};

use crate::filter::compile_predicate;
use crate::is_zero_vector;
use crate::schema::{build_collection_schema, vector_dim, ID_COLUMN, METADATA_COLUMN, TEXT_COLUMN};

fn lance_err(e: lancedb::Error) -> Error {
    Error::Index(e.to_string())
}

fn arrow_err(e: arrow_schema::ArrowError) -> Error {
    Error::Index(e.to_string())
}

pub struct LanceIndex {
    rt: Runtime,
    db: Connection,
    collection: String,
}

impl LanceIndex {
    /// Opens the collection at `path`. Without `create`, a missing database
    /// directory is `NotFound`.
    pub fn open(path: &Path, collection: &str, create: bool) -> Result<Self> {
        if !create && !path.exists() {
            return Err(Error::NotFound(format!("vector database {}", path.display())));
        }
        if create {
            std::fs::create_dir_all(path)?;
        }
        let rt = Runtime::new()?;
        let uri = path.to_string_lossy().to_string();
        let db = rt.block_on(async { connect(&uri).execute().await }).map_err(lance_err)?;
        info!(db = %path.display(), collection, "opened vector collection");
        Ok(Self { rt, db, collection: collection.to_string() })
    }

    async fn table(&self) -> Result<Option<Table>> {
        let names = self.db.table_names().execute().await.map_err(lance_err)?;
        if !names.contains(&self.collection) {
            return Ok(None);
        }
        Ok(Some(self.db.open_table(&self.collection).execute().await.map_err(lance_err)?))
    }

    fn to_record_batch(documents: &[Document], vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
        let dim_i32 = i32::try_from(dim).map_err(|_| Error::InvalidInput(format!("vector dimension {dim} too large")))?;
        let schema = build_collection_schema(dim_i32);
        let mut ids = Vec::with_capacity(documents.len());
        let mut texts = Vec::with_capacity(documents.len());
        let mut metas = Vec::with_capacity(documents.len());
        for doc in documents {
            ids.push(doc.id.clone());
            texts.push(doc.text.clone());
            metas.push(serde_json::to_string(&doc.metadata)?);
        }
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(metas)),
        ];
        for field in FILTERABLE {
            let values: Vec<Option<String>> = documents.iter().map(|d| d.meta(field).map(|v| v.canonical())).collect();
            columns.push(Arc::new(StringArray::from(values)));
        }
        let vecs = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
        columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vecs, dim_i32)));
        RecordBatch::try_new(schema, columns).map_err(arrow_err)
    }
}

impl VectorIndex for LanceIndex {
    fn name(&self) -> &str {
        &self.collection
    }

    fn count(&self) -> Result<usize> {
        self.rt.block_on(async {
            match self.table().await? {
                Some(t) => t.count_rows(None).await.map_err(lance_err),
                None => Ok(0),
            }
        })
    }

    fn insert(&self, documents: &[Document], vectors: &[Vec<f32>]) -> Result<()> {
        if documents.len() != vectors.len() {
            return Err(Error::InvalidInput(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            )));
        }
        let Some(dim) = vectors.first().map(Vec::len) else { return Ok(()) };
        if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
            return Err(Error::InvalidInput("vectors must share one non-zero dimension".to_string()));
        }
        if let Some(doc) = documents.iter().zip(vectors).find_map(|(d, v)| is_zero_vector(v).then_some(d)) {
            return Err(Error::InvalidInput(format!("document '{}' has an all-zero vector", doc.id)));
        }
        self.rt.block_on(async {
            let batch = Self::to_record_batch(documents, vectors, dim)?;
            let schema = batch.schema();
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
            match self.table().await? {
                Some(table) => {
                    let existing = table.schema().await.map_err(lance_err)?;
                    if let Some(have) = vector_dim(&existing) {
                        if have != dim {
                            return Err(Error::InvalidInput(format!(
                                "collection '{}' stores {have}-d vectors, got {dim}",
                                self.collection
                            )));
                        }
                    }
                    // Upsert: id is the merge key
                    let mut mi = table.merge_insert(&[ID_COLUMN]);
                    mi.when_matched_update_all(None).when_not_matched_insert_all();
                    mi.execute(reader).await.map_err(lance_err)?;
                }
                None => {
                    self.db.create_table(&self.collection, reader).execute().await.map_err(lance_err)?;
                }
            }
            debug!(collection = %self.collection, rows = documents.len(), "inserted documents");
            Ok(())
        })
    }

    fn search(&self, query_vec: &[f32], k: usize, filter: Option<&MetadataFilter>) -> Result<Vec<SearchHit>> {
        let predicate = match filter {
            Some(f) => compile_predicate(f)?,
            None => None,
        };
        if is_zero_vector(query_vec) {
            return Err(Error::InvalidInput("query vector is all zeros".to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        self.rt.block_on(async {
            let Some(table) = self.table().await? else { return Ok(Vec::new()) };
            let schema = table.schema().await.map_err(lance_err)?;
            if let Some(have) = vector_dim(&schema) {
                if have != query_vec.len() {
                    return Err(Error::InvalidInput(format!(
                        "query has {} dimensions, collection '{}' stores {have}",
                        query_vec.len(),
                        self.collection
                    )));
                }
            }
            let mut query = table
                .vector_search(query_vec.to_vec())
                .map_err(lance_err)?
                .distance_type(DistanceType::Cosine)
                .limit(k);
            if let Some(pred) = predicate {
                query = query.only_if(pred);
            }
            let mut stream = query.execute().await.map_err(lance_err)?;
            let mut hits = Vec::new();
            while let Some(batch) = stream.try_next().await.map_err(lance_err)? {
                hits.extend(batch_to_hits(&batch)?);
            }
            Ok(hits)
        })
    }
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let ids = batch.column_by_name(ID_COLUMN).and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let texts = batch.column_by_name(TEXT_COLUMN).and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let metas = batch.column_by_name(METADATA_COLUMN).and_then(|c| c.as_any().downcast_ref::<StringArray>());
    let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
    let (Some(ids), Some(texts), Some(metas)) = (ids, texts, metas) else {
        return Err(Error::Index("search result is missing required columns".to_string()));
    };

    let mut hits = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        // Zero-norm rows have no cosine distance
        if distances.is_some_and(|d| d.value(i).is_nan()) {
            continue;
        }
        let metadata: Metadata = if metas.is_null(i) { Metadata::new() } else { serde_json::from_str(metas.value(i))? };
        let document = Document { id: ids.value(i).to_string(), text: texts.value(i).to_string(), metadata };
        let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
        hits.push(SearchHit { document, score });
    }
    Ok(hits)
}
