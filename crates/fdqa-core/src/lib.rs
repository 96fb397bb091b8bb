//! Shared domain model for the franchise-disclosure QA pipeline.
//!
//! Everything the retrieval, embedding, index and generation crates agree on
//! lives here: documents and metadata, the error taxonomy, the collaborator
//! traits, typed settings, and parsing of raw franchise records for ingestion.

pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{Document, InferenceResult, MetaValue, Metadata, MetadataFilter, QaPair, SearchHit};
