//! Retrieval, context assembly, few-shot examples and prompt rendering for
//! franchise-disclosure question answering.
pub mod context;
pub mod examples;
pub mod prompt;
pub mod retriever;
pub mod service;

pub use context::assemble;
pub use examples::{extract_examples, NO_EXAMPLES};
pub use prompt::{build, PromptTemplates};
pub use retriever::Retriever;
pub use service::{InferenceOutcome, QaService, NO_DOCUMENT_FOUND, NO_SEARCH_RESULTS};
