//! Question answering over the franchise collections.
//!
//! One service covers both flows: the direct answer flow over an assembled
//! context, and the two-stage inference flow that pulls few-shot examples from
//! the QA collection when one is available.
use std::sync::Arc;

use tracing::{debug, info, warn};

use fdqa_core::config::{expand_path, RetrievalSettings, Settings};
use fdqa_core::traits::{AnswerGenerator, Embedder};
use fdqa_core::types::fields;
use fdqa_core::{Document, InferenceResult, MetadataFilter, Result};

use crate::context::assemble;
use crate::examples::extract_examples;
use crate::prompt::PromptTemplates;
use crate::retriever::Retriever;

/// Inference answer when the primary collection has no match.
pub const NO_DOCUMENT_FOUND: &str = "❌ 관련 문서를 찾지 못했습니다.";
/// Direct-flow answer when no retrieved document fits the context budget.
pub const NO_SEARCH_RESULTS: &str = "검색 결과가 없습니다. 다른 질문을 해주세요.";

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    /// Primary search came back empty; nothing was generated.
    NoDocument,
    Answered(InferenceResult),
}

impl InferenceOutcome {
    /// Flattens to a result record; a miss carries the sentinel as its answer.
    pub fn into_record(self, query: &str) -> InferenceResult {
        match self {
            Self::Answered(r) => r,
            Self::NoDocument => InferenceResult {
                original_text: String::new(),
                question: query.to_string(),
                answer: NO_DOCUMENT_FOUND.to_string(),
            },
        }
    }
}

pub struct QaService {
    primary: Retriever,
    examples: Option<Retriever>,
    templates: PromptTemplates,
    generator: Arc<dyn AnswerGenerator>,
    retrieval: RetrievalSettings,
}

impl QaService {
    pub fn new(
        primary: Retriever,
        generator: Arc<dyn AnswerGenerator>,
        templates: PromptTemplates,
        retrieval: RetrievalSettings,
    ) -> Self {
        Self { primary, examples: None, templates, generator, retrieval }
    }

    /// Enables few-shot inference. An empty or unreadable QA collection
    /// leaves it disabled.
    pub fn with_examples(mut self, qa: Retriever) -> Self {
        self.examples = match qa.index().count() {
            Ok(0) => {
                warn!(collection = qa.index().name(), "QA collection is empty, few-shot examples disabled");
                None
            }
            Ok(count) => {
                info!(collection = qa.index().name(), documents = count, "QA collection loaded");
                Some(qa)
            }
            Err(e) => {
                warn!(collection = qa.index().name(), error = %e, "QA collection unreadable, few-shot examples disabled");
                None
            }
        };
        self
    }

    pub fn has_examples(&self) -> bool {
        self.examples.is_some()
    }

    /// Wires embedder, collections, templates and generator from settings.
    /// The primary collection and the generator credential are required; the
    /// QA collection is optional.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let generator = Arc::new(fdqa_llm::GeminiGenerator::from_settings(&settings.generator)?);
        let embedder: Arc<dyn Embedder> = fdqa_embed::get_default_embedder(&settings.embedding)?;

        let primary_index = fdqa_vector::open_collection(&expand_path(&settings.vector.db_path), &settings.vector.collection)?;
        info!(collection = %settings.vector.collection, documents = primary_index.count()?, "primary collection loaded");
        let primary = Retriever::new(embedder.clone(), primary_index);

        let templates = PromptTemplates::from_settings(&settings.prompts)?;

        let service = Self::new(primary, generator, templates, settings.retrieval.clone());
        match fdqa_vector::open_collection(&expand_path(&settings.vector.qa_db_path), &settings.vector.qa_collection) {
            Ok(qa_index) => Ok(service.with_examples(Retriever::new(embedder, qa_index))),
            Err(e) => {
                warn!(error = %e, "QA collection unavailable, few-shot examples disabled");
                Ok(service)
            }
        }
    }

    /// Primary search, then QA examples keyed on the top hit's attribute id,
    /// then one generation call.
    pub fn inference(&self, query: &str) -> Result<InferenceOutcome> {
        let primary = self.primary.retrieve(query, self.retrieval.search_k, None)?;
        let Some(top) = primary.first() else {
            info!(query, "no primary document matched");
            return Ok(InferenceOutcome::NoDocument);
        };
        let context = top.text.clone();

        let prompt = match &self.examples {
            Some(qa) => {
                let qa_docs = self.example_documents(qa, query, top);
                let examples = extract_examples(&qa_docs, self.retrieval.max_examples);
                self.templates.fewshot(query, &context, &examples)
            }
            None => self.templates.basic(query, &context),
        };
        debug!(%prompt, "inference prompt");

        let answer = match self.generator.generate(&prompt) {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "generation failed");
                format!("❌ 답변 생성 실패: {e}")
            }
        };
        Ok(InferenceOutcome::Answered(InferenceResult {
            original_text: context,
            question: query.to_string(),
            answer,
        }))
    }

    /// QA documents sharing the top hit's attribute id, or the unfiltered
    /// nearest QA documents when none do.
    fn example_documents(&self, qa: &Retriever, query: &str, top: &Document) -> Vec<Document> {
        let k = self.retrieval.search_k;
        match top.meta(fields::ATTRIBUTE_ID) {
            Some(attr) => {
                let filter = MetadataFilter::new().field(fields::ATTRIBUTE_ID, attr.clone());
                match qa.retrieve(query, k, Some(&filter)) {
                    Ok(docs) if !docs.is_empty() => return docs,
                    Ok(_) => warn!(attribute = %attr, "no QA documents for this attribute, searching the whole QA collection"),
                    Err(e) => warn!(attribute = %attr, error = %e, "filtered QA search failed, searching the whole QA collection"),
                }
            }
            None => warn!(doc = %top.id, "top document has no attribute id, searching the whole QA collection"),
        }
        qa.retrieve(query, k, None).unwrap_or_else(|e| {
            warn!(error = %e, "QA search failed, continuing without examples");
            Vec::new()
        })
    }

    /// Direct flow: top-k context under the character budget, system
    /// instruction, one generation call. Failures come back as a message.
    pub fn answer_question(&self, query: &str) -> String {
        match self.try_answer(query) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "answering failed");
                format!("죄송합니다, 답변 생성 중 오류가 발생했습니다: {e}")
            }
        }
    }

    fn try_answer(&self, query: &str) -> Result<String> {
        let docs = self.primary.retrieve(query, self.retrieval.search_k, None)?;
        let context = assemble(&docs, self.retrieval.context_max_length);
        info!(documents = docs.len(), chars = context.chars().count(), "context assembled");
        if context.is_empty() {
            return Ok(NO_SEARCH_RESULTS.to_string());
        }
        self.generator.generate(&self.templates.answer(query, &context))
    }

    /// Embeds and upserts into the primary collection.
    pub fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let added = self.primary.add_documents(documents)?;
        info!(documents = added, collection = self.primary.index().name(), "documents added");
        Ok(added)
    }
}
