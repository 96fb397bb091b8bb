//! Shared plumbing for the `fdqa-*` binaries: logging setup, ingestion and
//! batch inference.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fdqa_core::data_processor::{questions_path_for, write_questions, DataProcessor, ExtractedQuestion, IngestLayout};
use fdqa_core::traits::Embedder;
use fdqa_core::InferenceResult;
use fdqa_rag::QaService;

const EMBED_BATCH: usize = 64;

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

pub fn progress_bar(len: usize, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}");
    let style = ProgressStyle::default_bar()
        .template(&template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// A records file, or a directory of them.
    pub json_path: PathBuf,
    pub layout: IngestLayout,
    pub db_path: PathBuf,
    pub collection: String,
    /// Delete the database directory first.
    pub rebuild: bool,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub skipped: usize,
    pub questions_path: Option<PathBuf>,
}

/// Parses records, embeds them in batches and upserts them into the collection.
/// Summary ingestion of a single file also writes its extracted questions.
pub fn ingest(opts: &IngestOptions, embedder: &dyn Embedder) -> Result<IngestReport> {
    let processor = DataProcessor::new(opts.layout);
    let batch = if opts.json_path.is_dir() {
        processor.process_directory(&opts.json_path)
    } else {
        processor.process_file(&opts.json_path)
    }
    .with_context(|| format!("reading {}", opts.json_path.display()))?;

    if opts.rebuild && opts.db_path.exists() {
        warn!(db = %opts.db_path.display(), "removing existing vector database");
        fs::remove_dir_all(&opts.db_path).with_context(|| format!("removing {}", opts.db_path.display()))?;
    }
    let index = fdqa_vector::create_collection(&opts.db_path, &opts.collection)?;

    let pb = progress_bar(batch.documents.len(), "documents");
    for chunk in batch.documents.chunks(EMBED_BATCH) {
        let texts: Vec<String> = chunk.iter().map(|d| d.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        index.insert(chunk, &vectors)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");
    info!(collection = %opts.collection, documents = batch.documents.len(), total = index.count()?, "collection updated");

    let questions_path = if opts.layout == IngestLayout::Summary && opts.json_path.is_file() {
        let path = questions_path_for(&opts.json_path);
        write_questions(&path, &batch.questions)?;
        info!(path = %path.display(), questions = batch.questions.len(), "extracted questions written");
        Some(path)
    } else {
        None
    };

    Ok(IngestReport { documents: batch.documents.len(), skipped: batch.skipped, questions_path })
}

/// One result per question, in order. Retrieval failures become sentinel answers.
pub fn run_inference(service: &QaService, questions: &[ExtractedQuestion], limit: Option<usize>) -> Vec<InferenceResult> {
    let take = limit.unwrap_or(questions.len()).min(questions.len());
    let pb = progress_bar(take, "questions");
    let mut results = Vec::with_capacity(take);
    for q in &questions[..take] {
        let record = match service.inference(&q.question) {
            Ok(outcome) => outcome.into_record(&q.question),
            Err(e) => {
                warn!(question = %q.question, error = %e, "inference failed");
                InferenceResult { original_text: String::new(), question: q.question.clone(), answer: format!("❌ 오류: {e}") }
            }
        };
        results.push(record);
        pb.inc(1);
    }
    pb.finish_and_clear();
    results
}

pub fn write_results(path: &Path, results: &[InferenceResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(results)?).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
