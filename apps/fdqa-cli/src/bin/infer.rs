use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use fdqa_cli::{init_tracing, run_inference, write_results};
use fdqa_core::config::Settings;
use fdqa_core::data_processor::{questions_path_for, read_questions};
use fdqa_rag::QaService;

#[derive(Parser)]
#[command(name = "fdqa-infer")]
#[command(about = "Run few-shot inference over the questions extracted from a records file")]
struct Cli {
    /// Records file whose `extract_question_<name>` sibling holds the questions
    #[arg(long)]
    json_path: PathBuf,

    /// Only the first N questions
    #[arg(long)]
    limit: Option<usize>,

    /// Output JSON file
    #[arg(long, default_value = "./data/result/test_data.json")]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = Settings::load()?;

    let questions_path = questions_path_for(&cli.json_path);
    let questions = read_questions(&questions_path).with_context(|| "run fdqa-ingest on the records file first")?;
    let service = QaService::from_settings(&settings)?;

    let results = run_inference(&service, &questions, cli.limit);
    write_results(&cli.output, &results)?;
    println!("✅ {} results saved to {}", results.len(), cli.output.display());
    Ok(())
}
