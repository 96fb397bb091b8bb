use std::path::PathBuf;

use clap::Parser;

use fdqa_cli::{ingest, init_tracing, IngestOptions};
use fdqa_core::config::{expand_path, Settings};
use fdqa_core::data_processor::IngestLayout;

#[derive(Parser)]
#[command(name = "fdqa-ingest")]
#[command(about = "Build a franchise-disclosure vector collection from JSON records")]
struct Cli {
    /// Records file, or a directory of `*.json` files
    #[arg(long)]
    json_path: PathBuf,

    /// summary | qa | structured
    #[arg(long, default_value = "summary")]
    layout: IngestLayout,

    /// Database directory (defaults to the configured path for the layout)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Collection name (defaults to the configured name for the layout)
    #[arg(long)]
    collection: Option<String>,

    /// Delete the database directory before writing
    #[arg(long)]
    rebuild: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = Settings::load()?;

    let (default_db, default_collection) = match cli.layout {
        IngestLayout::Qa => (&settings.vector.qa_db_path, &settings.vector.qa_collection),
        IngestLayout::Summary | IngestLayout::Structured => (&settings.vector.db_path, &settings.vector.collection),
    };
    let opts = IngestOptions {
        json_path: cli.json_path,
        layout: cli.layout,
        db_path: cli.db_path.unwrap_or_else(|| expand_path(default_db)),
        collection: cli.collection.unwrap_or_else(|| default_collection.clone()),
        rebuild: cli.rebuild,
    };

    let embedder = fdqa_embed::get_default_embedder(&settings.embedding)?;
    let report = ingest(&opts, embedder.as_ref())?;

    println!("✅ {} documents ingested into '{}' ({} skipped)", report.documents, opts.collection, report.skipped);
    if let Some(path) = report.questions_path {
        println!("📝 questions saved to {}", path.display());
    }
    Ok(())
}
