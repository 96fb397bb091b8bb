use std::io::{self, BufRead, Write};

use clap::Parser;

use fdqa_cli::init_tracing;
use fdqa_core::config::Settings;
use fdqa_rag::QaService;

#[derive(Parser)]
#[command(name = "fdqa-ask")]
#[command(about = "Answer franchise questions from the vector collection")]
struct Cli {
    /// Questions to answer; read from stdin, one per line, when omitted
    questions: Vec<String>,

    /// Use two-stage few-shot inference instead of the direct answer flow
    #[arg(long)]
    few_shot: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn answer(service: &QaService, question: &str, few_shot: bool) -> String {
    if !few_shot {
        return service.answer_question(question);
    }
    match service.inference(question) {
        Ok(outcome) => outcome.into_record(question).answer,
        Err(e) => format!("❌ 오류: {e}"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = Settings::load()?;
    let service = QaService::from_settings(&settings)?;

    if !cli.questions.is_empty() {
        for (i, q) in cli.questions.iter().enumerate() {
            println!("\n--- 질문 {}: {q} ---", i + 1);
            println!("답변: {}", answer(&service, q, cli.few_shot));
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut out = io::stdout();
    write!(out, "질문> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let q = line.trim();
        if !q.is_empty() {
            println!("답변: {}\n", answer(&service, q, cli.few_shot));
        }
        write!(out, "질문> ")?;
        out.flush()?;
    }
    println!();
    Ok(())
}
