use std::fs;
use std::sync::Arc;

use fdqa_cli::{ingest, run_inference, write_results, IngestOptions};
use fdqa_core::config::RetrievalSettings;
use fdqa_core::data_processor::{read_questions, IngestLayout};
use fdqa_core::traits::{AnswerGenerator, VectorIndex};
use fdqa_core::{InferenceResult, Result};
use fdqa_embed::FakeEmbedder;
use fdqa_rag::{PromptTemplates, QaService, Retriever, NO_DOCUMENT_FOUND};
use fdqa_vector::LanceIndex;

struct EchoGenerator;

impl AnswerGenerator for EchoGenerator {
    fn model_id(&self) -> &str { "echo" }
    fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("{} chars", prompt.chars().count()))
    }
}

fn records() -> serde_json::Value {
    let rec = |attr: i64, summary: &str, q: &str| {
        serde_json::json!({
            "CHNK_NO": 1, "SMRT_CHNK_NO": 1,
            "JNG_INFO": {"JNG_BIZ_CRTRA_YR": 2023, "JNGHDQRTRS_CONM_NM": "(주)서영에프앤비", "BRAND_NM": "서영", "JNG_IFRMP_SN": 1},
            "ATTRB_INFO": {"ATTRB_MNNO": attr, "KORN_ATTRB_NM": "가맹비", "UP_ATTRB_MNNO": 1, "KORN_UP_ATRB_NM": "비용"},
            "QL": {"EXTRACTED_SUMMARY_TEXT": summary, "ABSTRACTED_SUMMARY_TEXT": summary, "QAs": [{"QUESTION": q, "ANSWER": "답"}]}
        })
    };
    serde_json::json!([
        rec(7, "가맹비 500만원", "가맹비는 얼마인가요?"),
        rec(8, "", "빈 요약 질문"),
        rec(9, "로열티 매출의 3퍼센트", "로열티는 얼마인가요?"),
    ])
}

#[test]
fn ingest_then_batch_inference() {
    let tmp = tempfile::tempdir().unwrap();
    let json_path = tmp.path().join("test.json");
    fs::write(&json_path, records().to_string()).unwrap();
    let db_path = tmp.path().join("vector_db");
    let embedder = Arc::new(FakeEmbedder::new(32));

    let opts = IngestOptions {
        json_path: json_path.clone(),
        layout: IngestLayout::Summary,
        db_path: db_path.clone(),
        collection: "contracts_collection".to_string(),
        rebuild: false,
    };
    let report = ingest(&opts, embedder.as_ref()).unwrap();
    assert_eq!(report.documents, 2);
    assert_eq!(report.skipped, 1);
    let questions_path = report.questions_path.unwrap();
    let questions = read_questions(&questions_path).unwrap();
    assert_eq!(questions.len(), 2);

    // Re-ingesting upserts by id; rebuilding starts from scratch
    ingest(&opts, embedder.as_ref()).unwrap();
    let index = Arc::new(LanceIndex::open(&db_path, "contracts_collection", false).unwrap());
    assert_eq!(index.count().unwrap(), 2);
    ingest(&IngestOptions { rebuild: true, ..opts.clone() }, embedder.as_ref()).unwrap();
    assert_eq!(LanceIndex::open(&db_path, "contracts_collection", false).unwrap().count().unwrap(), 2);

    let service = QaService::new(
        Retriever::new(embedder.clone(), Arc::new(LanceIndex::open(&db_path, "contracts_collection", false).unwrap())),
        Arc::new(EchoGenerator),
        PromptTemplates::default(),
        RetrievalSettings { search_k: 1, ..RetrievalSettings::default() },
    );
    let results = run_inference(&service, &questions, Some(1));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].question, "가맹비는 얼마인가요?");
    assert!(results[0].answer.ends_with("chars"));

    let out = tmp.path().join("result").join("out.json");
    write_results(&out, &results).unwrap();
    let saved: Vec<InferenceResult> = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved, results);
}

#[test]
fn empty_collection_yields_sentinel_records() {
    let tmp = tempfile::tempdir().unwrap();
    let embedder = Arc::new(FakeEmbedder::new(16));
    let index = Arc::new(LanceIndex::open(&tmp.path().join("db"), "empty", true).unwrap());
    let service = QaService::new(
        Retriever::new(embedder, index),
        Arc::new(EchoGenerator),
        PromptTemplates::default(),
        RetrievalSettings::default(),
    );
    let questions = vec![fdqa_core::data_processor::ExtractedQuestion {
        question: "가맹비?".to_string(),
        source_doc: "t.json".to_string(),
        contract_idx: 0,
    }];
    let results = run_inference(&service, &questions, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].answer, NO_DOCUMENT_FOUND);
}
