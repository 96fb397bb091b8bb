use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

use fdqa_core::types::fields;
use fdqa_core::Document;
use fdqa_rag::context::render_block;
use fdqa_rag::{assemble, build, extract_examples, NO_EXAMPLES};

fn docs(texts: &[String]) -> Vec<Document> {
    texts.iter().enumerate().map(|(i, t)| Document::new(format!("d{i}"), t.clone())).collect()
}

#[quickcheck]
fn assembled_context_fits_budget(texts: Vec<String>, max: u16) -> TestResult {
    if max == 0 {
        return TestResult::discard();
    }
    let out = assemble(&docs(&texts), usize::from(max));
    TestResult::from_bool(out.chars().count() <= usize::from(max))
}

#[quickcheck]
fn oversized_block_is_skipped_but_later_block_kept(small: String, slack: u8) -> bool {
    let small_doc = Document::new("small", small);
    let max = render_block(2, &small_doc).chars().count() + usize::from(slack);
    let big = Document::new("big", "x".repeat(max + 1));
    assemble(&[big, small_doc.clone()], max) == render_block(2, &small_doc)
}

#[quickcheck]
fn build_replaces_each_marker_once(pieces: (String, String, String, String), order: u8, values: (String, String, String)) -> bool {
    let clean = |s: &String| s.replace('%', "");
    let p = [clean(&pieces.0), clean(&pieces.1), clean(&pieces.2), clean(&pieces.3)];
    let (examples, context, question) = values;
    let markers = [("%examples%", examples.as_str()), ("%context%", context.trim()), ("%question%", question.trim())];
    let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let perm = perms[usize::from(order) % perms.len()];

    let mut template = p[0].clone();
    let mut expected = p[0].clone();
    for (slot, &m) in perm.iter().enumerate() {
        template.push_str(markers[m].0);
        template.push_str(&p[slot + 1]);
        expected.push_str(markers[m].1);
        expected.push_str(&p[slot + 1]);
    }
    build(&template, &question, &context, &examples) == expected
}

#[quickcheck]
fn build_without_markers_is_identity(template: String) -> bool {
    let template = template.replace('%', "");
    build(&template, "q", "c", "e") == template
}

#[quickcheck]
fn examples_never_exceed_cap(pairs_per_doc: Vec<u8>, max: u8) -> bool {
    let max = usize::from(max % 8);
    let docs: Vec<Document> = pairs_per_doc
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let qas: Vec<serde_json::Value> = (0..n % 5)
                .map(|j| serde_json::json!({"QUESTION": format!("q{i}-{j}"), "ANSWER": format!("a{i}-{j}")}))
                .collect();
            Document::new(format!("qa{i}"), "t").with_meta(fields::QA_PAIRS, serde_json::Value::Array(qas).to_string())
        })
        .collect();
    let total: usize = pairs_per_doc.iter().map(|n| usize::from(n % 5)).sum();
    let out = extract_examples(&docs, max);
    let count = out.lines().filter(|l| l.starts_with("Q: ")).count();
    if total == 0 || max == 0 {
        out == NO_EXAMPLES
    } else {
        count == total.min(max)
    }
}

#[test]
fn malformed_qa_metadata_is_skipped() {
    let docs = vec![
        Document::new("bad", "t").with_meta(fields::QA_PAIRS, "not json"),
        Document::new("good", "t").with_meta(fields::QA_PAIRS, r#"[{"question":"q","answer":"a"}]"#),
    ];
    assert_eq!(extract_examples(&docs, 3), "Q: q\nA: a");
    assert_eq!(extract_examples(&[], 3), NO_EXAMPLES);
}

#[test]
fn ordinals_follow_input_position() {
    let d = docs(&["x".repeat(50), "short".to_string()]);
    let out = assemble(&d, 30);
    assert!(out.starts_with("[문서 2]"), "{out}");
}

#[test]
fn metadata_key_named_text_is_left_out_of_header() {
    let doc = Document::new("d", "body").with_meta("text", "shadow").with_meta(fields::BRAND_NAME, "X");
    assert_eq!(render_block(1, &doc), "[문서 1] | BRAND_NM: X\nbody");
}

#[test]
fn sole_document_over_budget_yields_empty_context() {
    assert_eq!(assemble(&docs(&["x".repeat(100)]), 50), "");
}
