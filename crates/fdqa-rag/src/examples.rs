use tracing::warn;

use fdqa_core::types::fields;
use fdqa_core::{Document, QaPair};

/// Returned instead of examples when no usable pair exists.
pub const NO_EXAMPLES: &str = "(예시 없음)";

/// Collects up to `max_examples` `Q:`/`A:` pairs from the serialized `QAs`
/// metadata of `docs`, in document then pair order. Pairs with an empty side
/// are ignored; a document whose `QAs` does not parse is skipped.
pub fn extract_examples(docs: &[Document], max_examples: usize) -> String {
    let mut examples: Vec<String> = Vec::new();
    'docs: for doc in docs {
        if examples.len() >= max_examples {
            break;
        }
        let Some(raw) = doc.meta(fields::QA_PAIRS).and_then(|v| v.as_str()) else { continue };
        let pairs: Vec<QaPair> = match serde_json::from_str(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(doc = %doc.id, error = %e, "skipping unparseable QA metadata");
                continue;
            }
        };
        for qa in &pairs {
            let (q, a) = (qa.question.trim(), qa.answer.trim());
            if !q.is_empty() && !a.is_empty() {
                examples.push(format!("Q: {q}\nA: {a}"));
            }
            if examples.len() >= max_examples {
                break 'docs;
            }
        }
    }
    if examples.is_empty() {
        NO_EXAMPLES.to_string()
    } else {
        examples.join("\n\n")
    }
}
