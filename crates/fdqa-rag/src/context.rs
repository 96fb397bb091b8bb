//! Context assembly under a character budget.
//!
//! Blocks are taken greedily in rank order. A block that does not fit in the
//! remaining budget is skipped whole and later, shorter blocks are still
//! considered; document text is never cut. A single document larger than the
//! whole budget therefore never reaches the prompt, even when it is the top hit.
use fdqa_core::types::StructuredEntry;
use fdqa_core::Document;
use tracing::debug;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Body of one document: structured `[{topic, sub_topic, contents}]` text is
/// expanded into labelled sections, other JSON is rendered as a value, and
/// anything else is used verbatim.
pub fn document_body(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return text.to_string();
    };
    if let serde_json::Value::Array(items) = &value {
        if !items.is_empty() {
            if let Ok(entries) = serde_json::from_value::<Vec<StructuredEntry>>(value.clone()) {
                return entries
                    .iter()
                    .map(|e| format!("주제: {}\n소주제: {}\n내용: {}", e.topic, e.sub_topic, e.contents))
                    .collect::<Vec<_>>()
                    .join(BLOCK_SEPARATOR);
            }
        }
    }
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// `[문서 n] | key: value | ...` header followed by the body. `n` is 1-based.
pub fn render_block(ordinal: usize, doc: &Document) -> String {
    let meta: String = doc
        .metadata
        .iter()
        .filter(|(k, _)| k.as_str() != "text")
        .map(|(k, v)| format!(" | {k}: {v}"))
        .collect();
    format!("[문서 {ordinal}]{meta}\n{}", document_body(&doc.text))
}

/// Concatenates rendered blocks separated by blank lines. The result is at
/// most `max_length` characters, or empty when nothing fits.
pub fn assemble(docs: &[Document], max_length: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    let mut skipped = 0usize;
    for (i, doc) in docs.iter().enumerate() {
        let block = render_block(i + 1, doc);
        let sep = if out.is_empty() { 0 } else { BLOCK_SEPARATOR.len() };
        let cost = block.chars().count() + sep;
        if used + cost > max_length {
            skipped += 1;
            continue;
        }
        if sep > 0 {
            out.push_str(BLOCK_SEPARATOR);
        }
        out.push_str(&block);
        used += cost;
    }
    debug!(documents = docs.len(), skipped, chars = used, "assembled context");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_body_is_labelled() {
        let text = r#"[{"topic":"비용","sub_topic":"가맹비","contents":"500만원"},{"topic":"비용","sub_topic":"교육비","contents":"100만원"}]"#;
        assert_eq!(
            document_body(text),
            "주제: 비용\n소주제: 가맹비\n내용: 500만원\n\n주제: 비용\n소주제: 교육비\n내용: 100만원"
        );
    }

    #[test]
    fn plain_and_scalar_bodies() {
        assert_eq!(document_body("가맹비는 500만원"), "가맹비는 500만원");
        assert_eq!(document_body("\"quoted\""), "quoted");
        assert_eq!(document_body("42"), "42");
        assert_eq!(document_body("[]"), "[]");
        assert_eq!(document_body("[1, 2]"), "[1,2]");
    }
}
