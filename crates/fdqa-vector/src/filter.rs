use fdqa_core::types::fields::FILTERABLE;
use fdqa_core::{Error, MetadataFilter, Result};

/// Compiles a conjunctive equality filter into a Lance SQL predicate over the
/// per-field string columns. Field names are backtick-quoted because they are
/// upper case; values are compared by their canonical text.
pub fn compile_predicate(filter: &MetadataFilter) -> Result<Option<String>> {
    if filter.is_empty() {
        return Ok(None);
    }
    let mut clauses = Vec::new();
    for (key, value) in filter.terms() {
        if !FILTERABLE.contains(&key) {
            return Err(Error::InvalidInput(format!("metadata field '{key}' is not filterable")));
        }
        clauses.push(format!("`{key}` = '{}'", value.canonical().replace('\'', "''")));
    }
    Ok(Some(clauses.join(" AND ")))
}
