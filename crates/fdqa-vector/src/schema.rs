use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

use fdqa_core::types::fields::FILTERABLE;

pub const ID_COLUMN: &str = "id";
pub const TEXT_COLUMN: &str = "text";
pub const METADATA_COLUMN: &str = "metadata";
pub const VECTOR_COLUMN: &str = "vector";

/// `id`, `text`, full metadata as JSON, one canonical-string column per
/// filterable field, then the embedding.
pub fn build_collection_schema(dim: i32) -> SchemaRef {
    let mut fields = vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(TEXT_COLUMN, DataType::Utf8, false),
        Field::new(METADATA_COLUMN, DataType::Utf8, false),
    ];
    fields.extend(FILTERABLE.iter().map(|name| Field::new(*name, DataType::Utf8, true)));
    fields.push(Field::new(
        VECTOR_COLUMN,
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
        true,
    ));
    Arc::new(Schema::new(fields))
}

/// Width of the vector column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_carries_every_filterable_column() {
        let schema = build_collection_schema(8);
        for name in FILTERABLE {
            assert!(schema.field_with_name(name).is_ok(), "{name}");
        }
        assert_eq!(vector_dim(&schema), Some(8));
    }
}
