//! Reference Harvester: JSON source records into harvest tables.
//!
//! The harvest stage stays close to the source format: foreign keys inside
//! nested columns are *not* resolved here, that is the enricher's job. Two
//! tables come out of it:
//!
//! - a terminology lookup table of `{key, type, label}` triples, partitioned
//!   semantically by the `type` discriminator (e.g. `nationality`),
//! - an objects table with scalar columns plus four nested
//!   list-of-struct columns (`dimensions`, `media`, `constituents`,
//!   `classification_refs`).
//!
//! Other source formats (XML exports and the like) are external
//! collaborators that must produce the same two tables.

use serde_json::Value;
use std::path::Path;

use crate::error::{HarvestError, HarvestResult};
use crate::table::{ColumnType, Field, FieldType, Schema, Table};

/// Sample source data with planted quality issues (OBJ-003 has no date and
/// no constituents, OBJ-005 has a 0.5 cm dimension), embedded at compile
/// time for the CLI default run and the test suite.
pub mod samples {
    pub const TERMINOLOGY: &str = include_str!("../../data/terminology.json");
    pub const OBJECTS: &str = include_str!("../../data/objects.json");
}

/// Schema of the terminology lookup table.
pub fn terminology_schema() -> Schema {
    Schema::new()
        .with("key", ColumnType::Str)
        .with("type", ColumnType::Str)
        .with("label", ColumnType::Str)
}

/// Schema of the harvested objects table.
pub fn objects_schema() -> Schema {
    Schema::new()
        .with("id", ColumnType::Str)
        .with("title", ColumnType::Str)
        .with("date", ColumnType::Int)
        .with("credit", ColumnType::Str)
        .with("department", ColumnType::Str)
        .with(
            "dimensions",
            ColumnType::List {
                fields: vec![
                    Field::new("type", FieldType::Str),
                    Field::new("value", FieldType::Float),
                    Field::new("unit", FieldType::Str),
                ],
            },
        )
        .with(
            "media",
            ColumnType::List {
                fields: vec![
                    Field::new("type", FieldType::Str),
                    Field::new("url", FieldType::Str),
                    Field::new("caption", FieldType::Str),
                ],
            },
        )
        .with(
            "constituents",
            ColumnType::List {
                fields: vec![
                    Field::new("name", FieldType::Str),
                    Field::new("role", FieldType::Str),
                    Field::new("birth_year", FieldType::Int),
                    Field::new("nationality_id", FieldType::Str),
                ],
            },
        )
        .with(
            "classification_refs",
            ColumnType::List {
                fields: vec![
                    Field::new("type_id", FieldType::Str),
                    Field::new("term_id", FieldType::Str),
                ],
            },
        )
}

/// Parse a JSON array of term records into the terminology lookup table.
pub fn harvest_terminology(source: &str) -> HarvestResult<Table> {
    harvest(source, terminology_schema())
}

/// Parse a JSON array of object records into the objects table.
///
/// Nested JSON arrays become list-of-struct columns directly; missing
/// optional fields default to null and absent collections to empty lists.
pub fn harvest_objects(source: &str) -> HarvestResult<Table> {
    harvest(source, objects_schema())
}

/// File-based variant of [`harvest_terminology`].
pub fn harvest_terminology_file(path: impl AsRef<Path>) -> HarvestResult<Table> {
    harvest_terminology(&std::fs::read_to_string(path)?)
}

/// File-based variant of [`harvest_objects`].
pub fn harvest_objects_file(path: impl AsRef<Path>) -> HarvestResult<Table> {
    harvest_objects(&std::fs::read_to_string(path)?)
}

fn harvest(source: &str, schema: Schema) -> HarvestResult<Table> {
    let doc: Value = serde_json::from_str(source)?;
    let records = doc.as_array().ok_or(HarvestError::NotAnArray)?;
    Ok(Table::from_records(schema, records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_terminology_parses() {
        let terms = harvest_terminology(samples::TERMINOLOGY).unwrap();
        assert!(terms.len() >= 10);
        assert_eq!(terms.value(0, "key").unwrap(), "CT-OBJECT");
    }

    #[test]
    fn test_sample_objects_parse_with_nested_columns() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        assert_eq!(objects.len(), 5);
        assert!(objects.schema().column_type("constituents").unwrap().is_list());
        assert!(objects
            .schema()
            .column_type("classification_refs")
            .unwrap()
            .is_list());
    }

    #[test]
    fn test_planted_issues_survive_harvest() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();

        // OBJ-003: null date, empty constituents
        let obj3 = objects.filter(|r| r.get("id").and_then(Value::as_str) == Some("OBJ-003"));
        assert_eq!(obj3.value(0, "date").unwrap(), &Value::Null);
        assert_eq!(obj3.value(0, "constituents").unwrap(), &json!([]));

        // OBJ-005: 0.5 cm dimension
        let obj5 = objects.filter(|r| r.get("id").and_then(Value::as_str) == Some("OBJ-005"));
        let dims = obj5.value(0, "dimensions").unwrap().as_array().unwrap();
        assert!(dims.iter().any(|d| d["value"] == json!(0.5)));
    }

    #[test]
    fn test_missing_collections_become_empty_lists() {
        let objects = harvest_objects(
            r#"[{"id": "OBJ-900", "title": "Bare", "credit": "x", "department": "y"}]"#,
        )
        .unwrap();
        assert_eq!(objects.value(0, "media").unwrap(), &json!([]));
        assert_eq!(objects.value(0, "date").unwrap(), &Value::Null);
    }

    #[test]
    fn test_non_array_source_rejected() {
        let err = harvest_objects(r#"{"id": "OBJ-001"}"#).unwrap_err();
        assert!(matches!(err, HarvestError::NotAnArray));
    }
}
