//! Table persistence: schema plus records in one JSON document.
//!
//! A stored table is self-describing, so a reload re-applies the same
//! schema-on-write coercion as the original harvest. A file whose rows no
//! longer fit its own schema fails to load instead of producing a
//! half-typed table.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::StoreResult;
use crate::table::{Schema, Table};

#[derive(Serialize, Deserialize)]
struct StoredTable {
    schema: Schema,
    records: Vec<Value>,
}

/// Persist a table to `path` as a `{schema, records}` document.
pub fn write_table(table: &Table, path: impl AsRef<Path>) -> StoreResult<()> {
    let doc = StoredTable {
        schema: table.schema().clone(),
        records: table.to_records(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

/// Reload a table written by [`write_table`].
pub fn read_table(path: impl AsRef<Path>) -> StoreResult<Table> {
    let doc: StoredTable = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(Table::from_records(doc.schema, &doc.records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{enrich_objects, Lookup};
    use crate::harvest::{harvest_objects, harvest_terminology, samples};
    use crate::error::StoreError;

    #[test]
    fn test_roundtrip_preserves_nested_table() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        let terms =
            Lookup::new(harvest_terminology(samples::TERMINOLOGY).unwrap(), "key").unwrap();
        let enriched = enrich_objects(&objects, &terms).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enriched.json");
        write_table(&enriched, &path).unwrap();
        let reloaded = read_table(&path).unwrap();

        assert_eq!(reloaded, enriched);
    }

    #[test]
    fn test_inconsistent_store_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{
                "schema": {"columns": [{"name": "year", "ty": {"type": "int"}}]},
                "records": [{"year": "not a number"}]
            }"#,
        )
        .unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, StoreError::Table(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_table("/nonexistent/table.json").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
