//! Output sink: render the validated table as publishable JSON documents.
//!
//! One document per record, nested columns as nested arrays. The sink never
//! decides whether it runs; the orchestrator only reaches it when validation
//! passed.

use serde_json::Value;
use std::path::Path;

use crate::error::StoreResult;
use crate::table::Table;

/// Render each table row as one JSON document.
pub fn to_documents(table: &Table) -> Vec<Value> {
    table.to_records()
}

/// Write the documents of a table to `path` as a JSON array.
pub fn write_documents(table: &Table, path: impl AsRef<Path>) -> StoreResult<()> {
    let docs = Value::Array(to_documents(table));
    std::fs::write(path, serde_json::to_string_pretty(&docs)?)?;
    Ok(())
}
