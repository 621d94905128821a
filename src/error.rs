//! Error types for the Curio pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`TableError`] - Tabular value model errors (schema, type, join key)
//! - [`HarvestError`] - Source parsing errors
//! - [`ValidateError`] - Validation *engine* errors
//! - [`StoreError`] - Table persistence errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Structural errors are fatal: they indicate a broken pipeline
//! configuration, not bad input data. Data-quality outcomes are never
//! errors — they travel as a [`crate::validate::ValidationReport`] and make
//! the orchestrator block the output stage instead.

use thiserror::Error;

// =============================================================================
// Tabular Value Model Errors
// =============================================================================

/// Errors from operations on [`crate::table::Table`].
#[derive(Debug, Error)]
pub enum TableError {
    /// Referenced column does not exist in the schema.
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    /// Operation applied to a column of the wrong type.
    #[error("column '{column}' is not a {expected} column")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// An operation would produce two columns with the same name.
    #[error("operation would duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A join key occurs more than once on the lookup side.
    #[error("key '{key}' is not unique in column '{column}'")]
    AmbiguousKey { column: String, key: String },

    /// A record value cannot be coerced to the declared column type.
    #[error("row {row}: value for column '{column}' does not match type {expected}")]
    ValueType {
        row: usize,
        column: String,
        expected: &'static str,
    },
}

// =============================================================================
// Harvest Errors
// =============================================================================

/// Errors while harvesting source records into tables.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Failed to read a source file.
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// Source is not valid JSON.
    #[error("invalid JSON source: {0}")]
    Json(#[from] serde_json::Error),

    /// Source document is not an array of records.
    #[error("expected a JSON array of records")]
    NotAnArray,

    /// Records do not fit the harvest schema.
    #[error("harvest schema error: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Validation Engine Errors
// =============================================================================

/// Errors from the validation *engine* itself.
///
/// These are distinct from data-quality failures: a check that cannot
/// complete because its declaration references a missing column is a broken
/// schema declaration, not bad data, and propagates as a fatal error.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A declared rule references a column missing from the table.
    #[error("check declaration error: {0}")]
    Table(#[from] TableError),

    /// A list-column check was declared against a scalar column.
    #[error("check '{check}' targets '{column}', which is not a list column")]
    NotAList { check: String, column: String },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors while persisting or reloading tables.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored rows no longer fit the stored schema.
    #[error("stored table is inconsistent: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run`].
/// It wraps all lower-level errors; every variant is fatal and aborts the
/// run. A failed validation is *not* among them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Harvest error.
    #[error("harvest error: {0}")]
    Harvest(#[from] HarvestError),

    /// Table operation error.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Validation engine error.
    #[error("validation engine error: {0}")]
    Validate(#[from] ValidateError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error outside of harvest/store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for harvest operations.
pub type HarvestResult<T> = Result<T, HarvestError>;

/// Result type for validation engine operations.
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // TableError -> PipelineError
        let table_err = TableError::UnknownColumn("title".into());
        let pipeline_err: PipelineError = table_err.into();
        assert!(pipeline_err.to_string().contains("title"));

        // TableError -> ValidateError -> PipelineError
        let validate_err: ValidateError = TableError::TypeMismatch {
            column: "dimensions".into(),
            expected: "list",
        }
        .into();
        let pipeline_err: PipelineError = validate_err.into();
        assert!(pipeline_err.to_string().contains("dimensions"));
    }

    #[test]
    fn test_ambiguous_key_format() {
        let err = TableError::AmbiguousKey {
            column: "key".into(),
            key: "NAT-001".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("NAT-001"));
        assert!(msg.contains("not unique"));
    }
}
