//! # Curio - collection record enrichment and validation pipeline
//!
//! Curio harvests museum collection exports, resolves the terminology
//! references inside their nested columns, validates the enriched records
//! against a declarative nested schema, and publishes documents only when
//! validation passes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Source JSON │────▶│   Harvest   │────▶│   Enrich    │────▶│  Validate   │──▶ Output
//! │ (objs+terms)│     │  (tables)   │     │ (nested join│     │  (blocking  │    (docs)
//! └─────────────┘     └─────────────┘     │  + re-nest) │     │   gate)     │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curio::{run, RunOptions, RunState};
//!
//! fn main() {
//!     let outcome = run(&RunOptions::default()).unwrap();
//!     if outcome.state == RunState::Output {
//!         println!("published {} documents", outcome.documents.len());
//!     } else {
//!         println!("{} failures", outcome.report.failures.len());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`table`] - Tabular value model with nested list-of-struct columns
//! - [`harvest`] - Source parsing into tables
//! - [`enrich`] - Lookup resolution inside nested columns
//! - [`validate`] - Declarative nested-schema validation
//! - [`store`] - Table persistence
//! - [`output`] - Document rendering
//! - [`pipeline`] - Stage orchestration with the blocking gate

// Core modules
pub mod error;
pub mod table;

// Harvesting
pub mod harvest;

// Enrichment
pub mod enrich;

// Validation
pub mod validate;

// Persistence
pub mod store;

// Output
pub mod output;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    HarvestError,
    PipelineError,
    StoreError,
    TableError,
    ValidateError,
};

// =============================================================================
// Re-exports - Table model
// =============================================================================

pub use table::{
    Column,
    ColumnType,
    Field,
    FieldType,
    RowRef,
    Schema,
    Table,
};

// =============================================================================
// Re-exports - Harvest
// =============================================================================

pub use harvest::{
    harvest_objects,
    harvest_objects_file,
    harvest_terminology,
    harvest_terminology_file,
    objects_schema,
    terminology_schema,
};

// =============================================================================
// Re-exports - Enrichment
// =============================================================================

pub use enrich::{enrich_objects, nested_join, Lookup};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validate::{
    object_schema,
    Aggregate,
    Check,
    CheckSummary,
    ElementPredicate,
    FailureRecord,
    FieldRule,
    Guard,
    Rule,
    TableSchema,
    ValidationReport,
    OBJECT_SCHEMA,
};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{read_table, write_table};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use output::{to_documents, write_documents};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{run, RunOptions, RunOutcome, RunState};
