//! Pipeline orchestration: harvest → enrich → validate → output.
//!
//! Stages run strictly in dependency order and each consumes the committed
//! result of the one before. Validation sits between the transform and the
//! output as a blocking gate: when the report fails, the run ends in
//! [`RunState::Blocked`] and the output stage never executes, so no
//! document of a failed run can reach a consumer. Structural problems abort
//! the run with an error; bad data never does.

use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::enrich::{enrich_objects, Lookup};
use crate::error::PipelineResult;
use crate::harvest::{
    harvest_objects, harvest_objects_file, harvest_terminology, harvest_terminology_file, samples,
};
use crate::output::{to_documents, write_documents};
use crate::store::write_table;
use crate::validate::{ValidationReport, OBJECT_SCHEMA};

/// Progress of a run through the stage machine. A run advances
/// `Harvested → Transformed → Validated` and terminates in either `Output`
/// or `Blocked`, depending only on the validation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Sources parsed into harvest tables.
    Harvested,
    /// Enrichment complete.
    Transformed,
    /// Validation ran; `passed` decides the terminal state.
    Validated { passed: bool },
    /// Terminal: documents rendered (and written when a path was given).
    Output,
    /// Terminal: validation failed, the output stage did not run.
    Blocked,
}

/// Inputs and side channels of one run. Defaults to the embedded sample
/// sources with no persistence.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Terminology source file; embedded sample when absent.
    pub terminology: Option<PathBuf>,
    /// Objects source file; embedded sample when absent.
    pub objects: Option<PathBuf>,
    /// Directory to persist the harvested and enriched tables into.
    pub store_dir: Option<PathBuf>,
    /// Destination for the output documents. Only written when validation
    /// passed.
    pub output: Option<PathBuf>,
}

/// Result of one run: terminal state, the full validation report, and the
/// rendered documents (empty when blocked).
#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    pub report: ValidationReport,
    pub documents: Vec<Value>,
}

/// Run the full pipeline.
pub fn run(options: &RunOptions) -> PipelineResult<RunOutcome> {
    let terminology = match &options.terminology {
        Some(path) => harvest_terminology_file(path)?,
        None => harvest_terminology(samples::TERMINOLOGY)?,
    };
    let objects = match &options.objects {
        Some(path) => harvest_objects_file(path)?,
        None => harvest_objects(samples::OBJECTS)?,
    };
    let mut state = RunState::Harvested;
    info!(
        ?state,
        terms = terminology.len(),
        objects = objects.len(),
        "stage complete"
    );
    if let Some(dir) = &options.store_dir {
        std::fs::create_dir_all(dir)?;
        write_table(&terminology, dir.join("terminology.table.json"))?;
        write_table(&objects, dir.join("objects.table.json"))?;
    }

    let lookup = Lookup::new(terminology, "key")?;
    let enriched = enrich_objects(&objects, &lookup)?;
    state = RunState::Transformed;
    info!(?state, rows = enriched.len(), "stage complete");
    if let Some(dir) = &options.store_dir {
        write_table(&enriched, dir.join("enriched.table.json"))?;
    }

    let report = OBJECT_SCHEMA.validate(&enriched)?;
    state = RunState::Validated {
        passed: report.passed,
    };
    info!(?state, failures = report.failures.len(), "stage complete");

    if !report.passed {
        for entry in report.summary() {
            warn!(
                column = %entry.column,
                check = %entry.check,
                rows = ?entry.row_keys,
                value = entry.sample_value.as_deref().unwrap_or(""),
                "check failed"
            );
        }
        return Ok(RunOutcome {
            state: RunState::Blocked,
            report,
            documents: Vec::new(),
        });
    }

    if let Some(path) = &options.output {
        write_documents(&enriched, path)?;
        info!(path = %path.display(), "output written");
    }
    Ok(RunOutcome {
        state: RunState::Output,
        report,
        documents: to_documents(&enriched),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::samples;

    /// Sample objects minus the two planted-issue records.
    fn clean_objects_json() -> String {
        let records: Vec<Value> = serde_json::from_str(samples::OBJECTS).unwrap();
        let clean: Vec<Value> = records
            .into_iter()
            .filter(|r| r["id"] != "OBJ-003" && r["id"] != "OBJ-005")
            .collect();
        serde_json::to_string(&clean).unwrap()
    }

    #[test]
    fn test_sample_run_is_blocked_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("documents.json");
        let outcome = run(&RunOptions {
            output: Some(out.clone()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(outcome.state, RunState::Blocked);
        assert!(outcome.documents.is_empty());
        assert!(!outcome.report.passed);
        assert!(!out.exists());
    }

    #[test]
    fn test_clean_run_reaches_output() {
        let dir = tempfile::tempdir().unwrap();
        let objects = dir.path().join("objects.json");
        std::fs::write(&objects, clean_objects_json()).unwrap();
        let out = dir.path().join("documents.json");

        let outcome = run(&RunOptions {
            objects: Some(objects),
            output: Some(out.clone()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(outcome.state, RunState::Output);
        assert!(outcome.report.passed);
        assert_eq!(outcome.documents.len(), 3);
        assert_eq!(outcome.documents[0]["classifications"][0]["term_label"], "Painting");

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_store_dir_persists_intermediate_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store");
        let outcome = run(&RunOptions {
            store_dir: Some(store.clone()),
            ..Default::default()
        })
        .unwrap();

        // intermediates are persisted even when the run ends blocked
        assert_eq!(outcome.state, RunState::Blocked);
        assert!(store.join("terminology.table.json").exists());
        assert!(store.join("objects.table.json").exists());
        assert!(store.join("enriched.table.json").exists());

        let enriched = crate::store::read_table(store.join("enriched.table.json")).unwrap();
        assert_eq!(enriched.len(), 5);
    }

    #[test]
    fn test_missing_source_file_is_fatal() {
        let err = run(&RunOptions {
            objects: Some(PathBuf::from("/nonexistent/objects.json")),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Harvest(_)));
    }
}
