//! Nested Schema Validator: declarative checks over nested tabular data.
//!
//! Checks are plain data — a name, a target column, optional guards, and a
//! rule — held in an ordered collection and evaluated by one generic
//! interpreter. There is no check class hierarchy; a check is declared once
//! and evaluated exactly once per row against an immutable table snapshot,
//! so checks are independent and their declared order never affects the
//! outcome.
//!
//! Three rule families cover the taxonomy:
//!
//! - scalar field constraints ([`FieldRule`]): nullability, numeric bounds
//!   (inclusive or exclusive), minimum string length, table-wide uniqueness;
//! - per-element aggregates ([`Rule::Elements`]): a predicate applied to
//!   every element of a list column, reduced with ALL / ANY / COUNT-EQUALS;
//! - cross-column rules ([`Rule::MaxFieldBelowColumn`]): a nested numeric
//!   field aggregated and compared against a scalar column of the same row.
//!
//! Guards express conditional checks as `NOT guard OR rule`: when a guard
//! does not hold the row passes, so a check guarded on a non-empty list
//! short-circuits to true for empty lists instead of crashing.
//!
//! Failing values are reported through a bounded scalar summarizer: a nested
//! offending value degrades to a short placeholder rather than being
//! serialized into the report, and the summary is capped, so reporting can
//! never take the engine down with it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{ValidateError, ValidateResult};
use crate::table::{key_of, RowRef, Table};

/// Cap on a reported failure value, mirroring the summary truncation of the
/// upstream reporting tools this pipeline feeds.
const MAX_SUMMARY_LEN: usize = 80;

// =============================================================================
// Scalar field rules
// =============================================================================

/// Constraints on one scalar column.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub column: String,
    pub nullable: bool,
    pub unique: bool,
    pub min_len: Option<usize>,
    pub ge: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub lt: Option<f64>,
}

impl FieldRule {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            nullable: true,
            unique: false,
            min_len: None,
            ge: None,
            gt: None,
            le: None,
            lt: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }
}

// =============================================================================
// Declarative checks
// =============================================================================

/// Predicate evaluated against one element of a list-of-struct column.
/// An absent or null field fails value predicates; it never crashes.
#[derive(Debug, Clone)]
pub enum ElementPredicate {
    /// Numeric field strictly greater than a bound.
    FieldGt(String, f64),
    /// Field equals a scalar value.
    FieldEq(String, Value),
    /// Field is present and non-null.
    FieldNotNull(String),
    /// String field is non-empty.
    FieldStrNonEmpty(String),
    /// String field matches a regular expression.
    FieldMatches(String, Regex),
}

impl ElementPredicate {
    fn field(&self) -> &str {
        match self {
            ElementPredicate::FieldGt(f, _)
            | ElementPredicate::FieldEq(f, _)
            | ElementPredicate::FieldNotNull(f)
            | ElementPredicate::FieldStrNonEmpty(f)
            | ElementPredicate::FieldMatches(f, _) => f,
        }
    }

    fn eval(&self, element: &Value) -> bool {
        let v = element.get(self.field()).unwrap_or(&Value::Null);
        match self {
            ElementPredicate::FieldGt(_, min) => v.as_f64().is_some_and(|x| x > *min),
            ElementPredicate::FieldEq(_, expected) => v == expected,
            ElementPredicate::FieldNotNull(_) => !v.is_null(),
            ElementPredicate::FieldStrNonEmpty(_) => v.as_str().is_some_and(|s| !s.is_empty()),
            ElementPredicate::FieldMatches(_, re) => v.as_str().is_some_and(|s| re.is_match(s)),
        }
    }
}

/// Reduction of per-element predicate results into one row verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Every element satisfies the predicate (vacuously true when empty).
    All,
    /// At least one element satisfies the predicate (false when empty).
    Any,
    /// Exactly `n` elements satisfy the predicate.
    CountEq(usize),
}

/// Condition under which a check applies to a row. A failed guard means the
/// row passes the check (`NOT guard OR rule`), with no side effects.
#[derive(Debug, Clone)]
pub enum Guard {
    /// The named list column has at least one element.
    ListNonEmpty(String),
    /// The named scalar column equals a value.
    ColumnEquals(String, Value),
    /// The named scalar column is non-null.
    ColumnNotNull(String),
}

impl Guard {
    fn column(&self) -> &str {
        match self {
            Guard::ListNonEmpty(c) | Guard::ColumnEquals(c, _) | Guard::ColumnNotNull(c) => c,
        }
    }

    fn holds(&self, row: RowRef<'_>) -> bool {
        match self {
            Guard::ListNonEmpty(col) => row.list_len(col) > 0,
            Guard::ColumnEquals(col, expected) => row.get(col) == Some(expected),
            Guard::ColumnNotNull(col) => row.get(col).is_some_and(|v| !v.is_null()),
        }
    }
}

/// What a check asserts about its target list column.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The list has at least one element.
    ListNonEmpty,
    /// Per-element predicate reduced with an aggregate.
    Elements {
        predicate: ElementPredicate,
        aggregate: Aggregate,
    },
    /// The maximum of a numeric element field is strictly below a scalar
    /// column of the same row. Passes when either side is unknown.
    MaxFieldBelowColumn { field: String, than: String },
}

/// A named, pure validation rule over one table column.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub column: String,
    pub guards: Vec<Guard>,
    pub rule: Rule,
}

impl Check {
    pub fn new(name: impl Into<String>, column: impl Into<String>, rule: Rule) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            guards: Vec::new(),
            rule,
        }
    }

    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }
}

// =============================================================================
// Failure reporting
// =============================================================================

/// One failing (row, check) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub column: String,
    pub check: String,
    pub row_key: String,
    /// Bounded, best-effort summary of the offending value.
    pub value: Option<String>,
}

/// Deduplicated view of the failures of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub column: String,
    pub check: String,
    pub row_keys: Vec<String>,
    pub sample_value: Option<String>,
}

/// Outcome of one validation run. Computed once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub failures: Vec<FailureRecord>,
}

impl ValidationReport {
    /// Group failures by `(column, check)` in first-seen order, keeping the
    /// full list of offending row keys and one representative value per
    /// entry. Callers wanting row-level granularity read `failures` instead.
    pub fn summary(&self) -> Vec<CheckSummary> {
        let mut order: Vec<CheckSummary> = Vec::new();
        let mut seen: HashMap<(String, String), usize> = HashMap::new();
        for failure in &self.failures {
            let key = (failure.column.clone(), failure.check.clone());
            let slot = *seen.entry(key).or_insert_with(|| {
                order.push(CheckSummary {
                    column: failure.column.clone(),
                    check: failure.check.clone(),
                    row_keys: Vec::new(),
                    sample_value: None,
                });
                order.len() - 1
            });
            let entry = &mut order[slot];
            if !entry.row_keys.contains(&failure.row_key) {
                entry.row_keys.push(failure.row_key.clone());
            }
            if entry.sample_value.is_none() {
                entry.sample_value = failure.value.clone();
            }
        }
        order
    }
}

// =============================================================================
// Table schema declaration + interpreter
// =============================================================================

/// Declarative schema for one table: a row-key column, scalar field rules,
/// and named checks. Evaluation runs every rule against the same immutable
/// table and produces a consolidated report; it only errors when the
/// declaration itself is broken (engine error), never because data is bad.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub key: String,
    pub fields: Vec<FieldRule>,
    pub checks: Vec<Check>,
}

impl TableSchema {
    pub fn validate(&self, table: &Table) -> ValidateResult<ValidationReport> {
        table.schema().index_of(&self.key)?;

        let mut failures = Vec::new();
        for rule in &self.fields {
            self.eval_field_rule(table, rule, &mut failures)?;
        }
        for check in &self.checks {
            self.eval_check(table, check, &mut failures)?;
        }
        Ok(ValidationReport {
            passed: failures.is_empty(),
            failures,
        })
    }

    fn row_key(&self, table: &Table, row: usize) -> String {
        table
            .value(row, &self.key)
            .ok()
            .and_then(key_of)
            .unwrap_or_else(|| format!("row{row}"))
    }

    fn eval_field_rule(
        &self,
        table: &Table,
        rule: &FieldRule,
        failures: &mut Vec<FailureRecord>,
    ) -> ValidateResult<()> {
        table.schema().index_of(&rule.column)?;

        // table-wide uniqueness needs a first pass over all rows
        let mut counts: HashMap<String, usize> = HashMap::new();
        if rule.unique {
            for row in table.iter() {
                if let Some(k) = row.get(&rule.column).and_then(key_of) {
                    *counts.entry(k).or_insert(0) += 1;
                }
            }
        }

        for i in 0..table.len() {
            let value = table.value(i, &rule.column)?;
            let fail = |check: String, failures: &mut Vec<FailureRecord>| {
                failures.push(FailureRecord {
                    column: rule.column.clone(),
                    check,
                    row_key: self.row_key(table, i),
                    value: Some(summarize_value(value)),
                });
            };

            if value.is_null() {
                if !rule.nullable {
                    fail("not_null".into(), failures);
                }
                continue;
            }
            if rule.unique {
                if let Some(k) = key_of(value) {
                    if counts.get(&k).copied().unwrap_or(0) > 1 {
                        fail("unique".into(), failures);
                    }
                }
            }
            if let Some(min) = rule.min_len {
                if value.as_str().is_some_and(|s| s.chars().count() < min) {
                    fail(format!("min_length({min})"), failures);
                }
            }
            if let Some(x) = value.as_f64() {
                if rule.ge.is_some_and(|b| x < b) {
                    fail(format!("ge({})", fmt_bound(rule.ge)), failures);
                }
                if rule.gt.is_some_and(|b| x <= b) {
                    fail(format!("gt({})", fmt_bound(rule.gt)), failures);
                }
                if rule.le.is_some_and(|b| x > b) {
                    fail(format!("le({})", fmt_bound(rule.le)), failures);
                }
                if rule.lt.is_some_and(|b| x >= b) {
                    fail(format!("lt({})", fmt_bound(rule.lt)), failures);
                }
            }
        }
        Ok(())
    }

    fn eval_check(
        &self,
        table: &Table,
        check: &Check,
        failures: &mut Vec<FailureRecord>,
    ) -> ValidateResult<()> {
        // Declaration errors surface before the row loop, as engine errors.
        let ty = table.schema().column_type(&check.column)?;
        if !ty.is_list() {
            return Err(ValidateError::NotAList {
                check: check.name.clone(),
                column: check.column.clone(),
            });
        }
        for guard in &check.guards {
            table.schema().index_of(guard.column())?;
        }
        if let Rule::MaxFieldBelowColumn { than, .. } = &check.rule {
            table.schema().index_of(than)?;
        }

        for i in 0..table.len() {
            let row = table.row(i);
            if !check.guards.iter().all(|g| g.holds(row)) {
                continue;
            }
            if let Some(value) = eval_rule(check, row) {
                failures.push(FailureRecord {
                    column: check.column.clone(),
                    check: check.name.clone(),
                    row_key: self.row_key(table, i),
                    value: Some(value),
                });
            }
        }
        Ok(())
    }
}

/// Evaluate one rule for one row. `None` is a pass; `Some` carries the
/// bounded failure-value summary.
fn eval_rule(check: &Check, row: RowRef<'_>) -> Option<String> {
    let cell = row.get(&check.column);
    let elements: &[Value] = cell
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    match &check.rule {
        Rule::ListNonEmpty => {
            if elements.is_empty() {
                Some("0 elements".to_string())
            } else {
                None
            }
        }
        Rule::Elements {
            predicate,
            aggregate,
        } => match aggregate {
            Aggregate::All => {
                let offending: Vec<&Value> =
                    elements.iter().filter(|e| !predicate.eval(e)).collect();
                if offending.is_empty() {
                    None
                } else {
                    Some(summarize_offending(predicate.field(), &offending))
                }
            }
            Aggregate::Any => {
                if elements.iter().any(|e| predicate.eval(e)) {
                    None
                } else {
                    Some(format!("no matching element among {}", elements.len()))
                }
            }
            Aggregate::CountEq(expected) => {
                let count = elements.iter().filter(|e| predicate.eval(e)).count();
                if count == *expected {
                    None
                } else {
                    Some(format!("{count} matching elements, expected {expected}"))
                }
            }
        },
        Rule::MaxFieldBelowColumn { field, than } => {
            let max = elements
                .iter()
                .filter_map(|e| e.get(field).and_then(Value::as_f64))
                .fold(None::<f64>, |acc, x| Some(acc.map_or(x, |m| m.max(x))));
            let limit = row.get(than).and_then(Value::as_f64);
            match (max, limit) {
                (Some(m), Some(l)) if m >= l => {
                    Some(truncate(format!("max {field} {m} is not before {than} {l}")))
                }
                _ => None,
            }
        }
    }
}

// =============================================================================
// Bounded value summaries
// =============================================================================

/// Render a cell for the failure report without ever serializing a nested
/// value into a scalar cell: lists and structs collapse to placeholders and
/// everything is length-capped.
fn summarize_value(value: &Value) -> String {
    let s = match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(a) => format!("<list of {}>", a.len()),
        Value::Object(_) => "<struct>".to_string(),
    };
    truncate(s)
}

fn summarize_offending(field: &str, offending: &[&Value]) -> String {
    let parts: Vec<String> = offending
        .iter()
        .map(|e| summarize_value(e.get(field).unwrap_or(&Value::Null)))
        .collect();
    truncate(parts.join(", "))
}

fn truncate(s: String) -> String {
    if s.chars().count() <= MAX_SUMMARY_LEN {
        s
    } else {
        let mut out: String = s.chars().take(MAX_SUMMARY_LEN).collect();
        out.push('…');
        out
    }
}

fn fmt_bound(bound: Option<f64>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_default()
}

// =============================================================================
// Static schema for the enriched objects table
// =============================================================================

/// Schema declaration for the transform output, fixed at startup.
pub static OBJECT_SCHEMA: Lazy<TableSchema> = Lazy::new(object_schema);

/// Build the declarative schema validated by the blocking check of the
/// object pipeline.
pub fn object_schema() -> TableSchema {
    let https = Regex::new("^https://").expect("static pattern");
    TableSchema {
        key: "id".to_string(),
        fields: vec![
            FieldRule::new("id").not_null().unique(),
            FieldRule::new("title").not_null().min_len(1),
            FieldRule::new("date").ge(0.0).le(2100.0),
            FieldRule::new("credit").not_null(),
            FieldRule::new("department").not_null(),
        ],
        checks: vec![
            Check::new(
                "has_at_least_one_constituent",
                "constituents",
                Rule::ListNonEmpty,
            ),
            Check::new("has_at_least_one_image", "media", Rule::ListNonEmpty),
            Check::new(
                "all_dimension_values_gt_1",
                "dimensions",
                Rule::Elements {
                    predicate: ElementPredicate::FieldGt("value".into(), 1.0),
                    aggregate: Aggregate::All,
                },
            ),
            Check::new(
                "has_height_dimension",
                "dimensions",
                Rule::Elements {
                    predicate: ElementPredicate::FieldEq("type".into(), json!("height")),
                    aggregate: Aggregate::Any,
                },
            ),
            Check::new(
                "all_units_are_cm",
                "dimensions",
                Rule::Elements {
                    predicate: ElementPredicate::FieldEq("unit".into(), json!("cm")),
                    aggregate: Aggregate::All,
                },
            ),
            Check::new(
                "all_urls_are_https",
                "media",
                Rule::Elements {
                    predicate: ElementPredicate::FieldMatches("url".into(), https),
                    aggregate: Aggregate::All,
                },
            ),
            Check::new(
                "has_primary_image",
                "media",
                Rule::Elements {
                    predicate: ElementPredicate::FieldEq("type".into(), json!("primary")),
                    aggregate: Aggregate::CountEq(1),
                },
            ),
            Check::new(
                "no_empty_constituent_names",
                "constituents",
                Rule::Elements {
                    predicate: ElementPredicate::FieldStrNonEmpty("name".into()),
                    aggregate: Aggregate::All,
                },
            )
            .guarded(Guard::ListNonEmpty("constituents".into())),
            // Unguarded on purpose: an object with no constituents cannot
            // have an artist, so an empty list fails.
            Check::new(
                "has_at_least_one_artist",
                "constituents",
                Rule::Elements {
                    predicate: ElementPredicate::FieldEq("role".into(), json!("artist")),
                    aggregate: Aggregate::Any,
                },
            ),
            Check::new(
                "no_null_labels_in_classifications",
                "classifications",
                Rule::Elements {
                    predicate: ElementPredicate::FieldNotNull("term_label".into()),
                    aggregate: Aggregate::All,
                },
            )
            .guarded(Guard::ListNonEmpty("classifications".into())),
            Check::new(
                "sculpture_must_have_depth",
                "dimensions",
                Rule::Elements {
                    predicate: ElementPredicate::FieldEq("type".into(), json!("depth")),
                    aggregate: Aggregate::Any,
                },
            )
            .guarded(Guard::ColumnEquals("department".into(), json!("Sculpture"))),
            Check::new(
                "constituent_born_before_artwork",
                "constituents",
                Rule::MaxFieldBelowColumn {
                    field: "birth_year".into(),
                    than: "date".into(),
                },
            )
            .guarded(Guard::ColumnNotNull("date".into())),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{enrich_objects, Lookup};
    use crate::harvest::{harvest_objects, harvest_terminology, samples};

    fn enriched() -> Table {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        let terms =
            Lookup::new(harvest_terminology(samples::TERMINOLOGY).unwrap(), "key").unwrap();
        enrich_objects(&objects, &terms).unwrap()
    }

    fn has_failure(report: &ValidationReport, check: &str, row_key: &str) -> bool {
        report
            .failures
            .iter()
            .any(|f| f.check == check && f.row_key == row_key)
    }

    #[test]
    fn test_scenario_a_missing_constituents() {
        let report = OBJECT_SCHEMA.validate(&enriched()).unwrap();
        assert!(!report.passed);
        assert!(has_failure(&report, "has_at_least_one_constituent", "OBJ-003"));
        assert!(has_failure(&report, "has_at_least_one_artist", "OBJ-003"));
    }

    #[test]
    fn test_scenario_b_offending_dimension_value() {
        let report = OBJECT_SCHEMA.validate(&enriched()).unwrap();
        let failure = report
            .failures
            .iter()
            .find(|f| f.check == "all_dimension_values_gt_1" && f.row_key == "OBJ-005")
            .expect("OBJ-005 dimension failure");
        assert_eq!(failure.column, "dimensions");
        assert_eq!(failure.value.as_deref(), Some("0.5"));
    }

    #[test]
    fn test_guard_short_circuits_on_empty_list() {
        // OBJ-003 has no constituents; the guarded name check must pass.
        let report = OBJECT_SCHEMA.validate(&enriched()).unwrap();
        assert!(!has_failure(&report, "no_empty_constituent_names", "OBJ-003"));
    }

    #[test]
    fn test_clean_rows_pass_every_check() {
        let clean = enriched().filter(|r| {
            let id = r.get("id").and_then(Value::as_str).unwrap_or_default();
            id != "OBJ-003" && id != "OBJ-005"
        });
        let report = OBJECT_SCHEMA.validate(&clean).unwrap();
        assert!(report.passed, "unexpected failures: {:?}", report.failures);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_check_order_independence() {
        let table = enriched();
        let declared = OBJECT_SCHEMA.validate(&table).unwrap();

        let mut permuted_schema = object_schema();
        permuted_schema.checks.reverse();
        let permuted = permuted_schema.validate(&table).unwrap();

        let mut a: Vec<_> = declared
            .failures
            .iter()
            .map(|f| (f.column.clone(), f.check.clone(), f.row_key.clone()))
            .collect();
        let mut b: Vec<_> = permuted
            .failures
            .iter()
            .map(|f| (f.column.clone(), f.check.clone(), f.row_key.clone()))
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_dedups_and_keeps_row_keys() {
        let report = OBJECT_SCHEMA.validate(&enriched()).unwrap();
        let summary = report.summary();
        let dimension_entry = summary
            .iter()
            .find(|s| s.check == "all_dimension_values_gt_1")
            .unwrap();
        assert_eq!(dimension_entry.row_keys, vec!["OBJ-005".to_string()]);
        assert_eq!(dimension_entry.sample_value.as_deref(), Some("0.5"));

        // one summary entry per (column, check)
        let mut keys: Vec<_> = summary
            .iter()
            .map(|s| (s.column.clone(), s.check.clone()))
            .collect();
        let before = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn test_unique_field_rule() {
        let schema = TableSchema {
            key: "id".into(),
            fields: vec![FieldRule::new("id").not_null().unique()],
            checks: vec![],
        };
        let table = Table::from_records(
            crate::table::Schema::new().with("id", crate::table::ColumnType::Str),
            &[json!({"id": "A"}), json!({"id": "A"}), json!({"id": "B"})],
        )
        .unwrap();
        let report = schema.validate(&table).unwrap();
        assert!(!report.passed);
        assert_eq!(
            report.failures.iter().filter(|f| f.check == "unique").count(),
            2
        );
    }

    #[test]
    fn test_date_bounds() {
        let schema = TableSchema {
            key: "id".into(),
            fields: vec![FieldRule::new("date").ge(0.0).le(2100.0)],
            checks: vec![],
        };
        let table = Table::from_records(
            crate::table::Schema::new()
                .with("id", crate::table::ColumnType::Str)
                .with("date", crate::table::ColumnType::Int),
            &[
                json!({"id": "A", "date": 2500}),
                json!({"id": "B", "date": null}),
                json!({"id": "C", "date": 1900}),
            ],
        )
        .unwrap();
        let report = schema.validate(&table).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].check, "le(2100)");
        assert_eq!(report.failures[0].row_key, "A");
    }

    #[test]
    fn test_check_on_scalar_column_is_engine_error() {
        let schema = TableSchema {
            key: "id".into(),
            fields: vec![],
            checks: vec![Check::new("bogus", "id", Rule::ListNonEmpty)],
        };
        let err = schema.validate(&enriched()).unwrap_err();
        assert!(matches!(err, ValidateError::NotAList { .. }));
    }

    #[test]
    fn test_unknown_column_is_engine_error() {
        let schema = TableSchema {
            key: "id".into(),
            fields: vec![FieldRule::new("nonexistent")],
            checks: vec![],
        };
        let err = schema.validate(&enriched()).unwrap_err();
        assert!(matches!(err, ValidateError::Table(_)));
    }

    #[test]
    fn test_summaries_are_bounded() {
        let long = "x".repeat(500);
        assert_eq!(summarize_value(&json!(long)).chars().count(), MAX_SUMMARY_LEN + 1);
        assert_eq!(summarize_value(&json!([1, 2, 3])), "<list of 3>");
        assert_eq!(summarize_value(&json!({"a": 1})), "<struct>");
    }

    #[test]
    fn test_cross_column_check() {
        let report = OBJECT_SCHEMA.validate(&enriched()).unwrap();
        // All sample birth years predate their artwork dates.
        assert!(!report
            .failures
            .iter()
            .any(|f| f.check == "constituent_born_before_artwork"));

        // Flip one: artist born after the artwork date.
        let schema = crate::harvest::objects_schema();
        let bad = Table::from_records(
            schema,
            &[json!({
                "id": "OBJ-X", "title": "T", "date": 1800, "credit": "c", "department": "d",
                "constituents": [
                    {"name": "N", "role": "artist", "birth_year": 1900, "nationality_id": "NAT-NL"}
                ]
            })],
        )
        .unwrap();
        let check_schema = TableSchema {
            key: "id".into(),
            fields: vec![],
            checks: vec![Check::new(
                "constituent_born_before_artwork",
                "constituents",
                Rule::MaxFieldBelowColumn {
                    field: "birth_year".into(),
                    than: "date".into(),
                },
            )
            .guarded(Guard::ColumnNotNull("date".into()))],
        };
        let report = check_schema.validate(&bad).unwrap();
        assert!(has_failure(&report, "constituent_born_before_artwork", "OBJ-X"));
    }
}
