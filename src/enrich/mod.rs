//! Lookup Enricher: resolve foreign keys inside nested list columns.
//!
//! The enrichment of one nested column is a fixed six-step plan, composed
//! entirely from pure table operations:
//!
//! ```text
//! filter non-empty → explode → unnest → left-join lookup(s)
//!                                 → pack kept fields → collect by owner id
//! ```
//!
//! The re-nested result is then joined back onto the original table by owner
//! id with a left join, and null results (rows that had no elements) are
//! replaced with empty lists. A left join is deliberate: an unresolvable key
//! keeps its element with a null label, so enrichment failures surface as
//! validation failures instead of silently dropped records.

use crate::error::{TableError, TableResult};
use crate::table::{key_of, Table};

// =============================================================================
// Lookup
// =============================================================================

/// A table joined by a unique scalar key to resolve references to labels.
///
/// Key uniqueness is validated up front; joining against a lookup with
/// duplicate keys would be ambiguous, so construction fails fast instead.
#[derive(Debug)]
pub struct Lookup {
    table: Table,
    key: String,
}

impl Lookup {
    pub fn new(table: Table, key: &str) -> TableResult<Self> {
        table.schema().index_of(key)?;
        let mut seen = std::collections::HashSet::new();
        for row in table.iter() {
            if let Some(k) = row.get(key).and_then(key_of) {
                if !seen.insert(k.clone()) {
                    return Err(TableError::AmbiguousKey {
                        column: key.to_string(),
                        key: k,
                    });
                }
            }
        }
        Ok(Self {
            table,
            key: key.to_string(),
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Project the lookup into a join-ready `(key, label)` table under new
    /// column names. One lookup used under two key roles becomes two
    /// differently-keyed projections.
    pub fn project(&self, columns: &[(&str, &str)]) -> TableResult<Table> {
        self.table.select_as(columns)
    }

    /// Restrict the lookup to rows whose discriminator column equals
    /// `value` (e.g. the `nationality` partition of a terminology table).
    pub fn partition(&self, column: &str, value: &str) -> TableResult<Lookup> {
        self.table.schema().index_of(column)?;
        let filtered = self
            .table
            .filter(|r| r.get(column).and_then(|v| v.as_str()) == Some(value));
        Ok(Lookup {
            table: filtered,
            key: self.key.clone(),
        })
    }
}

// =============================================================================
// Nested join
// =============================================================================

/// Enrich one nested list column of `source` against lookup projections.
///
/// Returns a two-column table `(id, out)` where `out` is a list-of-struct
/// column holding, per owner row, the `keep` fields of every exploded and
/// joined element, in source element order. Owner rows whose list was empty
/// do not appear; the caller restores them when joining back.
pub fn nested_join(
    source: &Table,
    id: &str,
    list_col: &str,
    joins: &[(&Table, &str)],
    keep: &[&str],
    out: &str,
) -> TableResult<Table> {
    let mut flat = source
        .select(&[id, list_col])?
        .filter(|r| r.list_len(list_col) > 0)
        .explode(list_col)?
        .unnest(list_col)?;

    for (lookup, on) in joins {
        flat = flat.left_join(lookup, on)?;
    }

    flat.pack(keep, out)?.collect_by(id, out)
}

/// Enrich harvested objects with terminology labels.
///
/// - `classification_refs` becomes `classifications {type_label, term_label}`
///   by joining the same terminology lookup under two key roles.
/// - `constituents` gains a resolved `nationality` label from the
///   terminology's `nationality` partition.
/// - `dimensions` and `media` pass through untouched.
///
/// The output row order matches the input row order, and every nested column
/// of the output is a list (empty for rows without elements), never null.
pub fn enrich_objects(objects: &Table, terminology: &Lookup) -> TableResult<Table> {
    let type_labels = terminology.project(&[("key", "type_id"), ("label", "type_label")])?;
    let term_labels = terminology.project(&[("key", "term_id"), ("label", "term_label")])?;
    let classifications = nested_join(
        objects,
        "id",
        "classification_refs",
        &[(&type_labels, "type_id"), (&term_labels, "term_id")],
        &["type_label", "term_label"],
        "classifications",
    )?;

    let nationalities = terminology
        .partition("type", "nationality")?
        .project(&[("key", "nationality_id"), ("label", "nationality")])?;
    let constituents = nested_join(
        objects,
        "id",
        "constituents",
        &[(&nationalities, "nationality_id")],
        &["name", "role", "birth_year", "nationality"],
        "constituents",
    )?;

    objects
        .select(&[
            "id",
            "title",
            "date",
            "credit",
            "department",
            "dimensions",
            "media",
        ])?
        .left_join(&classifications, "id")?
        .fill_list_null("classifications")?
        .left_join(&constituents, "id")?
        .fill_list_null("constituents")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::{harvest_objects, harvest_terminology, samples};
    use serde_json::{json, Value};

    fn terminology() -> Lookup {
        Lookup::new(harvest_terminology(samples::TERMINOLOGY).unwrap(), "key").unwrap()
    }

    fn enriched() -> Table {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        enrich_objects(&objects, &terminology()).unwrap()
    }

    #[test]
    fn test_join_completeness() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        let out = enrich_objects(&objects, &terminology()).unwrap();

        assert_eq!(out.len(), objects.len());
        for i in 0..objects.len() {
            assert_eq!(
                out.value(i, "classifications").unwrap().as_array().unwrap().len(),
                objects
                    .value(i, "classification_refs")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .len(),
            );
            assert_eq!(
                out.value(i, "constituents").unwrap().as_array().unwrap().len(),
                objects.value(i, "constituents").unwrap().as_array().unwrap().len(),
            );
        }
    }

    #[test]
    fn test_labels_resolved() {
        let out = enriched();
        let classifications = out.value(0, "classifications").unwrap().as_array().unwrap();
        assert_eq!(classifications[0]["type_label"], "Object Type");
        assert_eq!(classifications[0]["term_label"], "Painting");

        let constituents = out.value(0, "constituents").unwrap().as_array().unwrap();
        assert_eq!(constituents[0]["name"], "Hendrik Vermeulen");
        assert_eq!(constituents[0]["nationality"], "Dutch");
    }

    #[test]
    fn test_empty_list_invariant() {
        let out = enriched();
        let obj3 = out.filter(|r| r.get("id").and_then(Value::as_str) == Some("OBJ-003"));
        assert_eq!(obj3.value(0, "constituents").unwrap(), &json!([]));
    }

    #[test]
    fn test_unmatched_key_keeps_element_with_null_label() {
        let objects = harvest_objects(
            r#"[{
                "id": "OBJ-404", "title": "Orphan", "credit": "x", "department": "y",
                "classification_refs": [{"type_id": "CT-OBJECT", "term_id": "TERM-NOPE"}]
            }]"#,
        )
        .unwrap();
        let out = enrich_objects(&objects, &terminology()).unwrap();
        let classifications = out.value(0, "classifications").unwrap().as_array().unwrap();
        assert_eq!(classifications.len(), 1);
        assert_eq!(classifications[0]["type_label"], "Object Type");
        assert_eq!(classifications[0]["term_label"], Value::Null);
    }

    #[test]
    fn test_idempotence() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        let terms = terminology();
        let first = enrich_objects(&objects, &terms).unwrap();
        let second = enrich_objects(&objects, &terms).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_order_matches_input_order() {
        let objects = harvest_objects(samples::OBJECTS).unwrap();
        let out = enrich_objects(&objects, &terminology()).unwrap();
        for i in 0..objects.len() {
            assert_eq!(out.value(i, "id").unwrap(), objects.value(i, "id").unwrap());
        }
    }

    #[test]
    fn test_duplicate_lookup_key_fails_fast() {
        let table = harvest_terminology(
            r#"[
                {"key": "NAT-NL", "type": "nationality", "label": "Dutch"},
                {"key": "NAT-NL", "type": "nationality", "label": "Netherlandish"}
            ]"#,
        )
        .unwrap();
        let err = Lookup::new(table, "key").unwrap_err();
        assert!(matches!(err, TableError::AmbiguousKey { key, .. } if key == "NAT-NL"));
    }

    #[test]
    fn test_partition_filters_by_discriminator() {
        let nationalities = terminology().partition("type", "nationality").unwrap();
        assert_eq!(nationalities.table().len(), 3);
    }
}
