//! In-memory tabular value model with nested list-of-struct columns.
//!
//! A [`Table`] is an ordered sequence of rows sharing one [`Schema`]. Cell
//! values are `serde_json::Value`, constrained on write to the declared
//! [`ColumnType`]. Nested data is first-class: a column may hold a list of
//! fixed-shape structs, and the model provides the explode / unnest / pack /
//! collect operations the enricher composes.
//!
//! All operations are pure: input tables are never mutated, each operation
//! returns a new `Table`. Row order is always preserved, so fan-out followed
//! by fan-in is deterministic.
//!
//! # Invariants
//!
//! - Every row has exactly the schema's columns, in schema order.
//! - An absent nested collection is an empty list, never null.
//! - `Struct` columns exist only between `explode` and `unnest`/`pack`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::error::{TableError, TableResult};

// =============================================================================
// Column Types
// =============================================================================

/// Scalar type of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
}

/// A named field inside a list-of-struct or struct column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Declared type of a table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    Str,
    Int,
    Float,
    Bool,
    /// Ordered sequence of fixed-shape records; length varies per row.
    List { fields: Vec<Field> },
    /// A single fixed-shape record. Intermediate type produced by `explode`.
    Struct { fields: Vec<Field> },
}

impl ColumnType {
    /// Scalar field type, if this is a scalar column.
    pub fn scalar_type(&self) -> Option<FieldType> {
        match self {
            ColumnType::Str => Some(FieldType::Str),
            ColumnType::Int => Some(FieldType::Int),
            ColumnType::Float => Some(FieldType::Float),
            ColumnType::Bool => Some(FieldType::Bool),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ColumnType::List { .. })
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Str => "string",
            ColumnType::Int => "integer",
            ColumnType::Float => "float",
            ColumnType::Bool => "boolean",
            ColumnType::List { .. } => "list",
            ColumnType::Struct { .. } => "struct",
        }
    }
}

impl From<FieldType> for ColumnType {
    fn from(ty: FieldType) -> Self {
        match ty {
            FieldType::Str => ColumnType::Str,
            FieldType::Int => ColumnType::Int,
            FieldType::Float => ColumnType::Float,
            FieldType::Bool => ColumnType::Bool,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Ordered mapping from column name to column type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column declaration.
    pub fn with(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push(Column {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Position of a column, or `UnknownColumn`.
    pub fn index_of(&self, name: &str) -> TableResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn column_type(&self, name: &str) -> TableResult<&ColumnType> {
        Ok(&self.columns[self.index_of(name)?].ty)
    }

    fn push(&mut self, column: Column) {
        self.columns.push(column);
    }
}

// =============================================================================
// Table
// =============================================================================

/// An immutable table: ordered rows sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one row, with access by column name.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.table.schema.index_of(column).ok()?;
        Some(&self.table.rows[self.index][idx])
    }

    /// Length of a list cell; null and non-list cells count as empty.
    pub fn list_len(&self, column: &str) -> usize {
        self.get(column)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

impl Table {
    /// Create an empty table with the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Construct a table from per-row JSON records (schema-on-write).
    ///
    /// Records may be irregular: missing scalars become null, missing nested
    /// collections become empty lists, undeclared fields are dropped. A value
    /// that cannot be coerced to the declared type is a `ValueType` error.
    pub fn from_records(schema: Schema, records: &[Value]) -> TableResult<Self> {
        let mut rows = Vec::with_capacity(records.len());
        for (row_idx, record) in records.iter().enumerate() {
            let obj = record.as_object();
            let mut row = Vec::with_capacity(schema.columns.len());
            for column in &schema.columns {
                let value = obj.and_then(|o| o.get(&column.name));
                row.push(coerce_cell(value, column, row_idx)?);
            }
            rows.push(row);
        }
        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> RowRef<'_> {
        RowRef { table: self, index }
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    /// Cell value at (row, column).
    pub fn value(&self, row: usize, column: &str) -> TableResult<&Value> {
        let idx = self.schema.index_of(column)?;
        Ok(&self.rows[row][idx])
    }

    /// Rows as JSON objects, one per row, lists rendered as nested arrays.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (column, cell) in self.schema.columns.iter().zip(row) {
                    obj.insert(column.name.clone(), cell.clone());
                }
                Value::Object(obj)
            })
            .collect()
    }

    /// Project a subset of columns.
    pub fn select(&self, columns: &[&str]) -> TableResult<Table> {
        let pairs: Vec<(&str, &str)> = columns.iter().map(|c| (*c, *c)).collect();
        self.select_as(&pairs)
    }

    /// Project columns under new names: `(source, target)` pairs.
    pub fn select_as(&self, columns: &[(&str, &str)]) -> TableResult<Table> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut schema = Schema::new();
        for (source, target) in columns {
            let idx = self.schema.index_of(source)?;
            if schema.has(target) {
                return Err(TableError::DuplicateColumn(target.to_string()));
            }
            schema.push(Column {
                name: target.to_string(),
                ty: self.schema.columns[idx].ty.clone(),
            });
            indices.push(idx);
        }
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table { schema, rows })
    }

    /// Keep only rows matching the predicate.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(RowRef<'_>) -> bool,
    {
        let rows = (0..self.rows.len())
            .filter(|&i| predicate(self.row(i)))
            .map(|i| self.rows[i].clone())
            .collect();
        Table {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Expand a list column: one output row per element, all other columns
    /// carried unchanged. Rows whose list is empty are dropped. The list
    /// column becomes a struct column.
    pub fn explode(&self, column: &str) -> TableResult<Table> {
        let idx = self.schema.index_of(column)?;
        let fields = match &self.schema.columns[idx].ty {
            ColumnType::List { fields } => fields.clone(),
            _ => {
                return Err(TableError::TypeMismatch {
                    column: column.to_string(),
                    expected: "list",
                })
            }
        };

        let mut schema = self.schema.clone();
        schema.columns[idx].ty = ColumnType::Struct { fields };

        let mut rows = Vec::new();
        for row in &self.rows {
            let elements = row[idx].as_array().cloned().unwrap_or_default();
            for element in elements {
                let mut out = row.clone();
                out[idx] = element;
                rows.push(out);
            }
        }
        Ok(Table { schema, rows })
    }

    /// Turn a struct column into one column per field, in field order,
    /// spliced in at the struct column's position.
    pub fn unnest(&self, column: &str) -> TableResult<Table> {
        let idx = self.schema.index_of(column)?;
        let fields = match &self.schema.columns[idx].ty {
            ColumnType::Struct { fields } => fields.clone(),
            _ => {
                return Err(TableError::TypeMismatch {
                    column: column.to_string(),
                    expected: "struct",
                })
            }
        };

        let mut schema = Schema::new();
        for (i, col) in self.schema.columns.iter().enumerate() {
            if i == idx {
                for field in &fields {
                    if self.schema.has(&field.name) || schema.has(&field.name) {
                        return Err(TableError::DuplicateColumn(field.name.clone()));
                    }
                    schema.push(Column {
                        name: field.name.clone(),
                        ty: field.ty.into(),
                    });
                }
            } else {
                schema.push(col.clone());
            }
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(schema.columns.len());
                for (i, cell) in row.iter().enumerate() {
                    if i == idx {
                        let obj = cell.as_object();
                        for field in &fields {
                            out.push(
                                obj.and_then(|o| o.get(&field.name))
                                    .cloned()
                                    .unwrap_or(Value::Null),
                            );
                        }
                    } else {
                        out.push(cell.clone());
                    }
                }
                out
            })
            .collect();
        Ok(Table { schema, rows })
    }

    /// Inverse of [`unnest`](Self::unnest): fold the named scalar columns
    /// into one struct column appended after the remaining columns.
    pub fn pack(&self, columns: &[&str], out: &str) -> TableResult<Table> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut fields = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self.schema.index_of(name)?;
            let ty = self.schema.columns[idx]
                .ty
                .scalar_type()
                .ok_or_else(|| TableError::TypeMismatch {
                    column: name.to_string(),
                    expected: "scalar",
                })?;
            indices.push(idx);
            fields.push(Field::new(*name, ty));
        }

        let mut schema = Schema::new();
        for (i, col) in self.schema.columns.iter().enumerate() {
            if !indices.contains(&i) {
                schema.push(col.clone());
            }
        }
        if schema.has(out) {
            return Err(TableError::DuplicateColumn(out.to_string()));
        }
        let kept: Vec<usize> = (0..self.schema.columns.len())
            .filter(|i| !indices.contains(i))
            .collect();
        schema.push(Column {
            name: out.to_string(),
            ty: ColumnType::Struct {
                fields: fields.clone(),
            },
        });

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (&idx, field) in indices.iter().zip(&fields) {
                    obj.insert(field.name.clone(), row[idx].clone());
                }
                let mut out_row: Vec<Value> = kept.iter().map(|&i| row[i].clone()).collect();
                out_row.push(Value::Object(obj));
                out_row
            })
            .collect();
        Ok(Table { schema, rows })
    }

    /// Re-nest: group rows by a key column and collect the struct column's
    /// values into a list, one output row per distinct key. Groups appear in
    /// first-seen order; elements keep the order they were encountered in.
    pub fn collect_by(&self, key: &str, struct_col: &str) -> TableResult<Table> {
        let key_idx = self.schema.index_of(key)?;
        let val_idx = self.schema.index_of(struct_col)?;
        let fields = match &self.schema.columns[val_idx].ty {
            ColumnType::Struct { fields } => fields.clone(),
            _ => {
                return Err(TableError::TypeMismatch {
                    column: struct_col.to_string(),
                    expected: "struct",
                })
            }
        };

        let schema = Schema::new()
            .with(key, self.schema.columns[key_idx].ty.clone())
            .with(struct_col, ColumnType::List { fields });

        let mut order: Vec<(Value, Vec<Value>)> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for row in &self.rows {
            let Some(k) = key_of(&row[key_idx]) else {
                continue;
            };
            let slot = *seen.entry(k).or_insert_with(|| {
                order.push((row[key_idx].clone(), Vec::new()));
                order.len() - 1
            });
            order[slot].1.push(row[val_idx].clone());
        }

        let rows = order
            .into_iter()
            .map(|(k, elements)| vec![k, Value::Array(elements)])
            .collect();
        Ok(Table { schema, rows })
    }

    /// Left join on a scalar key column. Every left row is retained;
    /// unmatched keys fill the right-hand columns with null. Duplicate keys
    /// on the right side are ambiguous and rejected.
    pub fn left_join(&self, right: &Table, on: &str) -> TableResult<Table> {
        let left_idx = self.schema.index_of(on)?;
        let right_idx = right.schema.index_of(on)?;

        let mut schema = self.schema.clone();
        let carried: Vec<usize> = (0..right.schema.columns.len())
            .filter(|&i| i != right_idx)
            .collect();
        for &i in &carried {
            let col = &right.schema.columns[i];
            if schema.has(&col.name) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
            schema.push(col.clone());
        }

        let mut index: HashMap<String, usize> = HashMap::with_capacity(right.len());
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(k) = key_of(&row[right_idx]) {
                if index.insert(k.clone(), i).is_some() {
                    return Err(TableError::AmbiguousKey {
                        column: on.to_string(),
                        key: k,
                    });
                }
            }
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                match key_of(&row[left_idx]).and_then(|k| index.get(&k)) {
                    Some(&r) => {
                        for &i in &carried {
                            out.push(right.rows[r][i].clone());
                        }
                    }
                    None => out.extend(std::iter::repeat(Value::Null).take(carried.len())),
                }
                out
            })
            .collect();
        Ok(Table { schema, rows })
    }

    /// Replace null cells in a list column with empty lists, restoring the
    /// nested-column invariant after a left join.
    pub fn fill_list_null(&self, column: &str) -> TableResult<Table> {
        let idx = self.schema.index_of(column)?;
        if !self.schema.columns[idx].ty.is_list() {
            return Err(TableError::TypeMismatch {
                column: column.to_string(),
                expected: "list",
            });
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if out[idx].is_null() {
                    out[idx] = json!([]);
                }
                out
            })
            .collect();
        Ok(Table {
            schema: self.schema.clone(),
            rows,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// String form of a scalar cell used as a join or grouping key.
/// Null (and nested) cells have no key.
pub(crate) fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_cell(value: Option<&Value>, column: &Column, row: usize) -> TableResult<Value> {
    match &column.ty {
        ColumnType::List { fields } => match value {
            None | Some(Value::Null) => Ok(json!([])),
            Some(Value::Array(elements)) => {
                let coerced = elements
                    .iter()
                    .map(|el| coerce_struct(el, fields, &column.name, row))
                    .collect::<TableResult<Vec<_>>>()?;
                Ok(Value::Array(coerced))
            }
            Some(_) => Err(TableError::ValueType {
                row,
                column: column.name.clone(),
                expected: "list",
            }),
        },
        ColumnType::Struct { fields } => match value {
            None | Some(Value::Null) => Ok(Value::Null),
            Some(v) => coerce_struct(v, fields, &column.name, row),
        },
        scalar => {
            let v = value.unwrap_or(&Value::Null);
            // scalar_type is always Some here
            let ty = scalar.scalar_type().unwrap_or(FieldType::Str);
            coerce_scalar(v, ty).ok_or_else(|| TableError::ValueType {
                row,
                column: column.name.clone(),
                expected: scalar.type_name(),
            })
        }
    }
}

fn coerce_struct(
    value: &Value,
    fields: &[Field],
    column: &str,
    row: usize,
) -> TableResult<Value> {
    let obj = value.as_object().ok_or_else(|| TableError::ValueType {
        row,
        column: column.to_string(),
        expected: "struct",
    })?;
    let mut out = Map::new();
    for field in fields {
        let v = obj.get(&field.name).unwrap_or(&Value::Null);
        let coerced = coerce_scalar(v, field.ty).ok_or_else(|| TableError::ValueType {
            row,
            column: column.to_string(),
            expected: "struct",
        })?;
        out.insert(field.name.clone(), coerced);
    }
    Ok(Value::Object(out))
}

fn coerce_scalar(value: &Value, ty: FieldType) -> Option<Value> {
    match (ty, value) {
        (_, Value::Null) => Some(Value::Null),
        (FieldType::Str, Value::String(_)) => Some(value.clone()),
        (FieldType::Int, Value::Number(n)) if n.as_i64().is_some() => Some(value.clone()),
        (FieldType::Float, Value::Number(_)) => Some(value.clone()),
        (FieldType::Bool, Value::Bool(_)) => Some(value.clone()),
        _ => None,
    }
}
