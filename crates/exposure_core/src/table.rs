//! Tabular exposure results.
//!
//! An [`ExposureTable`] is a named column schema plus row-major cells. Tables
//! are treated as values: every transformation returns a new table and the
//! running aggregate is replaced rather than mutated in place.

use crate::error::{ExposureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column carrying the canonical measure name of each row.
pub const MEASURE_COL: &str = "Measure";

/// Canonical exposure value column.
pub const EXPOSURE_COL: &str = "Exposures_USD";

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value (column absent on one side of a concatenation)
    Null,
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
}

impl Cell {
    /// Numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// Row-wise exposure table.
///
/// A table with a schema but no rows is the representation of "no data";
/// it is still a well-formed table. Every row is as wide as the schema,
/// including tables read from serialised form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct ExposureTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

/// Unchecked wire form of [`ExposureTable`].
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

impl TryFrom<RawTable> for ExposureTable {
    type Error = ExposureError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::with_rows(raw.columns, raw.rows)
    }
}

impl ExposureTable {
    /// Create an empty table with the given schema.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from a schema and rows, checking every row's width.
    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ExposureError::schema(format!(
                "row has {} cells but table has {} columns ({})",
                row.len(),
                self.columns.len(),
                self.columns.join(", ")
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows (the schema may still be populated).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether the schema contains `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom. Empty if the column is absent.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| idx.map(|i| &row[i]))
    }

    /// Sum of the numeric cells of one column.
    pub fn sum_column(&self, name: &str) -> f64 {
        self.column(name).filter_map(Cell::as_f64).sum()
    }

    /// Same schema, no rows.
    pub fn empty_like(&self) -> Self {
        Self::new(self.columns.iter().cloned())
    }

    /// Rename column `from` to `to`. A no-op when `from` is absent.
    ///
    /// An existing column already named `to` is dropped, so the schema
    /// never holds the name twice.
    pub fn rename_column(mut self, from: &str, to: &str) -> Self {
        let Some(mut idx) = self.column_index(from) else {
            return self;
        };
        if from == to {
            return self;
        }
        if let Some(clash) = self.column_index(to) {
            self.columns.remove(clash);
            for row in &mut self.rows {
                row.remove(clash);
            }
            if clash < idx {
                idx -= 1;
            }
        }
        self.columns[idx] = to.to_string();
        self
    }

    /// Add (or overwrite) column `name` holding `value` on every row.
    pub fn extend_const(mut self, value: impl Into<Cell>, name: &str) -> Self {
        let value = value.into();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    /// Row-wise union of `self` followed by `other`.
    ///
    /// If either side has no rows the other side is returned unchanged
    /// (when both are empty, `self`'s schema wins unless it has none).
    /// When both sides have rows the schema is `self`'s columns followed by
    /// the columns only `other` has; cells absent on one side become
    /// [`Cell::Null`].
    pub fn concat(&self, other: &ExposureTable) -> ExposureTable {
        if other.is_empty() {
            if self.is_empty() && self.columns.is_empty() {
                return other.clone();
            }
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut columns = self.columns.clone();
        for c in &other.columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        for side in [self, other] {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| side.column_index(c)).collect();
            for row in &side.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map_or(Cell::Null, |i| row[i].clone()))
                        .collect(),
                );
            }
        }

        ExposureTable { columns, rows }
    }

    /// Rows as column-name keyed maps.
    pub fn records(&self) -> Vec<BTreeMap<&str, &Cell>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect()
    }
}

/// Raw per-measure fetch results for one (desk, source) run.
///
/// Holds exactly one entry per expected measure, including measures that
/// fetched no rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasureSnapshot {
    tables: BTreeMap<String, ExposureTable>,
}

impl MeasureSnapshot {
    /// Create an empty snapshot map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the table fetched for `measure`, replacing any earlier entry.
    pub fn insert(&mut self, measure: impl Into<String>, table: ExposureTable) {
        self.tables.insert(measure.into(), table);
    }

    /// Table fetched for `measure`.
    pub fn get(&self, measure: &str) -> Option<&ExposureTable> {
        self.tables.get(measure)
    }

    /// Whether `measure` has an entry.
    pub fn contains(&self, measure: &str) -> bool {
        self.tables.contains_key(measure)
    }

    /// Number of measures captured.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no measure has been captured.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Measure names, sorted.
    pub fn measures(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// (measure, table) pairs, sorted by measure.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExposureTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }
}
