//! Tabular input: ordered named columns over rows of mixed numeric/text cells.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A single cell of the input table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl CellValue {
    /// Interpret a raw text field the way a spreadsheet export would.
    ///
    /// Empty strings, `nan`, `null`, `na` and `-` are treated as missing.
    pub fn from_raw(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty()
            || s.eq_ignore_ascii_case("nan")
            || s.eq_ignore_ascii_case("null")
            || s.eq_ignore_ascii_case("na")
            || s == "-"
        {
            return Self::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(s.to_string()),
        }
    }

    /// Numeric coercion: numbers and numeric text become finite floats,
    /// everything else (including NaN/inf) is undefined.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => v.is_finite().then_some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Missing => None,
        }
    }

    /// Text rendering for identifiers; `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Number(v) if !v.is_finite() => None,
            other => Some(other.to_string()),
        }
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) if v.is_finite() => write!(f, "{v}"),
            Self::Number(_) | Self::Missing => Ok(()),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// Non-finite numbers serialize as null, never as NaN/Infinity tokens.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Number(_) | Self::Missing => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct CellValueVisitor;

impl<'de> Visitor<'de> for CellValueVisitor {
    type Value = CellValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a string or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
        Ok(CellValue::Number(if v { 1.0 } else { 0.0 }))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
        Ok(CellValue::Number(v as f64))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
        Ok(CellValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
        Ok(CellValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
        Ok(CellValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CellValue, E> {
        Ok(CellValue::Text(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Missing)
    }

    fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Missing)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellValueVisitor)
    }
}

// ============================================================================
// Dataset
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Row {row} has {got} cells, expected {expected}")]
    RowWidth { row: usize, expected: usize, got: usize },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

/// Ordered rows over named columns.
///
/// Row order and column order are preserved through the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Create an empty dataset with the given header.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self, DatasetError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].contains(c) {
                return Err(DatasetError::DuplicateColumn(c.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a dataset from a header and rows in one go.
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, DatasetError> {
        let mut dataset = Self::new(columns)?;
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Append a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A dataset without rows or without columns carries no samples.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `row` in the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Rename a column in place. Renaming a column onto itself is a no-op.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), DatasetError> {
        if from == to {
            return Ok(());
        }
        if self.has_column(to) {
            return Err(DatasetError::DuplicateColumn(to.to_string()));
        }
        let idx = self
            .column_index(from)
            .ok_or_else(|| DatasetError::UnknownColumn(from.to_string()))?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Insert a copy of `from` named `to`, placed just before `from`.
    pub fn copy_column(&mut self, from: &str, to: &str) -> Result<(), DatasetError> {
        if self.has_column(to) {
            return Err(DatasetError::DuplicateColumn(to.to_string()));
        }
        let idx = self
            .column_index(from)
            .ok_or_else(|| DatasetError::UnknownColumn(from.to_string()))?;
        self.columns.insert(idx, to.to_string());
        for row in &mut self.rows {
            let cell = row[idx].clone();
            row.insert(idx, cell);
        }
        Ok(())
    }

    /// `base` if no column has that name, otherwise `base_2`, `base_3`, …
    pub fn unused_column_name(&self, base: &str) -> String {
        if !self.has_column(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|name| !self.has_column(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Numeric coercion of a whole column; `None` if the column does not exist.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_f64()).collect())
    }

    /// One row as a name → value map.
    pub fn row_map(&self, row: usize) -> Option<BTreeMap<String, CellValue>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        )
    }
}
