//! Columnar record sets produced by the extractors.
//!
//! A [`RecordSet`] is the normalized tabular output of parsing exactly one
//! report file: an ordered list of named, typed columns whose cells are all
//! nullable. Column names and types for a given report type are identical
//! across every file of that type, so record sets can be appended directly
//! into one staging table.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ReportError, Result};

/// Cell storage for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Date(Vec<Option<NaiveDate>>),
    SmallInt(Vec<Option<i16>>),
    Int(Vec<Option<i32>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Date(v) => v.len(),
            ColumnValues::SmallInt(v) => v.len(),
            ColumnValues::Int(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn date(name: impl Into<String>, cells: Vec<Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnValues::Date(cells))
    }

    pub fn small_int(name: impl Into<String>, cells: Vec<Option<i16>>) -> Self {
        Self::new(name, ColumnValues::SmallInt(cells))
    }

    pub fn int(name: impl Into<String>, cells: Vec<Option<i32>>) -> Self {
        Self::new(name, ColumnValues::Int(cells))
    }

    pub fn float(name: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnValues::Float(cells))
    }

    pub fn text(name: impl Into<String>, cells: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnValues::Text(cells))
    }

    pub fn timestamp(name: impl Into<String>, cells: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnValues::Timestamp(cells))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }
}

/// Columnar, strongly typed tabular result of parsing one report file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    columns: Vec<Column>,
    rows: usize,
}

impl RecordSet {
    /// Build a record set, verifying that every column holds the same number
    /// of cells.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if columns.iter().any(|c| c.values.len() != rows) {
            return Err(ReportError::RaggedColumns);
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// ============================================================================
// Type coercion
// ============================================================================

pub(crate) fn coerce_date(field: &str, raw: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|_| ReportError::Coercion {
        field: field.to_string(),
        value: raw.to_string(),
        expected: "date",
    })
}

pub(crate) fn coerce_small(field: &str, raw: &str) -> Result<i16> {
    raw.trim().parse().map_err(|_| ReportError::Coercion {
        field: field.to_string(),
        value: raw.to_string(),
        expected: "smallint",
    })
}

pub(crate) fn coerce_int(field: &str, raw: &str) -> Result<i32> {
    raw.trim().parse().map_err(|_| ReportError::Coercion {
        field: field.to_string(),
        value: raw.to_string(),
        expected: "integer",
    })
}

pub(crate) fn coerce_float(field: &str, raw: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| ReportError::Coercion {
        field: field.to_string(),
        value: raw.to_string(),
        expected: "double precision",
    })
}

/// Empty cells are null; anything else must coerce.
pub(crate) fn nullable<T>(raw: &str, coerce: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        coerce(trimmed).map(Some)
    }
}
