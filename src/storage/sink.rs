//! Record sink abstraction.
//!
//! A [`RecordSink`] durably writes a finite set of rows to a destination
//! table, replacing whatever the table held before. Row types describe
//! their own columns through [`TableRow`].

use std::fmt;

use async_trait::async_trait;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DatabaseError;

/// Errors that can occur while writing to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("row has {actual} values, table {table} expects {expected}")]
    RowShape {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Three-part warehouse table identifier (`project.dataset.table`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableId {
    /// Creates a table identifier, rejecting empty parts.
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let id = Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        };
        let parts = [&id.project, &id.dataset, &id.table];
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(SinkError::InvalidDestination(format!(
                "every part of '{}' must be non-empty",
                id
            )));
        }
        Ok(id)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    /// RFC 3339 text.
    Timestamp,
}

impl ColumnType {
    /// SQL type name used in table definitions.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self { name, kind }
    }
}

/// A record type that can be written as one table row.
pub trait TableRow {
    /// Columns of the table, in value order.
    fn columns() -> &'static [Column];

    /// Values of this row, one per column.
    fn values(&self) -> Vec<Value>;
}

/// Rows materialized for writing, detached from their record type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub columns: &'static [Column],
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    /// Materializes a slice of records.
    pub fn from_rows<R: TableRow>(records: &[R]) -> Self {
        Self {
            columns: R::columns(),
            rows: records.iter().map(TableRow::values).collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Destination for harvested rows.
///
/// `replace` supersedes the whole table: calling it twice with the same data
/// leaves the destination in the same state as calling it once. A failed
/// write leaves the previous contents in place.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Replaces the contents of `table` with `data`, returning the number of
    /// rows written.
    async fn replace(&self, table: &TableId, data: TableData) -> Result<usize>;
}
