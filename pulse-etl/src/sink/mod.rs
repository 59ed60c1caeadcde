//! Destination sinks
//!
//! A sink fully replaces one destination's content per call. Destinations
//! are described by `TableSchema` (table name, CSV file stem, column order).
//!
//! Concurrent runs against the same destination are not supported; callers
//! must serialize them.

mod csv_sink;
mod sqlite_sink;

pub use csv_sink::CsvSink;
pub use sqlite_sink::SqliteSink;

use crate::records::SqlValue;
use async_trait::async_trait;
use pulse_common::TableSchema;
use std::path::PathBuf;
use thiserror::Error;

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Row does not match the destination's column count
    #[error("Row {row} for {table} has {actual} values, expected {expected}")]
    RowWidth {
        table: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// A destination store that can be replaced wholesale
#[async_trait]
pub trait TabularSink: Send {
    /// Short name for logs and summaries
    fn name(&self) -> &'static str;

    /// Replace the destination's prior content with `rows`
    ///
    /// Rows are in the schema's column order. Returns the number of rows
    /// written.
    async fn replace(&mut self, schema: &TableSchema, rows: &[Vec<SqlValue>]) -> Result<usize, SinkError>;
}

pub(crate) fn check_width(schema: &TableSchema, index: usize, row: &[SqlValue]) -> Result<(), SinkError> {
    if row.len() != schema.columns.len() {
        return Err(SinkError::RowWidth {
            table: schema.table,
            row: index,
            expected: schema.columns.len(),
            actual: row.len(),
        });
    }
    Ok(())
}
