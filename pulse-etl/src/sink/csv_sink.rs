//! CSV file sink

use super::{check_width, SinkError, TabularSink};
use crate::records::SqlValue;
use async_trait::async_trait;
use pulse_common::TableSchema;
use std::path::{Path, PathBuf};

/// Writes `<dir>/<file_stem>.csv` with a header row
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, schema: &TableSchema) -> PathBuf {
        self.dir.join(format!("{}.csv", schema.file_stem))
    }

    fn write_file(path: &Path, schema: &TableSchema, rows: &[Vec<SqlValue>]) -> Result<usize, SinkError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(schema.column_names())?;

        for (index, row) in rows.iter().enumerate() {
            check_width(schema, index, row)?;
            writer.write_record(row.iter().map(SqlValue::to_csv_field))?;
        }

        writer.flush().map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(rows.len())
    }
}

#[async_trait]
impl TabularSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn replace(&mut self, schema: &TableSchema, rows: &[Vec<SqlValue>]) -> Result<usize, SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(schema);
        let written = Self::write_file(&path, schema, rows)?;
        tracing::debug!(path = %path.display(), rows = written, "CSV written");
        Ok(written)
    }
}
