//! SQLite table sink
//!
//! Drops and recreates the destination table, then inserts rows with
//! multi-row `INSERT` statements of `batch_size` rows each. Batches are not
//! wrapped in a transaction: if a batch fails, earlier batches stay in the
//! table and the run aborts with the table half-loaded.

use super::{check_width, SinkError, TabularSink};
use crate::records::SqlValue;
use async_trait::async_trait;
use pulse_common::TableSchema;
use sqlx::SqlitePool;

/// Rows per `INSERT` statement (6 columns x 150 stays below SQLite's 999
/// bound parameter limit)
pub const DEFAULT_BATCH_SIZE: usize = 150;

pub struct SqliteSink {
    pool: SqlitePool,
    batch_size: usize,
}

impl SqliteSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn insert_batch(
        &self,
        schema: &TableSchema,
        first_index: usize,
        batch: &[Vec<SqlValue>],
    ) -> Result<(), SinkError> {
        for (offset, row) in batch.iter().enumerate() {
            check_width(schema, first_index + offset, row)?;
        }

        let placeholders = format!("({})", vec!["?"; schema.columns.len()].join(", "));
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            schema.table,
            schema.column_names().join(", "),
            vec![placeholders.as_str(); batch.len()].join(", ")
        );

        let mut query = sqlx::query(&sql);
        for value in batch.iter().flatten() {
            query = match value {
                SqlValue::Text(s) => query.bind(s.as_str()),
                SqlValue::Integer(i) => query.bind(*i),
                SqlValue::Real(f) => query.bind(*f),
                SqlValue::Null => query.bind(None::<String>),
            };
        }
        query.execute(&self.pool).await?;

        Ok(())
    }
}

#[async_trait]
impl TabularSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn replace(&mut self, schema: &TableSchema, rows: &[Vec<SqlValue>]) -> Result<usize, SinkError> {
        sqlx::query(&schema.drop_sql()).execute(&self.pool).await?;
        sqlx::query(&schema.create_sql()).execute(&self.pool).await?;

        for (batch_index, batch) in rows.chunks(self.batch_size).enumerate() {
            self.insert_batch(schema, batch_index * self.batch_size, batch)
                .await?;
        }

        tracing::debug!(table = schema.table, rows = rows.len(), "Table replaced");
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_common::db::table_schemas::{AGG_TRANS, LAST_REFRESHED};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn agg_row(kind: &str, count: i64) -> Vec<SqlValue> {
        vec![
            SqlValue::from("Goa"),
            SqlValue::Integer(2021),
            SqlValue::Integer(1),
            SqlValue::from(kind),
            SqlValue::Integer(count),
            SqlValue::Real(count as f64 * 10.0),
        ]
    }

    #[tokio::test]
    async fn test_replace_does_not_accumulate() {
        let pool = memory_pool().await;
        let mut sink = SqliteSink::new(pool.clone()).with_batch_size(2);

        let rows: Vec<_> = (0..5).map(|i| agg_row("Recharge", i)).collect();
        assert_eq!(sink.replace(&AGG_TRANS, &rows).await.unwrap(), 5);
        assert_eq!(sink.replace(&AGG_TRANS, &rows[..3]).await.unwrap(), 3);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM AggTrans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_rows_keep_order_and_nulls() {
        let pool = memory_pool().await;
        let mut sink = SqliteSink::new(pool.clone());

        let mut row = agg_row("Peer-to-peer payments", 7);
        row[3] = SqlValue::Null;
        sink.replace(&AGG_TRANS, &[agg_row("Recharge", 1), row])
            .await
            .unwrap();

        let types: Vec<Option<String>> =
            sqlx::query_scalar("SELECT Transaction_Type FROM AggTrans ORDER BY rowid")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(types, vec![Some("Recharge".to_string()), None]);
    }

    #[tokio::test]
    async fn test_failure_leaves_earlier_batches() {
        let pool = memory_pool().await;
        let mut sink = SqliteSink::new(pool.clone()).with_batch_size(1);

        let rows = vec![
            vec![SqlValue::from("2024-01-01")],
            vec![SqlValue::from("2024-01-02"), SqlValue::Null],
        ];
        let result = sink.replace(&LAST_REFRESHED, &rows).await;
        assert!(matches!(result, Err(SinkError::RowWidth { row: 1, .. })));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lastrefreshed")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
