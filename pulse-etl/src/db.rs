//! Ingest run bookkeeping (`ingest_runs` table)

use pulse_common::Result;
use sqlx::SqlitePool;

/// Status of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Record the start of a run, returning its id
pub async fn begin_run(pool: &SqlitePool) -> Result<i64> {
    let result = sqlx::query("INSERT INTO ingest_runs (status) VALUES ('RUNNING')")
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Mark a run finished with its JSON summary (or error message)
pub async fn finish_run(pool: &SqlitePool, run_id: i64, status: RunStatus, summary: &str) -> Result<()> {
    sqlx::query(
        "UPDATE ingest_runs SET finished_at = CURRENT_TIMESTAMP, status = ?, summary = ? WHERE run_id = ?",
    )
    .bind(status.as_str())
    .bind(summary)
    .bind(run_id)
    .execute(pool)
    .await?;
    Ok(())
}
