//! Database initialization
//!
//! `init_database` opens (or creates) the store written by `pulse-etl`.
//! `connect_readonly` opens it for the query side, which must never write.

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create bookkeeping tables if needed
///
/// Destination tables are not created here: sinks drop and recreate them on
/// every run.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // The ingest run is sequential, a single writer connection is enough
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_ingest_runs_table(&pool).await?;

    Ok(pool)
}

/// Create the ingest run history table
///
/// One row per `pulse-etl` invocation; `summary` holds the per-category
/// counts as JSON once the run finishes.
pub async fn create_ingest_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            finished_at TIMESTAMP,
            status TEXT NOT NULL DEFAULT 'RUNNING',
            summary TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Connect to an existing database in read-only mode
///
/// Uses SQLite `mode=ro` so the query side cannot modify loaded tables.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}. Run pulse-etl first to load it.",
            db_path.display()
        )));
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await?;

    Ok(pool)
}
