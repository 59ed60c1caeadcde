//! Integration tests for database initialization

use pulse_common::db::{connect_readonly, init_database};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("pulse.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pulse.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_ingest_runs_table_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("pulse.db")).await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'ingest_runs'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_readonly_connection_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let result = connect_readonly(&temp_dir.path().join("absent.db")).await;
    assert!(matches!(result, Err(pulse_common::Error::NotFound(_))));
}

#[tokio::test]
async fn test_readonly_connection_rejects_writes() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pulse.db");
    init_database(&db_path).await.unwrap().close().await;

    let pool = connect_readonly(&db_path).await.unwrap();
    let write = sqlx::query("CREATE TABLE _write_probe (id INTEGER)")
        .execute(&pool)
        .await;
    assert!(write.is_err(), "Write should fail on a read-only connection");
}
