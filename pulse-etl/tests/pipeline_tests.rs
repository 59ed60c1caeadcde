//! End-to-end runs against a temporary database

mod helpers;

use chrono::NaiveDate;
use helpers::{agg_transaction_payload, PulseFixture};
use pulse_common::config::TomlConfig;
use pulse_common::db::init_database;
use pulse_common::Category;
use pulse_etl::pipeline::{write_last_refreshed, write_pincode_reference};
use pulse_etl::sink::{CsvSink, SqliteSink, TabularSink};
use pulse_etl::{run_pipeline, EtlError, PipelineConfig};
use serde_json::json;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn temp_pool(dir: &TempDir) -> SqlitePool {
    init_database(&dir.path().join("pulse.db")).await.unwrap()
}

fn agg_config(fixture: &PulseFixture) -> PipelineConfig {
    PipelineConfig::new(
        fixture.data_root(),
        &[Category::AggregatedTransaction],
        &TomlConfig::default(),
    )
}

#[tokio::test]
async fn test_single_snapshot_end_to_end() {
    let fixture = PulseFixture::new();
    fixture.snapshot(
        Category::AggregatedTransaction,
        "test-state",
        "2021",
        "1.json",
        &json!({"data": {"transactionData": [
            {"name": "Recharge", "paymentInstruments": [{"count": 10, "amount": 100.0}]}
        ]}}),
    );

    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());

    let summary = run_pipeline(&agg_config(&fixture), &mut [&mut sqlite])
        .await
        .unwrap();
    assert_eq!(summary.total_rows(), 1);
    assert_eq!(summary.total_skipped(), 0);

    let rows: Vec<(String, i64, i64, String, i64, f64)> = sqlx::query_as(
        "SELECT State, Year, Quarter, Transaction_Type, Transaction_Count, Transaction_Amount FROM AggTrans",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        rows,
        vec![("Test State".to_string(), 2021, 1, "Recharge".to_string(), 10, 100.0)]
    );
}

#[tokio::test]
async fn test_null_collection_loads_zero_rows() {
    let fixture = PulseFixture::new();
    fixture.snapshot(
        Category::AggregatedTransaction,
        "test-state",
        "2021",
        "1.json",
        &json!({"data": {"transactionData": null}}),
    );

    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());

    let summary = run_pipeline(&agg_config(&fixture), &mut [&mut sqlite])
        .await
        .unwrap();
    let agg = summary.get(Category::AggregatedTransaction).unwrap();
    assert_eq!(agg.rows, 0);
    assert_eq!(agg.skipped, 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM AggTrans")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_second_run_replaces() {
    let fixture = PulseFixture::new();
    fixture
        .snapshot(
            Category::AggregatedTransaction,
            "goa",
            "2020",
            "1.json",
            &agg_transaction_payload(&[("Recharge", 1, 1.0), ("Others", 2, 2.0)]),
        )
        .snapshot(
            Category::AggregatedTransaction,
            "goa",
            "2020",
            "2.json",
            &agg_transaction_payload(&[("Recharge", 3, 3.0)]),
        );

    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());
    let config = agg_config(&fixture);

    run_pipeline(&config, &mut [&mut sqlite]).await.unwrap();
    run_pipeline(&config, &mut [&mut sqlite]).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM AggTrans")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_all_categories_with_csv_export() {
    let fixture = PulseFixture::new();
    fixture.empty_roots().snapshot(
        Category::MapUser,
        "west-bengal",
        "2019",
        "3.json",
        &json!({"data": {"hoverData": {
            "kolkata district": {"registeredUsers": 100, "appOpens": 7},
            "howrah district": {"registeredUsers": 50, "appOpens": 0}
        }}}),
    );

    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());
    let mut csv = CsvSink::new(db_dir.path().join("csv"));

    let config = PipelineConfig::new(fixture.data_root(), &Category::ALL, &TomlConfig::default());
    let summary = {
        let mut sinks: Vec<&mut dyn TabularSink> = vec![&mut sqlite, &mut csv];
        run_pipeline(&config, &mut sinks).await.unwrap()
    };

    assert_eq!(summary.categories.len(), 6);
    assert_eq!(summary.get(Category::MapUser).unwrap().rows, 2);

    let districts: Vec<String> = sqlx::query_scalar("SELECT District FROM MapUser ORDER BY rowid")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(districts, vec!["Kolkata", "Howrah"]);

    let exported = std::fs::read_to_string(db_dir.path().join("csv/Map_User.csv")).unwrap();
    assert_eq!(
        exported,
        "State,Year,Quarter,District,RegisteredUsers,AppOpens\n\
         West Bengal,2019,3,Kolkata,100,7\n\
         West Bengal,2019,3,Howrah,50,0\n"
    );
    assert!(db_dir.path().join("csv/Top_User.csv").exists());
}

#[tokio::test]
async fn test_missing_root_aborts_run() {
    let fixture = PulseFixture::new();
    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool);

    let result = run_pipeline(&agg_config(&fixture), &mut [&mut sqlite]).await;
    assert!(matches!(
        result,
        Err(EtlError::Walk {
            category: Category::AggregatedTransaction,
            ..
        })
    ));
}

#[tokio::test]
async fn test_root_override_from_config() {
    let fixture = PulseFixture::new();
    let elsewhere = TempDir::new().unwrap();
    let state_dir = elsewhere.path().join("kerala").join("2023");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(
        state_dir.join("4.json"),
        json!({"data": {"pincodes": [{"name": "682001", "registeredUsers": 77}]}}).to_string(),
    )
    .unwrap();

    let mut toml_config = TomlConfig::default();
    toml_config
        .roots
        .insert("top_user".to_string(), elsewhere.path().to_path_buf());
    let config = PipelineConfig::new(fixture.data_root(), &[Category::TopUser], &toml_config);

    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());
    run_pipeline(&config, &mut [&mut sqlite]).await.unwrap();

    let row: (String, Option<String>, i64) =
        sqlx::query_as("SELECT State, Pincode, Registered_User FROM TopUser")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row, ("Kerala".to_string(), Some("682001".to_string()), 77));
}

#[tokio::test]
async fn test_reference_tables() {
    let db_dir = TempDir::new().unwrap();
    let pool = temp_pool(&db_dir).await;
    let mut sqlite = SqliteSink::new(pool.clone());

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    write_last_refreshed(&mut sqlite, date).await.unwrap();
    write_last_refreshed(&mut sqlite, date).await.unwrap();

    let dates: Vec<String> = sqlx::query_scalar("SELECT date FROM lastrefreshed")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(dates, vec!["2024-05-01"]);

    let csv_path = db_dir.path().join("pincodes.csv");
    std::fs::write(&csv_path, "Pincode,City\n600001,Chennai\n600001,Chennai\n560001,Bengaluru\n").unwrap();
    let loaded = write_pincode_reference(&mut sqlite, &csv_path).await.unwrap();
    assert_eq!(loaded, 2);
}
