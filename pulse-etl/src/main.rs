//! pulse-etl - PhonePe Pulse batch loader
//!
//! Walks the six category trees of a Pulse data checkout, extracts flat
//! records, canonicalizes state names and replaces the destination tables.

use anyhow::{Context, Result};
use clap::Parser;
use pulse_common::config::TomlConfig;
use pulse_common::Category;
use pulse_etl::config::{CliOverrides, EtlSettings};
use pulse_etl::db::{begin_run, finish_run, RunStatus};
use pulse_etl::pipeline::{write_last_refreshed, write_pincode_reference};
use pulse_etl::sink::{CsvSink, SqliteSink, TabularSink};
use pulse_etl::{run_pipeline, PipelineConfig, RunSummary};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pulse-etl")]
#[command(about = "Load a PhonePe Pulse data checkout into SQLite")]
#[command(version)]
struct Args {
    /// Pulse `data/` directory (env: PULSE_DATA_ROOT)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// SQLite database file (env: PULSE_DATABASE)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Also export every table as CSV into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Pincode → city reference CSV
    #[arg(long)]
    pincode_csv: Option<PathBuf>,

    /// TOML config file (env: PULSE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only load these categories (repeatable)
    #[arg(long = "only", value_name = "CATEGORY")]
    only: Vec<Category>,

    /// Skip snapshots whose state is not a known canonical name
    #[arg(long)]
    strict_states: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_resolved(args.config.as_deref())?;
    let settings = EtlSettings::resolve(
        CliOverrides {
            data_root: args.data_root,
            database: args.database,
            csv_dir: args.csv_dir,
            pincode_csv: args.pincode_csv,
            only: args.only,
            strict_states: args.strict_states,
            log_level: args.log_level,
        },
        &toml_config,
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    info!("Starting pulse-etl v{}", env!("CARGO_PKG_VERSION"));
    info!("Data root: {}", settings.data_root.display());

    let pool = pulse_common::db::init_database(&settings.database_path)
        .await
        .with_context(|| format!("Opening {}", settings.database_path.display()))?;

    let run_id = begin_run(&pool).await?;
    match load(&pool, &settings, &toml_config).await {
        Ok(summary) => {
            finish_run(&pool, run_id, RunStatus::Completed, &serde_json::to_string(&summary)?).await?;
            info!(
                run_id,
                rows = summary.total_rows(),
                skipped = summary.total_skipped(),
                "pulse-etl finished"
            );
            Ok(())
        }
        Err(e) => {
            error!("Run {} failed: {:#}", run_id, e);
            finish_run(&pool, run_id, RunStatus::Failed, &format!("{:#}", e)).await?;
            Err(e)
        }
    }
}

async fn load(pool: &SqlitePool, settings: &EtlSettings, toml_config: &TomlConfig) -> Result<RunSummary> {
    let config = PipelineConfig::from_settings(settings, toml_config);

    let mut sqlite = SqliteSink::new(pool.clone());
    let mut csv = settings.csv_dir.clone().map(CsvSink::new);

    let summary = {
        let mut sinks: Vec<&mut dyn TabularSink> = vec![&mut sqlite];
        if let Some(csv) = csv.as_mut() {
            sinks.push(csv);
        }
        run_pipeline(&config, &mut sinks).await?
    };

    write_last_refreshed(&mut sqlite, chrono::Local::now().date_naive()).await?;

    if let Some(path) = &settings.pincode_csv {
        write_pincode_reference(&mut sqlite, path).await?;
    }

    Ok(summary)
}
