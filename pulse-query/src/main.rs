//! pulse-query - read-only query API over a pulse-etl database
//!
//! Serves the dashboard's query menu as JSON. Never writes to the database.

use anyhow::Result;
use clap::Parser;
use pulse_common::config::{default_database_path, resolve_path, TomlConfig, ENV_DATABASE};
use pulse_query::{build_router, AppState};
use std::path::PathBuf;
use tracing::{error, info};

/// Default HTTP port
const DEFAULT_PORT: u16 = 5730;

#[derive(Parser, Debug)]
#[command(name = "pulse-query")]
#[command(about = "Read-only query API for PhonePe Pulse data")]
#[command(version)]
struct Args {
    /// SQLite database written by pulse-etl (env: PULSE_DATABASE)
    #[arg(long)]
    database: Option<PathBuf>,

    /// TOML config file (env: PULSE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_resolved(args.config.as_deref())?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    info!("Starting pulse-query v{}", env!("CARGO_PKG_VERSION"));

    let db_path = resolve_path(
        args.database.as_deref(),
        ENV_DATABASE,
        toml_config.database_path.as_deref(),
        default_database_path,
    );
    info!("Database path: {}", db_path.display());

    let pool = match pulse_common::db::connect_readonly(&db_path).await {
        Ok(pool) => {
            info!("Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    let app = build_router(AppState::new(pool));

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("pulse-query listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
