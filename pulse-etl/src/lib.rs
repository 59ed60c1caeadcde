//! pulse-etl library interface
//!
//! Loads a PhonePe Pulse data checkout into SQLite (and optionally CSV).
//! Runs are sequential and must not overlap on the same database.

pub mod canonical;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod records;
pub mod reference;
pub mod sink;
pub mod walker;

pub use crate::error::{EtlError, EtlResult};
pub use crate::pipeline::{run_pipeline, PipelineConfig, RunSummary};
