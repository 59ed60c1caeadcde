//! # Pulse Common Library
//!
//! Shared code for the Pulse ingest and query binaries:
//! - Error type used across crates
//! - TOML bootstrap configuration and path resolution
//! - Database initialization and the destination table catalogue

pub mod config;
pub mod db;
pub mod error;

pub use db::table_schemas::{Category, ColumnDefinition, ColumnType, TableSchema};
pub use error::{Error, Result};
