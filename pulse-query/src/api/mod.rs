//! HTTP API handlers for pulse-query

pub mod health;
pub mod query;

pub use health::health_routes;
pub use query::query_routes;
