//! pulse-query library - read-only dashboard queries over a pulse-etl database

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod format;
pub mod queries;

pub use crate::error::{QueryError, QueryResult};
pub use crate::format::format_indian;
pub use crate::queries::QueryFacade;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only)
    pub db: SqlitePool,
    pub queries: QueryFacade,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            queries: QueryFacade::new(db.clone()),
            db,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::query_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
