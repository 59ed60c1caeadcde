//! Error types for pulse-query

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unknown query or missing data (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid parameter (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Database or other internal failure (500)
    #[error("Common error: {0}")]
    Common(#[from] pulse_common::Error),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            QueryError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            QueryError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            QueryError::Common(pulse_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            QueryError::Common(ref err) => {
                tracing::error!("Query failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type QueryResult<T> = Result<T, QueryError>;
