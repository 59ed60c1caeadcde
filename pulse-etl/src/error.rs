//! Error types for pulse-etl

use crate::sink::SinkError;
use crate::walker::WalkError;
use pulse_common::Category;
use thiserror::Error;

/// Fatal run errors
///
/// Missing or malformed snapshot content is not an error; it is reported as
/// a skipped snapshot in the run summary instead.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Category tree could not be walked
    #[error("Walking {category} failed: {source}")]
    Walk {
        category: Category,
        #[source]
        source: WalkError,
    },

    /// A destination could not be written
    #[error("Writing {destination} failed: {source}")]
    Sink {
        destination: String,
        #[source]
        source: SinkError,
    },

    /// Reference CSV could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Common error: {0}")]
    Common(#[from] pulse_common::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EtlResult<T> = Result<T, EtlError>;
