//! Error types for the key-value store
//!
//! Provides unified error handling using thiserror.

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the store and its HTTP adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Cache constructed with a capacity of zero
    #[error("Invalid capacity: {0} (must be greater than 0)")]
    InvalidCapacity(usize),

    /// WAL append or flush failed; no in-memory state was changed
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] io::Error),

    /// Malformed or truncated WAL frame found during replay
    #[error("Corrupt log record at byte {offset}: {reason}")]
    CorruptLogRecord { offset: u64, reason: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for CacheError {
    fn from(err: io::Error) -> Self {
        CacheError::PersistenceFailure(err)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidCapacity(_)
            | CacheError::CorruptLogRecord { .. }
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the store.
pub type Result<T> = std::result::Result<T, CacheError>;
