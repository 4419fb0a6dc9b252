//! Error types for albumdb-http.

use albumdb::StoreError;
use http::StatusCode;
use std::io;

/// Result type for albumdb-http operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP service errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Hyper error.
    #[error("hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Bad request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HttpError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Json(_) => StatusCode::BAD_REQUEST,
            HttpError::Store(StoreError::InvalidRecord(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message is safe to echo back to the client.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
