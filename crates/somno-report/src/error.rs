//! Reporting error types.

use thiserror::Error;

/// Result type for reporting operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while reporting run results.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Service account auth failed: {0}")]
    Auth(String),

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ReportError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }
}
