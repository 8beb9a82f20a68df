//! Generation client error types.

use thiserror::Error;

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;

/// Errors that can occur while driving a generation task.
#[derive(Debug, Error)]
pub enum GenError {
    /// The submission envelope was rejected or carried no task id.
    #[error("Submission rejected: {0}")]
    Submission(String),

    /// The provider reported a terminal failure for the task.
    #[error("Task {task_id} failed: {detail}")]
    TaskFailed { task_id: String, detail: String },

    /// The polling budget ran out before a terminal status.
    #[error("Task {task_id} timed out after {waited_secs}s")]
    PollTimeout { task_id: String, waited_secs: u64 },

    /// The provider reported success but no usable artifact URL could be
    /// extracted.
    #[error("Task {task_id} reported success without a usable artifact: {detail}")]
    MalformedSuccess { task_id: String, detail: String },

    /// A response did not match the provider's documented shape.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for GenError {
    fn from(e: serde_json::Error) -> Self {
        GenError::InvalidResponse(e.to_string())
    }
}

impl GenError {
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    pub fn task_failed(task_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TaskFailed {
            task_id: task_id.into(),
            detail: detail.into(),
        }
    }

    pub fn malformed_success(task_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedSuccess {
            task_id: task_id.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
