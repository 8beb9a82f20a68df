//! Upload error types.

use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur during resumable uploads.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("OAuth token refresh failed: {0}")]
    Auth(String),

    #[error("Failed to open upload session: {0}")]
    SessionInit(String),

    /// A chunk was rejected with a status that is neither transient nor a
    /// quota rejection.
    #[error("Chunk transfer failed with status {status}: {detail}")]
    ChunkTransfer { status: u16, detail: String },

    /// The account is not eligible for this upload (e.g. channel not
    /// verified for long-form content). Never retried.
    #[error("Upload rejected by quota/verification policy: {0}")]
    Quota(String),

    /// Transient chunk errors exceeded the retry bound.
    #[error("Upload retries exhausted after {retries} attempts: {last_error}")]
    Exhausted { retries: u32, last_error: String },

    #[error("Thumbnail upload failed: {0}")]
    Thumbnail(String),

    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn session_init(msg: impl Into<String>) -> Self {
        Self::SessionInit(msg.into())
    }

    pub fn quota(msg: impl Into<String>) -> Self {
        Self::Quota(msg.into())
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

/// Server statuses treated as transient overload/unavailability and
/// retried at the chunk level.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Check whether a rejection body names the long-form verification or
/// upload-limit policy.
pub fn is_quota_rejection(status: u16, body: &str) -> bool {
    (status == 403 || status == 400)
        && (body.contains("uploadLimitExceeded")
            || body.contains("quotaExceeded")
            || body.contains("youtubeSignupRequired"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_set() {
        for status in [500, 502, 503, 504] {
            assert!(is_transient_status(status));
        }
        for status in [200, 308, 400, 401, 403, 404, 429] {
            assert!(!is_transient_status(status));
        }
    }

    #[test]
    fn test_quota_rejection_detection() {
        assert!(is_quota_rejection(403, r#"{"reason": "uploadLimitExceeded"}"#));
        assert!(is_quota_rejection(400, r#"{"reason": "quotaExceeded"}"#));
        assert!(!is_quota_rejection(503, "uploadLimitExceeded"));
        assert!(!is_quota_rejection(403, r#"{"reason": "forbidden"}"#));
    }
}
