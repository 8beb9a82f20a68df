//! Resumable chunked transfer engine.
//!
//! Protocol: open a session by POSTing the resource metadata to an
//! `uploadType=resumable` endpoint, which answers with an opaque session
//! URI in the `Location` header. The file is then PUT in chunks with
//! `Content-Range` headers. The server answers `308 Resume Incomplete`
//! (optionally confirming received bytes in its `Range` header) until the
//! final chunk, which yields the created resource as JSON.
//!
//! Transient server errors are retried in place at the chunk level — the
//! session and cursor survive, so no already-sent byte is ever resent from
//! zero.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use crate::error::{is_quota_rejection, is_transient_status, UploadError, UploadResult};

/// Default chunk size (10 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Configuration for the transfer engine.
#[derive(Debug, Clone)]
pub struct ResumableConfig {
    /// Bytes per chunk.
    pub chunk_size: usize,
    /// Retry bound for transient errors, per chunk attempt counter.
    pub max_chunk_retries: u32,
    /// Linear backoff step: attempt `n` sleeps `n * retry_step`.
    pub retry_step: Duration,
}

impl Default for ResumableConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_retries: 10,
            retry_step: Duration::from_secs(2),
        }
    }
}

/// State of one resumable upload session.
///
/// The chunk cursor (`sent`) only ever moves forward; a session is used
/// for exactly one file and discarded afterwards.
#[derive(Debug)]
pub struct UploadSession {
    session_uri: String,
    total_size: u64,
    sent: u64,
}

impl UploadSession {
    /// Bytes confirmed received by the server.
    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    /// Total file size for this session.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Upload progress in percent.
    pub fn percent(&self) -> u8 {
        if self.total_size == 0 {
            return 100;
        }
        ((self.sent * 100) / self.total_size).min(100) as u8
    }

    /// Advance the cursor, never backwards.
    fn advance_to(&mut self, offset: u64) {
        self.sent = self.sent.max(offset).min(self.total_size);
    }
}

/// Resource envelope returned by the final chunk.
#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: Option<String>,
}

/// Chunked transfer engine shared by the YouTube and Drive uploads.
#[derive(Debug, Clone)]
pub struct ResumableTransfer {
    http: Client,
    config: ResumableConfig,
}

impl ResumableTransfer {
    /// Create a transfer engine.
    pub fn new(http: Client, config: ResumableConfig) -> Self {
        Self { http, config }
    }

    /// Open a resumable session by POSTing the resource metadata.
    pub async fn open_session(
        &self,
        init_url: &str,
        access_token: &str,
        metadata: &serde_json::Value,
        total_size: u64,
        content_type: &str,
    ) -> UploadResult<UploadSession> {
        debug!("Opening resumable session at {}", init_url);

        let response = self
            .http
            .post(init_url)
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", total_size.to_string())
            .json(metadata)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_quota_rejection(status.as_u16(), &body) {
                return Err(UploadError::quota(quota_message(&body)));
            }
            return Err(UploadError::session_init(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let session_uri = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::session_init("no session URI in Location header"))?;

        Ok(UploadSession {
            session_uri,
            total_size,
            sent: 0,
        })
    }

    /// Send the whole file through the session, returning the created
    /// resource id.
    pub async fn upload_file(
        &self,
        session: &mut UploadSession,
        access_token: &str,
        path: impl AsRef<Path>,
        content_type: &str,
    ) -> UploadResult<String> {
        let path = path.as_ref();
        if session.total_size() == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "refusing to upload an empty file",
            )
            .into());
        }
        let mut file = tokio::fs::File::open(path).await?;

        loop {
            let start = session.bytes_sent();
            let remaining = session.total_size() - start;
            let len = remaining.min(self.config.chunk_size as u64) as usize;

            file.seek(std::io::SeekFrom::Start(start)).await?;
            let mut chunk = vec![0u8; len];
            file.read_exact(&mut chunk).await?;

            if let Some(id) = self.send_chunk(session, access_token, chunk, content_type).await? {
                info!("Upload complete: resource {}", id);
                return Ok(id);
            }

            info!("Upload progress: {}%", session.percent());
        }
    }

    /// Send a single chunk, retrying transient server errors in place.
    ///
    /// Returns `Some(resource_id)` when this was the final chunk, `None`
    /// when the server expects more bytes.
    async fn send_chunk(
        &self,
        session: &mut UploadSession,
        access_token: &str,
        chunk: Vec<u8>,
        content_type: &str,
    ) -> UploadResult<Option<String>> {
        let start = session.bytes_sent();
        let end = start + chunk.len() as u64 - 1;
        let content_range = format!("bytes {}-{}/{}", start, end, session.total_size());

        let mut attempt: u32 = 0;
        loop {
            let response = self
                .http
                .put(&session.session_uri)
                .bearer_auth(access_token)
                .header(reqwest::header::CONTENT_RANGE, &content_range)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(chunk.clone())
                .send()
                .await?;

            let status = response.status();

            if status.as_u16() == 308 {
                // Resume Incomplete: trust the server's confirmation when
                // it sends one, but never move the cursor backwards.
                let confirmed = response
                    .headers()
                    .get(reqwest::header::RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_range_end)
                    .map(|last| last + 1)
                    .unwrap_or(end + 1);
                session.advance_to(confirmed);
                return Ok(None);
            }

            if status.is_success() {
                session.advance_to(end + 1);
                let created: CreatedResource = response.json().await.map_err(|e| {
                    UploadError::malformed_response(format!("unparseable final response: {e}"))
                })?;
                return created
                    .id
                    .filter(|id| !id.is_empty())
                    .map(Some)
                    .ok_or_else(|| UploadError::malformed_response("no resource id in final response"));
            }

            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            if is_quota_rejection(code, &body) {
                return Err(UploadError::quota(quota_message(&body)));
            }

            if is_transient_status(code) {
                attempt += 1;
                if attempt > self.config.max_chunk_retries {
                    return Err(UploadError::Exhausted {
                        retries: self.config.max_chunk_retries,
                        last_error: format!("status {code}: {body}"),
                    });
                }
                let delay = self.config.retry_step * attempt;
                warn!(
                    "Transient error {} on chunk at byte {} (attempt {}), retrying in {:?}",
                    code, start, attempt, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(UploadError::ChunkTransfer {
                status: code,
                detail: body,
            });
        }
    }
}

/// Parse the last confirmed byte out of a `Range: bytes=0-N` header.
fn parse_range_end(header: &str) -> Option<u64> {
    header.trim().strip_prefix("bytes=")?.split('-').nth(1)?.parse().ok()
}

/// Actionable message for quota/verification rejections.
fn quota_message(body: &str) -> String {
    if body.contains("uploadLimitExceeded") {
        "the account is not verified for long-form uploads (or hit its daily upload limit); \
         verify the channel at youtube.com/verify and try again"
            .to_string()
    } else {
        format!("request rejected by quota policy: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(chunk_size: usize) -> ResumableConfig {
        ResumableConfig {
            chunk_size,
            max_chunk_retries: 10,
            retry_step: Duration::from_millis(1),
        }
    }

    async fn open_test_session(
        server: &MockServer,
        transfer: &ResumableTransfer,
        total_size: u64,
    ) -> UploadSession {
        Mock::given(method("POST"))
            .and(path("/init"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session-1", server.uri()).as_str()),
            )
            .mount(server)
            .await;

        transfer
            .open_session(
                &format!("{}/init", server.uri()),
                "token",
                &serde_json::json!({"name": "video.mp4"}),
                total_size,
                "video/mp4",
            )
            .await
            .unwrap()
    }

    fn write_temp_file(bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_transient_errors_retry_the_chunk_in_place() {
        let server = MockServer::start().await;
        let transfer = ResumableTransfer::new(Client::new(), test_config(1024));
        let mut session = open_test_session(&server, &transfer, 10).await;
        let (_dir, file) = write_temp_file(b"0123456789");

        // Three transient failures, then success: exactly 4 chunk calls.
        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid123"})),
            )
            .mount(&server)
            .await;

        let id = transfer
            .upload_file(&mut session, "token", &file, "video/mp4")
            .await
            .unwrap();
        assert_eq!(id, "vid123");

        let puts = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.to_string() == "PUT")
            .count();
        assert_eq!(puts, 4);
    }

    #[tokio::test]
    async fn test_quota_rejection_aborts_with_zero_retries() {
        let server = MockServer::start().await;
        let transfer = ResumableTransfer::new(Client::new(), test_config(1024));
        let mut session = open_test_session(&server, &transfer, 10).await;
        let (_dir, file) = write_temp_file(b"0123456789");

        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"errors": [{"reason": "uploadLimitExceeded"}]}
            })))
            .mount(&server)
            .await;

        let err = transfer
            .upload_file(&mut session, "token", &file, "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Quota(_)), "got {err:?}");

        let puts = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.to_string() == "PUT")
            .count();
        assert_eq!(puts, 1, "quota errors must not be retried");
    }

    #[tokio::test]
    async fn test_chunks_advance_the_cursor_monotonically() {
        let server = MockServer::start().await;
        let transfer = ResumableTransfer::new(Client::new(), test_config(4));
        let mut session = open_test_session(&server, &transfer, 10).await;
        let (_dir, file) = write_temp_file(b"0123456789");

        // Each chunk is matched by its exact Content-Range, so this only
        // passes when the cursor advances 0-3 -> 4-7 -> 8-9.
        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .and(header("Content-Range", "bytes 0-3/10"))
            .respond_with(ResponseTemplate::new(308).insert_header("Range", "bytes=0-3"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .and(header("Content-Range", "bytes 4-7/10"))
            .respond_with(ResponseTemplate::new(308).insert_header("Range", "bytes=0-7"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .and(header("Content-Range", "bytes 8-9/10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid-3"})),
            )
            .mount(&server)
            .await;

        let id = transfer
            .upload_file(&mut session, "token", &file, "video/mp4")
            .await
            .unwrap();
        assert_eq!(id, "vid-3");
        assert_eq!(session.bytes_sent(), 10);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_the_upload() {
        let server = MockServer::start().await;
        let mut config = test_config(1024);
        config.max_chunk_retries = 2;
        let transfer = ResumableTransfer::new(Client::new(), config);
        let mut session = open_test_session(&server, &transfer, 4).await;
        let (_dir, file) = write_temp_file(b"abcd");

        Mock::given(method("PUT"))
            .and(path("/session-1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = transfer
            .upload_file(&mut session, "token", &file, "video/mp4")
            .await
            .unwrap_err();
        match err {
            UploadError::Exhausted { retries, last_error } => {
                assert_eq!(retries, 2);
                assert!(last_error.contains("503"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_session_uri_is_an_init_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/init"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transfer = ResumableTransfer::new(Client::new(), test_config(1024));
        let err = transfer
            .open_session(
                &format!("{}/init", server.uri()),
                "token",
                &serde_json::json!({}),
                10,
                "video/mp4",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::SessionInit(_)), "got {err:?}");
    }

    #[test]
    fn test_parse_range_end() {
        assert_eq!(parse_range_end("bytes=0-1048575"), Some(1048575));
        assert_eq!(parse_range_end("bytes=0-0"), Some(0));
        assert_eq!(parse_range_end("garbage"), None);
    }
}
