//! YouTube upload client.

use std::path::Path;

use chrono::SecondsFormat;
use reqwest::Client;
use tracing::info;

use somno_models::VideoMetadata;

use crate::error::{UploadError, UploadResult};
use crate::resumable::{ResumableConfig, ResumableTransfer};

/// Default Google API host (uploads live under `/upload`).
const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Client for the YouTube Data API v3 upload endpoints.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    transfer: ResumableTransfer,
    api_base: String,
    access_token: String,
}

impl YouTubeClient {
    /// Create a client with a fresh access token.
    pub fn new(access_token: impl Into<String>, config: ResumableConfig) -> Self {
        let http = Client::new();
        Self {
            transfer: ResumableTransfer::new(http.clone(), config),
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Upload a video file with its metadata, returning the video id.
    ///
    /// Opens a resumable session carrying the full metadata, then streams
    /// the file in chunks. Scheduled uploads are forced private by
    /// [`VideoMetadata::effective_privacy`].
    pub async fn upload_video(
        &self,
        path: impl AsRef<Path>,
        metadata: &VideoMetadata,
    ) -> UploadResult<String> {
        let path = path.as_ref();
        let total_size = tokio::fs::metadata(path).await?.len();

        info!(
            "Uploading {} ({} MiB) as \"{}\"",
            path.display(),
            total_size / (1024 * 1024),
            metadata.title
        );

        let init_url = format!(
            "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
            self.api_base
        );
        let body = build_video_body(metadata);

        let mut session = self
            .transfer
            .open_session(&init_url, &self.access_token, &body, total_size, "video/mp4")
            .await?;

        self.transfer
            .upload_file(&mut session, &self.access_token, path, "video/mp4")
            .await
    }

    /// Set a custom thumbnail on an uploaded video.
    ///
    /// A thumbnail failure never invalidates the upload itself; callers
    /// treat this as a soft step.
    pub async fn set_thumbnail(
        &self,
        video_id: &str,
        image_path: impl AsRef<Path>,
    ) -> UploadResult<()> {
        let image = tokio::fs::read(image_path.as_ref()).await?;
        let url = format!(
            "{}/upload/youtube/v3/thumbnails/set?videoId={}",
            self.api_base, video_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(image)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Thumbnail(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        info!("Thumbnail set on video {}", video_id);
        Ok(())
    }
}

/// Build the `videos.insert` metadata body.
pub fn build_video_body(metadata: &VideoMetadata) -> serde_json::Value {
    let mut status = serde_json::json!({
        "privacyStatus": metadata.effective_privacy().as_str(),
    });
    if let Some(publish_at) = metadata.publish_at {
        status["publishAt"] =
            serde_json::Value::String(publish_at.to_rfc3339_opts(SecondsFormat::Secs, false));
    }

    serde_json::json!({
        "snippet": {
            "title": metadata.title,
            "description": metadata.description,
            "tags": metadata.tags,
            "categoryId": metadata.category_id,
        },
        "status": status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use somno_models::PrivacyStatus;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ResumableConfig {
        ResumableConfig {
            chunk_size: 1024,
            max_chunk_retries: 2,
            retry_step: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_video_body_keeps_privacy_without_schedule() {
        let meta = VideoMetadata::new("Title", "Desc").with_privacy(PrivacyStatus::Public);
        let body = build_video_body(&meta);
        assert_eq!(body["status"]["privacyStatus"], "public");
        assert!(body["status"].get("publishAt").is_none());
        assert_eq!(body["snippet"]["categoryId"], "10");
    }

    #[test]
    fn test_scheduled_video_body_is_private_with_publish_at() {
        let jst = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        let meta = VideoMetadata::new("Title", "Desc")
            .with_privacy(PrivacyStatus::Public)
            .with_publish_at(jst.with_ymd_and_hms(2026, 8, 5, 20, 0, 0).unwrap());

        let body = build_video_body(&meta);
        assert_eq!(body["status"]["privacyStatus"], "private");
        assert_eq!(body["status"]["publishAt"], "2026-08-05T20:00:00+09:00");
    }

    #[tokio::test]
    async fn test_upload_video_returns_resource_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session-y", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session-y"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid42"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("video.mp4");
        std::fs::write(&file, b"fake video").unwrap();

        let client = YouTubeClient::new("token", test_config()).with_api_base(server.uri());
        let meta = VideoMetadata::new("Title", "Desc");
        assert_eq!(client.upload_video(&file, &meta).await.unwrap(), "vid42");
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_reported_not_panicked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/thumbnails/set"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let thumb = dir.path().join("thumb.png");
        std::fs::write(&thumb, b"png").unwrap();

        let client = YouTubeClient::new("token", test_config()).with_api_base(server.uri());
        let err = client.set_thumbnail("vid42", &thumb).await.unwrap_err();
        assert!(matches!(err, UploadError::Thumbnail(_)), "got {err:?}");
    }
}
