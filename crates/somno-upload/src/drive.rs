//! Drive mirror upload.
//!
//! The rendered video is mirrored to a Drive folder for archival before
//! the YouTube upload. Uses the same resumable transfer engine.

use std::path::Path;

use reqwest::Client;
use tracing::info;

use crate::error::UploadResult;
use crate::resumable::{ResumableConfig, ResumableTransfer};

/// Default Google API host.
const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Client for Drive v3 resumable file uploads.
#[derive(Debug, Clone)]
pub struct DriveClient {
    transfer: ResumableTransfer,
    api_base: String,
    access_token: String,
}

impl DriveClient {
    /// Create a client with a fresh access token.
    pub fn new(access_token: impl Into<String>, config: ResumableConfig) -> Self {
        Self {
            transfer: ResumableTransfer::new(Client::new(), config),
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Upload a file into a folder, returning a shareable view link.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        file_name: &str,
        folder_id: Option<&str>,
    ) -> UploadResult<String> {
        let path = path.as_ref();
        let total_size = tokio::fs::metadata(path).await?.len();

        let mut metadata = serde_json::json!({"name": file_name});
        if let Some(folder) = folder_id {
            metadata["parents"] = serde_json::json!([folder]);
        }

        let init_url = format!(
            "{}/upload/drive/v3/files?uploadType=resumable&fields=id",
            self.api_base
        );

        let mut session = self
            .transfer
            .open_session(&init_url, &self.access_token, &metadata, total_size, "video/mp4")
            .await?;

        let file_id = self
            .transfer
            .upload_file(&mut session, &self.access_token, path, "video/mp4")
            .await?;

        let link = format!("https://drive.google.com/file/d/{file_id}/view");
        info!("Mirrored {} to Drive: {}", path.display(), link);
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_drive_upload_returns_view_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .and(body_json_string(
                r#"{"name": "SleepMusic_20260805.mp4", "parents": ["folder-1"]}"#,
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Location", format!("{}/session-d", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session-d"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "drive-9"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("video.mp4");
        std::fs::write(&file, b"fake video").unwrap();

        let config = ResumableConfig {
            chunk_size: 1024,
            max_chunk_retries: 2,
            retry_step: Duration::from_millis(1),
        };
        let client = DriveClient::new("token", config).with_api_base(server.uri());
        let link = client
            .upload_file(&file, "SleepMusic_20260805.mp4", Some("folder-1"))
            .await
            .unwrap();
        assert_eq!(link, "https://drive.google.com/file/d/drive-9/view");
    }
}
