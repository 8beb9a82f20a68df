//! Artifact download.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::GenResult;

/// Download a generated artifact to a local file.
///
/// Creates parent directories as needed. The artifact URLs returned by the
/// providers are plain HTTPS objects, so a single GET suffices.
pub async fn download_artifact(
    http: &Client,
    url: &str,
    path: impl AsRef<Path>,
) -> GenResult<()> {
    let path = path.as_ref();
    debug!("Downloading {} to {}", url, path.display());

    let response = http
        .get(url)
        .timeout(Duration::from_secs(120))
        .send()
        .await?
        .error_for_status()?;

    let bytes = response.bytes().await?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
