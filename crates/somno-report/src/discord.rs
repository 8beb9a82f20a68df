//! Discord webhook notifications.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{ReportError, ReportResult};

/// Posts short status messages to a Discord webhook.
///
/// Unconfigured notifiers silently skip; the pipeline additionally treats
/// every notify failure as best-effort.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    http: Client,
    webhook_url: Option<String>,
}

impl DiscordNotifier {
    /// Create a notifier; `None` disables it.
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            webhook_url,
        }
    }

    /// Whether a webhook is configured.
    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post a message; a no-op when unconfigured.
    pub async fn notify(&self, message: &str) -> ReportResult<()> {
        let Some(webhook_url) = &self.webhook_url else {
            debug!("Discord webhook not configured, skipping notification");
            return Ok(());
        };

        let response = self
            .http
            .post(webhook_url)
            .timeout(Duration::from_secs(30))
            .json(&serde_json::json!({"content": message}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ReportError::request_failed(format!(
                "webhook returned {status}"
            )));
        }

        info!("Posted Discord notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_notify_posts_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({"content": "Upload complete"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Some(format!("{}/hook", server.uri())));
        notifier.notify("Upload complete").await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_notifier_skips_silently() {
        let notifier = DiscordNotifier::new(None);
        assert!(!notifier.is_configured());
        notifier.notify("ignored").await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::new(Some(format!("{}/hook", server.uri())));
        let err = notifier.notify("x").await.unwrap_err();
        assert!(matches!(err, ReportError::RequestFailed(_)), "got {err:?}");
    }
}
