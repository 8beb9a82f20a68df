//! Google OAuth token refresh.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{UploadError, UploadResult};

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Exchanges a long-lived refresh token for short-lived access tokens.
#[derive(Debug, Clone)]
pub struct OauthRefresher {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl OauthRefresher {
    /// Create a refresher against the Google token endpoint.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Override the token endpoint (tests).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Obtain a fresh access token.
    pub async fn access_token(&self) -> UploadResult<String> {
        debug!("Refreshing OAuth access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UploadError::auth(format!("unparseable token response: {e}")))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UploadError::auth("no access_token in token response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_refresh_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let refresher = OauthRefresher::new("id", "secret", "refresh-1")
            .with_token_url(format!("{}/token", server.uri()));
        assert_eq!(refresher.access_token().await.unwrap(), "ya29.token");
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let refresher = OauthRefresher::new("id", "secret", "expired")
            .with_token_url(format!("{}/token", server.uri()));
        let err = refresher.access_token().await.unwrap_err();
        assert!(matches!(err, UploadError::Auth(_)), "got {err:?}");
    }
}
