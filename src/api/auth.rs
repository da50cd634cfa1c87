//! App access token cache
//!
//! Amortizes the client-credentials grant against the Twitch identity
//! endpoint. One credential is shared process-wide; refreshes are serialized
//! so overlapping requests never race a stale token over a newer one.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::Credential;

/// Twitch identity host
pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv";

/// Token acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse token response: {0}")]
    Parse(String),

    #[error("Token endpoint returned an empty access token")]
    EmptyToken,
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Internally-synchronized cache for the app access token
pub struct TokenCache {
    client_id: String,
    client_secret: String,
    base_url: String,
    client: reqwest::Client,
    credential: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_base_url(client_id, client_secret, DEFAULT_AUTH_URL)
    }

    /// Create a cache against a custom identity host (for testing)
    pub fn with_base_url(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            credential: Mutex::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Return the cached token, exchanging for a new one if it is missing or expired
    pub async fn get_token(&self) -> Result<String, AuthError> {
        // Held across the exchange so concurrent callers wait for one refresh
        let mut slot = self.credential.lock().await;
        if let Some(credential) = slot.as_ref().filter(|c| c.is_valid()) {
            tracing::trace!("reusing cached app token");
            return Ok(credential.token.clone());
        }

        let credential = self.exchange().await?;
        let token = credential.token.clone();
        *slot = Some(credential);
        Ok(token)
    }

    /// Exchange for a new token regardless of the cached one
    pub async fn force_refresh(&self) -> Result<String, AuthError> {
        let mut slot = self.credential.lock().await;
        let credential = self.exchange().await?;
        let token = credential.token.clone();
        *slot = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential; the next `get_token` re-authenticates
    pub async fn invalidate(&self) {
        self.credential.lock().await.take();
    }

    /// Drop the cached credential only if it still holds `token`
    pub async fn invalidate_if(&self, token: &str) -> bool {
        let mut slot = self.credential.lock().await;
        if slot.as_ref().is_some_and(|c| c.token == token) {
            slot.take();
            tracing::debug!("dropped rejected app token");
            true
        } else {
            false
        }
    }

    async fn exchange(&self) -> Result<Credential, AuthError> {
        tracing::debug!(client_id = %self.client_id, "requesting app access token");

        let url = format!("{}/oauth2/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let expires_in = parsed.expires_in;
        let credential = Credential::new(parsed.access_token, Duration::from_secs(expires_in))
            .ok_or_else(|| AuthError::Parse(format!("expires_in out of range: {}", expires_in)))?;
        tracing::info!(expires_in, "obtained app access token");
        Ok(credential)
    }
}
