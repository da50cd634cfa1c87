//! Twitch Helix API client
//!
//! Fetches the follow list, live status, game metadata and user profiles,
//! and joins them into [`DisplayStreamer`] records.
//! API docs: https://dev.twitch.tv/docs/api/reference

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::auth::{AuthError, TokenCache};
use crate::models::{
    DisplayStreamer, FollowedChannel, GameMetadata, LiveChannelStatus, UserProfile,
};

/// Helix REST base
pub const DEFAULT_HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Platform maximum page size
pub const PAGE_SIZE: u32 = 100;

/// Helix API error types
#[derive(Error, Debug)]
pub enum HelixError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Helix {endpoint} returned HTTP {status}: {body}")]
    Upstream {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: Endpoint, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Helix operations used by the channel list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Follows,
    Streams,
    Games,
    Users,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Follows | Endpoint::Streams | Endpoint::Games | Endpoint::Users => {
                Method::GET
            }
        }
    }

    /// Path relative to the Helix base
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Follows => "/users/follows",
            Endpoint::Streams => "/streams",
            Endpoint::Games => "/games",
            Endpoint::Users => "/users",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// Every Helix list response wraps its items in `data`
#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FollowItem {
    to_id: String,
    to_name: String,
}

#[derive(Debug, Deserialize)]
struct StreamItem {
    user_id: String,
    #[serde(default)]
    user_login: String,
    user_name: String,
    #[serde(default)]
    game_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    viewer_count: u64,
}

#[derive(Debug, Deserialize)]
struct GameItem {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserItem {
    id: String,
    #[serde(default)]
    profile_image_url: String,
}

impl From<FollowItem> for FollowedChannel {
    fn from(item: FollowItem) -> Self {
        Self {
            channel_id: item.to_id,
            channel_name: item.to_name,
        }
    }
}

impl From<StreamItem> for LiveChannelStatus {
    fn from(item: StreamItem) -> Self {
        Self {
            user_id: item.user_id,
            user_login: item.user_login,
            user_name: item.user_name,
            game_id: item.game_id,
            title: item.title,
            thumbnail_url_template: item.thumbnail_url,
            viewer_count: item.viewer_count,
        }
    }
}

impl From<GameItem> for GameMetadata {
    fn from(item: GameItem) -> Self {
        Self {
            game_id: item.id,
            game_name: item.name,
        }
    }
}

impl From<UserItem> for UserProfile {
    fn from(item: UserItem) -> Self {
        Self {
            user_id: item.id,
            profile_image_url: item.profile_image_url,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated Helix client
pub struct HelixClient {
    tokens: Arc<TokenCache>,
    base_url: String,
    client: reqwest::Client,
}

impl HelixClient {
    pub fn new(tokens: Arc<TokenCache>) -> Self {
        Self::with_base_url(tokens, DEFAULT_HELIX_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(tokens: Arc<TokenCache>, base_url: impl Into<String>) -> Self {
        Self {
            tokens,
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Issue one authenticated call and decode its `data` array
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, HelixError> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}{}", self.base_url, endpoint.path());

        let response = self
            .client
            .request(endpoint.method(), &url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Client-ID", self.tokens.client_id())
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            // Only the token this call sent; a concurrent refresh may already have replaced it
            self.tokens.invalidate_if(&token).await;
        }
        if !status.is_success() {
            tracing::warn!(%endpoint, status = status.as_u16(), "helix call failed");
            return Err(HelixError::Upstream {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let page: Page<T> =
            serde_json::from_str(&body).map_err(|e| HelixError::InvalidResponse {
                endpoint,
                reason: format!("JSON parse error: {}", e),
            })?;
        tracing::debug!(%endpoint, items = page.data.len(), "helix call ok");
        Ok(page.data)
    }

    /// Channels followed by `user_id` (first page only)
    pub async fn fetch_followed_channels(
        &self,
        user_id: &str,
    ) -> Result<Vec<FollowedChannel>, HelixError> {
        let first = PAGE_SIZE.to_string();
        let items: Vec<FollowItem> = self
            .call(Endpoint::Follows, &[("from_id", user_id), ("first", first.as_str())])
            .await?;
        Ok(items.into_iter().map(FollowedChannel::from).collect())
    }

    /// Live status for the given channels; offline channels are simply absent
    pub async fn fetch_live_status(
        &self,
        channels: &[FollowedChannel],
    ) -> Result<Vec<LiveChannelStatus>, HelixError> {
        if channels.is_empty() {
            return Ok(Vec::new());
        }

        let first = PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> = vec![("first", first.as_str())];
        query.extend(channels.iter().map(|c| ("user_id", c.channel_id.as_str())));

        let items: Vec<StreamItem> = self.call(Endpoint::Streams, &query).await?;
        Ok(items.into_iter().map(LiveChannelStatus::from).collect())
    }

    pub async fn fetch_games(
        &self,
        statuses: &[LiveChannelStatus],
    ) -> Result<Vec<GameMetadata>, HelixError> {
        let ids = unique(statuses.iter().map(|s| s.game_id.as_str()));
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let first = PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> = vec![("first", first.as_str())];
        query.extend(ids.into_iter().map(|id| ("id", id)));

        let items: Vec<GameItem> = self.call(Endpoint::Games, &query).await?;
        Ok(items.into_iter().map(GameMetadata::from).collect())
    }

    pub async fn fetch_profiles(
        &self,
        statuses: &[LiveChannelStatus],
    ) -> Result<Vec<UserProfile>, HelixError> {
        let ids = unique(statuses.iter().map(|s| s.user_id.as_str()));
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let first = PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> = vec![("first", first.as_str())];
        query.extend(ids.into_iter().map(|id| ("id", id)));

        let items: Vec<UserItem> = self.call(Endpoint::Users, &query).await?;
        Ok(items.into_iter().map(UserProfile::from).collect())
    }

    /// Fetch game and profile metadata, then left-join onto `statuses`.
    ///
    /// Every status yields exactly one [`DisplayStreamer`], in input order.
    pub async fn fetch_games_and_profiles(
        &self,
        statuses: &[LiveChannelStatus],
    ) -> Result<Vec<DisplayStreamer>, HelixError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let games: HashMap<String, String> = self
            .fetch_games(statuses)
            .await?
            .into_iter()
            .map(|g| (g.game_id, g.game_name))
            .collect();
        let profiles: HashMap<String, String> = self
            .fetch_profiles(statuses)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p.profile_image_url))
            .collect();

        Ok(statuses
            .iter()
            .map(|status| DisplayStreamer::join(status, &games, &profiles))
            .collect())
    }

    /// Full chain: follows -> live status -> games and profiles
    pub async fn live_followed(&self, user_id: &str) -> Result<Vec<DisplayStreamer>, HelixError> {
        let followed = self.fetch_followed_channels(user_id).await?;
        let live = self.fetch_live_status(&followed).await?;
        tracing::debug!(followed = followed.len(), live = live.len(), "fetched live status");
        self.fetch_games_and_profiles(&live).await
    }
}

/// Distinct non-empty ids, first-seen order
fn unique<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for id in ids {
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
