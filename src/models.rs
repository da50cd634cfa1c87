//! Data structures and types for twitchcast
//!
//! Contains all shared models used across the application organized by domain:
//! - **Auth**: the cached bearer credential
//! - **Helix**: followed channels, live status, games and user profiles
//! - **Display**: the joined view model rendered on the channel list
//! - **Cast**: configured cast targets, quality tiers and resolved streams

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

// =============================================================================
// Auth Models
// =============================================================================

/// App access token with its expiry
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: Instant,
}

impl Credential {
    /// Build a credential that expires `expires_in` from now.
    ///
    /// `None` if the expiry is not representable as an [`Instant`].
    pub fn new(token: impl Into<String>, expires_in: Duration) -> Option<Self> {
        Some(Self {
            token: token.into(),
            expires_at: Instant::now().checked_add(expires_in)?,
        })
    }

    /// Valid iff the token is non-empty and expiry is strictly in the future
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        !self.token.is_empty() && self.expires_at > now
    }
}

// =============================================================================
// Helix Models
// =============================================================================

/// A channel the configured user follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedChannel {
    pub channel_id: String,
    pub channel_name: String,
}

/// A currently-live channel as reported by the streams endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveChannelStatus {
    pub user_id: String,
    /// Login name, the handle the extractor understands
    pub user_login: String,
    /// Display name, may contain non-ASCII characters
    pub user_name: String,
    pub game_id: String,
    pub title: String,
    /// Contains `{width}` and `{height}` placeholders
    pub thumbnail_url_template: String,
    pub viewer_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub game_id: String,
    pub game_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub profile_image_url: String,
}

// =============================================================================
// Display Models
// =============================================================================

/// Game label shown when a channel's game id has no metadata
pub const UNKNOWN_GAME: &str = "Unknown";

/// Thumbnail dimensions substituted into the template
pub const THUMBNAIL_WIDTH: u32 = 1200;
pub const THUMBNAIL_HEIGHT: u32 = 674;

/// A live channel ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayStreamer {
    pub name: String,
    /// Channel handle used in cast links
    pub login: String,
    pub game: String,
    pub title: String,
    pub thumbnail_url: String,
    pub profile_image_url: String,
    pub viewer_count: String,
}

impl DisplayStreamer {
    /// Left-join one live status against game and profile lookups.
    ///
    /// Missing game metadata yields [`UNKNOWN_GAME`]; a missing profile yields
    /// an empty image URL.
    pub fn join(
        status: &LiveChannelStatus,
        games: &HashMap<String, String>,
        profiles: &HashMap<String, String>,
    ) -> Self {
        Self {
            name: status.user_name.clone(),
            login: if status.user_login.is_empty() {
                status.user_name.clone()
            } else {
                status.user_login.clone()
            },
            game: games
                .get(&status.game_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_GAME.to_string()),
            title: status.title.clone(),
            thumbnail_url: Self::thumbnail(&status.thumbnail_url_template),
            profile_image_url: profiles.get(&status.user_id).cloned().unwrap_or_default(),
            viewer_count: status.viewer_count.to_string(),
        }
    }

    /// Substitute the width/height placeholders of a thumbnail template
    pub fn thumbnail(template: &str) -> String {
        template
            .replace("{width}", &THUMBNAIL_WIDTH.to_string())
            .replace("{height}", &THUMBNAIL_HEIGHT.to_string())
    }
}

impl fmt::Display for DisplayStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] - {} viewers - {}",
            self.name, self.game, self.viewer_count, self.title
        )
    }
}

// =============================================================================
// Cast Models
// =============================================================================

/// A quality tier label as offered by the extractor ("720p", "480p", "worst")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(String);

impl Quality {
    /// Secondary tier tried when the desired one is missing
    pub const FALLBACK: &'static str = "480p";
    /// Extractor's lowest-effort tier, tried last
    pub const WORST: &'static str = "worst";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tiers to try in order: desired, "480p", "worst"; duplicates skipped
    pub fn candidates(&self) -> Vec<&str> {
        let mut tiers: Vec<&str> = Vec::with_capacity(3);
        for tier in [self.as_str(), Self::FALLBACK, Self::WORST] {
            if !tiers.contains(&tier) {
                tiers.push(tier);
            }
        }
        tiers
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quality {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A configured playback device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastTarget {
    pub name: String,
    pub address: IpAddr,
    pub max_quality: Quality,
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} (max {})", self.name, self.address, self.max_quality)
    }
}

/// One entry of the extractor's quality-to-stream map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(rename = "type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Playable URL picked for one cast request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub url: String,
    pub quality: Quality,
}

impl fmt::Display for ResolvedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(game_id: &str) -> LiveChannelStatus {
        LiveChannelStatus {
            user_id: "1".into(),
            user_login: "abc".into(),
            user_name: "abc".into(),
            game_id: game_id.into(),
            title: "hello".into(),
            thumbnail_url_template: "https://cdn/{width}x{height}.jpg".into(),
            viewer_count: 1234,
        }
    }

    #[test]
    fn test_credential_validity() {
        let live = Credential::new("tok", Duration::from_secs(60)).unwrap();
        assert!(live.is_valid());

        let empty = Credential::new("", Duration::from_secs(60)).unwrap();
        assert!(!empty.is_valid());

        assert!(Credential::new("tok", Duration::from_secs(u64::MAX)).is_none());

        let now = Instant::now();
        let expired = Credential {
            token: "tok".into(),
            expires_at: now,
        };
        assert!(!expired.is_valid_at(now));
    }

    #[test]
    fn test_join_substitutes_thumbnail() {
        let streamer = DisplayStreamer::join(&status("10"), &HashMap::new(), &HashMap::new());
        assert_eq!(streamer.thumbnail_url, "https://cdn/1200x674.jpg");
        assert_eq!(streamer.viewer_count, "1234");
    }

    #[test]
    fn test_join_keeps_login_apart_from_display_name() {
        let mut localized = status("10");
        localized.user_login = "kato_junichi0817".into();
        localized.user_name = "加藤純一".into();

        let streamer = DisplayStreamer::join(&localized, &HashMap::new(), &HashMap::new());
        assert_eq!(streamer.name, "加藤純一");
        assert_eq!(streamer.login, "kato_junichi0817");

        localized.user_login.clear();
        let streamer = DisplayStreamer::join(&localized, &HashMap::new(), &HashMap::new());
        assert_eq!(streamer.login, "加藤純一");
    }

    #[test]
    fn test_join_missing_lookups() {
        let streamer = DisplayStreamer::join(&status("10"), &HashMap::new(), &HashMap::new());
        assert_eq!(streamer.game, UNKNOWN_GAME);
        assert_eq!(streamer.profile_image_url, "");

        let games = HashMap::from([("10".to_string(), "RPG".to_string())]);
        let profiles = HashMap::from([("1".to_string(), "https://img/1.png".to_string())]);
        let streamer = DisplayStreamer::join(&status("10"), &games, &profiles);
        assert_eq!(streamer.game, "RPG");
        assert_eq!(streamer.profile_image_url, "https://img/1.png");
    }

    #[test]
    fn test_quality_candidates_order() {
        assert_eq!(Quality::from("1080p").candidates(), vec!["1080p", "480p", "worst"]);
        assert_eq!(Quality::from("480p").candidates(), vec!["480p", "worst"]);
        assert_eq!(Quality::from("worst").candidates(), vec!["worst", "480p"]);
    }
}
