//! Stream resolution with ordered quality fallback
//!
//! Tries the desired tier, then "480p", then "worst".

use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use super::extractor::{ExtractError, StreamExtractor};
use crate::models::{Quality, ResolvedStream};

static CHANNEL_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,25}$").ok());

/// Check a Twitch login name before it reaches a subprocess argument list
pub fn validate_channel(channel: &str) -> Result<&str, ResolveError> {
    if CHANNEL_NAME.as_ref().is_some_and(|re| re.is_match(channel)) {
        Ok(channel)
    } else {
        Err(ResolveError::InvalidChannel(channel.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid channel name '{0}'")]
    InvalidChannel(String),

    #[error("No stream available for '{channel}' (tried {tried})")]
    NoStreamAvailable { channel: String, tried: String },

    #[error("Stream resolution failed: {0}")]
    Resolution(#[source] ExtractError),
}

pub struct StreamResolver {
    extractor: Arc<dyn StreamExtractor>,
}

impl StreamResolver {
    pub fn new(extractor: Arc<dyn StreamExtractor>) -> Self {
        Self { extractor }
    }

    /// Resolve a channel to one playable URL
    pub async fn resolve(
        &self,
        channel: &str,
        desired: &Quality,
    ) -> Result<ResolvedStream, ResolveError> {
        let channel = validate_channel(channel)?;
        let candidates = desired.candidates();

        let streams = match self.extractor.streams(channel).await {
            Ok(streams) => streams,
            Err(ExtractError::Offline(_)) => {
                return Err(ResolveError::NoStreamAvailable {
                    channel: channel.to_string(),
                    tried: candidates.join(", "),
                })
            }
            Err(e) => return Err(ResolveError::Resolution(e)),
        };

        for tier in &candidates {
            match streams.get(*tier) {
                Some(info) if !info.url.is_empty() => {
                    if *tier != desired.as_str() {
                        tracing::info!(channel, desired = %desired, used = tier, "quality fallback");
                    }
                    return Ok(ResolvedStream {
                        url: info.url.clone(),
                        quality: Quality::new(*tier),
                    });
                }
                _ => continue,
            }
        }

        tracing::warn!(
            channel,
            available = ?streams.keys().collect::<Vec<_>>(),
            "no acceptable quality tier"
        );
        Err(ResolveError::NoStreamAvailable {
            channel: channel.to_string(),
            tried: candidates.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_channel() {
        assert!(validate_channel("some_streamer42").is_ok());
        assert!(validate_channel("").is_err());
        assert!(validate_channel("--output=/etc/passwd").is_err());
        assert!(validate_channel("a/b").is_err());
        assert!(validate_channel(&"x".repeat(26)).is_err());
    }
}
