//! Stream extraction via streamlink
//!
//! Asks streamlink for every quality tier a live channel offers.
//! `streamlink --json twitch.tv/<channel>` prints either
//! `{"streams": {"720p": {...}, ...}}` or `{"error": "..."}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::models::StreamInfo;

/// Errors from the extraction leaf
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Channel '{0}' is offline or does not exist")]
    Offline(String),
    #[error("Extractor '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to run extractor: {0}")]
    Io(#[from] std::io::Error),
    #[error("Extractor failed: {0}")]
    Failed(String),
    #[error("Invalid extractor output: {0}")]
    InvalidOutput(String),
}

/// Source of quality-tagged stream URLs for a channel
#[async_trait]
pub trait StreamExtractor: Send + Sync {
    async fn streams(&self, channel: &str) -> Result<HashMap<String, StreamInfo>, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct StreamlinkOutput {
    #[serde(default)]
    streams: Option<HashMap<String, StreamInfo>>,
    #[serde(default)]
    error: Option<String>,
}

/// streamlink CLI extractor
pub struct Streamlink {
    streamlink_path: String,
    extra_args: Vec<String>,
}

impl Streamlink {
    pub fn new() -> Self {
        Self::with_path("streamlink")
    }

    /// Create with custom streamlink path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            streamlink_path: path.into(),
            extra_args: Vec::new(),
        }
    }

    /// Extra arguments passed before the channel URL (e.g. `--twitch-low-latency`)
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments for one extraction
    pub fn args(&self, channel: &str) -> Vec<String> {
        let mut args = vec!["--json".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args.push(format!("twitch.tv/{}", channel));
        args
    }

    /// Interpret streamlink's JSON output
    pub fn parse_output(
        channel: &str,
        stdout: &str,
    ) -> Result<HashMap<String, StreamInfo>, ExtractError> {
        let parsed: StreamlinkOutput = serde_json::from_str(stdout.trim())
            .map_err(|e| ExtractError::InvalidOutput(e.to_string()))?;

        if let Some(error) = parsed.error {
            if error.contains("No playable streams") || error.contains("No plugin can handle") {
                return Err(ExtractError::Offline(channel.to_string()));
            }
            return Err(ExtractError::Failed(error));
        }

        match parsed.streams {
            Some(streams) if !streams.is_empty() => Ok(streams),
            _ => Err(ExtractError::Offline(channel.to_string())),
        }
    }
}

impl Default for Streamlink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamExtractor for Streamlink {
    async fn streams(&self, channel: &str) -> Result<HashMap<String, StreamInfo>, ExtractError> {
        tracing::debug!(channel, "running streamlink");

        let output = Command::new(&self.streamlink_path)
            .args(self.args(channel))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractError::NotFound(self.streamlink_path.clone())
                } else {
                    ExtractError::Io(e)
                }
            })?;

        // streamlink exits non-zero on offline channels but still prints JSON
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Failed(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Self::parse_output(channel, &stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_put_channel_last() {
        let streamlink = Streamlink::new().with_args(["--twitch-disable-ads"]);
        assert_eq!(
            streamlink.args("abc"),
            vec!["--json", "--twitch-disable-ads", "twitch.tv/abc"]
        );
    }

    #[test]
    fn test_parse_streams() {
        let out = r#"{
            "plugin": "twitch",
            "streams": {
                "480p": {"type": "hls", "url": "https://cdn/480.m3u8", "headers": {"User-Agent": "x"}},
                "worst": {"type": "hls", "url": "https://cdn/160.m3u8", "headers": {}}
            }
        }"#;
        let streams = Streamlink::parse_output("abc", out).unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams["480p"].url, "https://cdn/480.m3u8");
        assert_eq!(streams["480p"].stream_type, "hls");
    }

    #[test]
    fn test_parse_offline_error() {
        let out = r#"{"error": "No playable streams found on this URL: twitch.tv/abc"}"#;
        assert!(matches!(
            Streamlink::parse_output("abc", out),
            Err(ExtractError::Offline(c)) if c == "abc"
        ));
    }

    #[test]
    fn test_parse_other_error() {
        let out = r#"{"error": "Unable to open URL: 503"}"#;
        assert!(matches!(
            Streamlink::parse_output("abc", out),
            Err(ExtractError::Failed(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            Streamlink::parse_output("abc", "not json"),
            Err(ExtractError::InvalidOutput(_))
        ));
    }
}
