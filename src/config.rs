//! Configuration management for twitchcast
//!
//! Handles config file lookup, parsing and validation.
//! The file is `configuration.json` (TOML is accepted when the path ends in
//! `.toml`) and is searched for in this order:
//! 1. `--config <path>`
//! 2. `$TWITCHCAST_CONFIG`
//! 3. next to the executable
//! 4. `~/.config/twitchcast/configuration.json`

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CastTarget, Quality};
use crate::stream::DispatchOptions;

pub const CONFIG_FILE_NAME: &str = "configuration.json";
pub const CONFIG_ENV: &str = "TWITCHCAST_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration file found (looked in: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("Error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub settings: Settings,
    #[serde(default)]
    pub chromecasts: Vec<Chromecast>,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

/// Credentials, routes and listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub twitch_client_id: String,
    #[serde(default)]
    pub twitch_secret: String,
    #[serde(rename = "channelListURL", default = "default_channel_list_path")]
    pub channel_list_path: String,
    #[serde(rename = "castURL", default = "default_cast_path")]
    pub cast_path: String,
    #[serde(rename = "staticURL", default = "default_static_path")]
    pub static_path: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

/// A cast target as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chromecast {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub quality_max: String,
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tools {
    #[serde(default = "default_streamlink")]
    pub streamlink: String,
    #[serde(default)]
    pub streamlink_args: Vec<String>,
    #[serde(default = "default_catt")]
    pub catt: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            streamlink: default_streamlink(),
            streamlink_args: Vec::new(),
            catt: default_catt(),
        }
    }
}

/// Cast work queue bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSettings {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_cast_timeout_secs")]
    pub cast_timeout_secs: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_concurrent: default_max_concurrent(),
            cast_timeout_secs: default_cast_timeout_secs(),
        }
    }
}

fn default_channel_list_path() -> String {
    "/gui/twitch-channel-list".to_string()
}

fn default_cast_path() -> String {
    "/gui/cast".to_string()
}

fn default_static_path() -> String {
    "/gui/static".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3010))
}

fn default_streamlink() -> String {
    "streamlink".to_string()
}

fn default_catt() -> String {
    "catt".to_string()
}

fn default_queue_capacity() -> usize {
    DispatchOptions::default().queue_capacity
}

fn default_max_concurrent() -> usize {
    DispatchOptions::default().max_concurrent
}

fn default_cast_timeout_secs() -> u64 {
    DispatchOptions::default().cast_timeout.as_secs()
}

impl Config {
    /// Get the per-user config path (~/.config/twitchcast/configuration.json)
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("twitchcast").join(CONFIG_FILE_NAME))
    }

    /// Candidate paths in lookup order
    pub fn candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
        if let Some(path) = explicit {
            return vec![path.to_path_buf()];
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return vec![PathBuf::from(path)];
        }

        let mut paths = Vec::new();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        if let Some(path) = Self::user_path() {
            paths.push(path);
        }
        paths
    }

    /// Find, parse and validate the configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = Self::candidates(explicit);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(candidates.clone()))?;

        let config = Self::load_file(&path)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config = Self::parse(&contents, is_toml).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating
    pub fn parse(contents: &str, is_toml: bool) -> Result<Self, String> {
        if is_toml {
            toml::from_str(contents).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(contents).map_err(|e| e.to_string())
        }
    }

    /// Check required settings and every cast target
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.settings;
        if s.user_id.is_empty() || s.twitch_client_id.is_empty() || s.twitch_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "missing required settings (userId, twitchClientId, twitchSecret)".into(),
            ));
        }

        let routes = [
            ("channelListURL", &s.channel_list_path),
            ("castURL", &s.cast_path),
            ("staticURL", &s.static_path),
        ];
        for (key, path) in routes {
            // Routes are mounted with trailing slashes trimmed
            if !path.starts_with('/') || path.trim_end_matches('/').is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an absolute path below '/', got '{}'",
                    key, path
                )));
            }
        }
        for (i, (key, path)) in routes.iter().enumerate() {
            for (other_key, other) in &routes[i + 1..] {
                if path.trim_end_matches('/') == other.trim_end_matches('/') {
                    return Err(ConfigError::Invalid(format!(
                        "{} and {} must differ, both are '{}'",
                        key, other_key, path
                    )));
                }
            }
        }

        if self.chromecasts.is_empty() {
            return Err(ConfigError::Invalid("missing at least one chromecast".into()));
        }
        self.cast_targets().map(|_| ())
    }

    /// Cast targets with parsed addresses
    pub fn cast_targets(&self) -> Result<Vec<CastTarget>, ConfigError> {
        self.chromecasts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if c.name.is_empty() || c.ip_address.is_empty() || c.quality_max.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "chromecast #{} missing required settings",
                        i
                    )));
                }
                let address: IpAddr = c.ip_address.parse().map_err(|_| {
                    ConfigError::Invalid(format!(
                        "chromecast #{} has invalid ipAddress '{}'",
                        i, c.ip_address
                    ))
                })?;
                Ok(CastTarget {
                    name: c.name.clone(),
                    address,
                    max_quality: Quality::new(c.quality_max.clone()),
                })
            })
            .collect()
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            queue_capacity: self.dispatch.queue_capacity,
            max_concurrent: self.dispatch.max_concurrent,
            cast_timeout: Duration::from_secs(self.dispatch.cast_timeout_secs),
        }
    }
}
