//! twitchcast - cast live followed Twitch channels to Chromecast
//!
//! Lists the channels a Twitch user follows that are live right now and
//! dispatches one of them to a Chromecast on the local network.
//!
//! # Modules
//!
//! - `models` - Credentials, Helix records, display rows, cast targets
//! - `api` - Token cache and Helix client
//! - `stream` - Extraction, quality fallback, device control, dispatch
//! - `render` - Channel list HTML
//! - `server` - HTTP routes
//! - `config` - Configuration file loading and validation
//! - `app` - Service wiring
//! - `cli` / `commands` - Command line front end

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod render;
pub mod server;
pub mod stream;

// Re-export commonly used types
pub use models::{
    CastTarget, Credential, DisplayStreamer, FollowedChannel, GameMetadata, LiveChannelStatus,
    Quality, ResolvedStream, StreamInfo, UserProfile,
};

pub use api::{HelixClient, TokenCache};
pub use app::App;
pub use stream::{CastDispatcher, StreamResolver};
