//! Service wiring
//!
//! Builds the token cache, Helix client, resolver and dispatcher from a
//! validated [`Config`]. Shared by the server and the one-shot commands.

use std::sync::Arc;

use crate::api::{HelixClient, TokenCache};
use crate::config::{Config, ConfigError};
use crate::models::CastTarget;
use crate::server::{AppState, Routes};
use crate::stream::{CastDispatcher, Catt, StreamResolver, Streamlink};

pub struct App {
    pub config: Config,
    pub targets: Vec<CastTarget>,
    pub tokens: Arc<TokenCache>,
    pub helix: Arc<HelixClient>,
    pub resolver: Arc<StreamResolver>,
    pub dispatcher: Arc<CastDispatcher>,
}

impl App {
    /// Must be called inside a tokio runtime (the cast worker is spawned here)
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let targets = config.cast_targets()?;
        let settings = &config.settings;

        let tokens = Arc::new(TokenCache::new(
            settings.twitch_client_id.clone(),
            settings.twitch_secret.clone(),
        ));
        let helix = Arc::new(HelixClient::new(tokens.clone()));

        let extractor = Streamlink::with_path(config.tools.streamlink.clone())
            .with_args(config.tools.streamlink_args.clone());
        let resolver = Arc::new(StreamResolver::new(Arc::new(extractor)));

        let dispatcher = Arc::new(CastDispatcher::start(
            targets.clone(),
            resolver.clone(),
            Arc::new(Catt::with_path(config.tools.catt.clone())),
            config.dispatch_options(),
        ));

        Ok(Self {
            config,
            targets,
            tokens,
            helix,
            resolver,
            dispatcher,
        })
    }

    /// Find a target by IP address or case-insensitive name
    pub fn find_target(&self, device: &str) -> Option<&CastTarget> {
        self.targets.iter().find(|t| {
            t.address.to_string() == device || t.name.eq_ignore_ascii_case(device)
        })
    }

    pub fn state(&self) -> AppState {
        let settings = &self.config.settings;
        AppState {
            user_id: Arc::from(settings.user_id.as_str()),
            helix: self.helix.clone(),
            dispatcher: self.dispatcher.clone(),
            routes: Arc::new(Routes {
                channel_list_path: settings.channel_list_path.clone(),
                cast_path: settings.cast_path.clone(),
                static_path: settings.static_path.clone(),
                static_dir: settings.static_dir.clone(),
            }),
        }
    }
}
