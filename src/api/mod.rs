//! API clients for external services
//!
//! - Auth: app access token cache (client-credentials grant)
//! - Helix: follows, streams, games and users endpoints

pub mod auth;
pub mod helix;

pub use auth::{AuthError, TokenCache};
pub use helix::{Endpoint, HelixClient, HelixError};
