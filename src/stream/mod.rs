//! Streaming infrastructure
//!
//! - Extractor: streamlink integration listing a channel's quality tiers
//! - Resolver: ordered quality fallback over the extractor's tiers
//! - Cast: Chromecast control via catt
//! - Dispatch: bounded background casting with logged outcomes

pub mod cast;
pub mod dispatch;
pub mod extractor;
pub mod resolver;

pub use cast::{Catt, DeviceController, DeviceError};
pub use dispatch::{
    CastDispatcher, CastFailure, CastOutcome, CastPhase, CastTicket, DispatchError,
    DispatchOptions,
};
pub use extractor::{ExtractError, StreamExtractor, Streamlink};
pub use resolver::{validate_channel, ResolveError, StreamResolver};
