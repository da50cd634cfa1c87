//! CLI command implementations
//!
//! Each command returns a semantic [`ExitCode`] and reports through
//! [`Output`], so scripts can rely on both.

use std::net::SocketAddr;

use serde::Serialize;
use tokio::net::TcpListener;

use crate::api::HelixError;
use crate::app::App;
use crate::cli::{CastCmd, CastResponse, ChannelsCmd, DevicesCmd, ExitCode, Output, ResolveCmd, ServeCmd};
use crate::models::Quality;
use crate::server;
use crate::stream::{CastFailure, CastOutcome, DispatchError, ResolveError};

// =============================================================================
// Serve Command
// =============================================================================

pub async fn serve_cmd(app: &App, cmd: ServeCmd, output: &Output) -> ExitCode {
    let mut addr: SocketAddr = app.config.settings.listen;
    if let Some(port) = cmd.port {
        addr.set_port(port);
    }

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => return output.error(format!("Failed to bind {}: {}", addr, e), ExitCode::Error),
    };

    output.info(format!(
        "Serving http://{}{}",
        addr, app.config.settings.channel_list_path
    ));
    match server::run_server(listener, app.state(), server::shutdown_signal()).await {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Server error: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Channels Command
// =============================================================================

pub async fn channels_cmd(app: &App, cmd: ChannelsCmd, output: &Output) -> ExitCode {
    match app.helix.live_followed(&app.config.settings.user_id).await {
        Ok(mut streamers) => {
            streamers.truncate(cmd.limit);
            if streamers.is_empty() {
                output.info("No followed channels are live");
            }
            match output.print_lines(&streamers) {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Err(HelixError::Auth(e)) => {
            output.error(format!("Authentication failed: {}", e), ExitCode::NetworkError)
        }
        Err(e) => output.error(format!("Failed to list channels: {}", e), ExitCode::NetworkError),
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

#[derive(Debug, Serialize)]
struct ResolveOk<'a> {
    channel: &'a str,
    url: String,
    quality: String,
}

pub async fn resolve_cmd(app: &App, cmd: ResolveCmd, output: &Output) -> ExitCode {
    let quality = Quality::new(cmd.quality);
    match app.resolver.resolve(&cmd.channel, &quality).await {
        Ok(stream) => {
            let ok = ResolveOk {
                channel: &cmd.channel,
                url: stream.url,
                quality: stream.quality.to_string(),
            };
            match output.print(ok) {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Err(e) => output.error(e.to_string(), resolve_exit_code(&e)),
    }
}

fn resolve_exit_code(e: &ResolveError) -> ExitCode {
    match e {
        ResolveError::InvalidChannel(_) => ExitCode::InvalidArgs,
        ResolveError::NoStreamAvailable { .. } => ExitCode::NoStreams,
        ResolveError::Resolution(_) => ExitCode::Error,
    }
}

// =============================================================================
// Cast Command
// =============================================================================

pub async fn cast_cmd(app: &App, cmd: CastCmd, output: &Output) -> ExitCode {
    let target = match cmd.device.as_deref() {
        Some(device) => match app.find_target(device) {
            Some(t) => t.clone(),
            None => {
                return output.error(
                    format!("No configured cast target matches '{}'", device),
                    ExitCode::DeviceNotFound,
                )
            }
        },
        // A single configured target needs no flag
        None if app.targets.len() == 1 => app.targets[0].clone(),
        None => {
            return output.error(
                "Several cast targets configured. Use --device or -d flag.",
                ExitCode::InvalidArgs,
            )
        }
    };

    output.info(format!("Casting {} to {}...", cmd.channel, target.name));

    let ticket = match app
        .dispatcher
        .dispatch(&cmd.channel, &target.address.to_string())
    {
        Ok(t) => t,
        Err(e) => {
            let code = match e {
                DispatchError::InvalidChannel(_) => ExitCode::InvalidArgs,
                DispatchError::UnknownDevice(_) => ExitCode::DeviceNotFound,
                DispatchError::QueueFull | DispatchError::Closed => ExitCode::CastFailed,
            };
            return output.error(e.to_string(), code);
        }
    };

    let id = ticket.id.to_string();
    match ticket.outcome().await {
        Some(CastOutcome::Done(stream)) => {
            let response = CastResponse {
                status: "casting",
                id,
                channel: cmd.channel,
                device: target.name,
                stream_url: stream.url,
                quality: stream.quality.to_string(),
            };
            match output.print(response) {
                Ok(()) => ExitCode::Success,
                Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
            }
        }
        Some(CastOutcome::Failed(failure)) => {
            let code = match &failure {
                CastFailure::Resolve(e) => resolve_exit_code(e),
                CastFailure::Device(_) | CastFailure::TimedOut(_) => ExitCode::CastFailed,
            };
            output.error(failure.to_string(), code)
        }
        None => output.error("Cast worker stopped before finishing", ExitCode::CastFailed),
    }
}

// =============================================================================
// Devices Command
// =============================================================================

pub async fn devices_cmd(app: &App, _cmd: DevicesCmd, output: &Output) -> ExitCode {
    if app.targets.is_empty() {
        return output.error("No cast targets configured", ExitCode::DeviceNotFound);
    }
    match output.print_lines(&app.targets) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}
