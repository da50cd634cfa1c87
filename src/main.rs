//! twitchcast - cast live followed Twitch channels to Chromecast
//!
//! Serves a small LAN web page listing the live channels a Twitch user
//! follows; clicking one casts it to the selected Chromecast.
//!
//! # Usage
//!
//! ```bash
//! # Start the web UI (reads configuration.json)
//! twitchcast
//!
//! # CLI mode (for automation)
//! twitchcast channels --json
//! twitchcast cast somechannel --device 192.168.1.50
//! ```

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use twitchcast::app::App;
use twitchcast::cli::{Cli, Command, ExitCode, Output, ServeCmd};
use twitchcast::commands;
use twitchcast::config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level(&cli).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli).await.into()
}

/// Server mode logs at info; one-shot commands stay quiet unless asked
fn default_level(cli: &Cli) -> LevelFilter {
    if cli.is_cli_mode() {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    }
}

async fn run(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return output.error(e.to_string(), ExitCode::Config),
    };
    let app = match App::new(config) {
        Ok(a) => a,
        Err(e) => return output.error(e.to_string(), ExitCode::Config),
    };

    match cli.command {
        None => commands::serve_cmd(&app, ServeCmd::default(), &output).await,
        Some(Command::Serve(cmd)) => commands::serve_cmd(&app, cmd, &output).await,
        Some(Command::Channels(cmd)) => commands::channels_cmd(&app, cmd, &output).await,
        Some(Command::Resolve(cmd)) => commands::resolve_cmd(&app, cmd, &output).await,
        Some(Command::Cast(cmd)) => commands::cast_cmd(&app, cmd, &output).await,
        Some(Command::Devices(cmd)) => commands::devices_cmd(&app, cmd, &output).await,
    }
}
