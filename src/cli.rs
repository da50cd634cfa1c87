//! CLI - Command Line Interface for twitchcast
//!
//! With no subcommand the web UI server starts. Subcommands expose the same
//! operations for scripting; all output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Serve the channel list on the configured address
//! twitchcast
//!
//! # What is live right now?
//! twitchcast channels --json
//!
//! # Resolve and cast
//! twitchcast resolve some_streamer --quality 720p
//! twitchcast cast some_streamer --device 192.168.1.50
//! ```

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Device not found
    DeviceNotFound = 4,
    /// No streams available
    NoStreams = 5,
    /// Cast failed
    CastFailed = 6,
    /// Configuration missing or invalid
    Config = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// twitchcast - cast live followed Twitch channels to Chromecast
///
/// Run without arguments to start the web UI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "twitchcast",
    version,
    about = "Cast live followed Twitch channels to Chromecast",
    long_about = "Lists the live channels a Twitch user follows and casts them \
                  to a Chromecast on the local network.\n\n\
                  Run without arguments to start the web UI server.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  twitchcast                                  Start the web UI\n\
                  twitchcast channels --json                  List live channels\n\
                  twitchcast cast somechannel -d 10.0.0.5     Cast to device"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run (omit to serve the web UI)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running a one-shot command rather than the server
    pub fn is_cli_mode(&self) -> bool {
        !matches!(self.command, None | Some(Command::Serve(_)))
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web UI server (default)
    Serve(ServeCmd),

    /// List live followed channels
    #[command(visible_alias = "ls")]
    Channels(ChannelsCmd),

    /// Resolve a channel to a playable stream URL
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Cast a channel to a configured device and wait for the result
    Cast(CastCmd),

    /// List configured cast targets
    #[command(visible_alias = "dev")]
    Devices(DevicesCmd),
}

/// Start the web UI server
#[derive(Args, Debug, Default)]
pub struct ServeCmd {
    /// Override the listen port from the config
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

/// List live followed channels
#[derive(Args, Debug)]
pub struct ChannelsCmd {
    /// Maximum number of channels to print
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: usize,
}

/// Resolve a channel to a stream URL
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Channel login name
    #[arg(required = true)]
    pub channel: String,

    /// Desired quality tier (falls back to 480p, then worst)
    #[arg(long, short = 'Q', default_value = "best")]
    pub quality: String,
}

/// Cast a channel to a device
#[derive(Args, Debug)]
pub struct CastCmd {
    /// Channel login name
    #[arg(required = true)]
    pub channel: String,

    /// Device IP address or configured name
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

/// List configured cast targets
#[derive(Args, Debug)]
pub struct DevicesCmd {}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Cast success response
#[derive(Debug, Serialize, Deserialize)]
pub struct CastResponse {
    pub status: &'static str,
    pub id: String,
    pub channel: String,
    pub device: String,
    pub stream_url: String,
    pub quality: String,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print one human-readable line per item, or the JSON list
    pub fn print_lines<T: Serialize + std::fmt::Display>(&self, items: &[T]) -> anyhow::Result<()> {
        if self.json {
            return self.print(items);
        }
        for item in items {
            println!("{}", item);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_server_mode() {
        let cli = Cli::parse_from::<_, &str>([]);
        assert!(!cli.is_cli_mode());

        let cli = Cli::parse_from(["twitchcast", "serve", "-p", "8080"]);
        assert!(!cli.is_cli_mode());
    }

    #[test]
    fn test_json_output_omits_zero_exit_code() {
        let json = serde_json::to_string(&JsonOutput::success(vec!["a"])).unwrap();
        assert_eq!(json, r#"{"data":["a"]}"#);

        let json = serde_json::to_string(&JsonOutput::<()>::error_msg("boom", ExitCode::NoStreams))
            .unwrap();
        assert_eq!(json, r#"{"error":"boom","exit_code":5}"#);
    }
}
