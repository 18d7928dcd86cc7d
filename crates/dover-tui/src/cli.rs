//! Command-line configuration.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use dover_app::{ControllerConfig, DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_TIMEOUT, RuntimeConfig};
use dover_client::{ChannelConfig, TransportError};

/// Dover terminal chat client
#[derive(Parser, Debug, Clone)]
#[command(name = "dover-tui")]
#[command(about = "Terminal client for Dover chat rooms")]
#[command(version)]
pub struct Args {
    /// Server base URL for the room listing and history endpoints
    #[arg(short, long, env = "DOVER_SERVER", default_value = "http://localhost:5000")]
    pub server: String,

    /// Channel WebSocket URL
    ///
    /// Defaults to the server URL with a ws scheme and `/chat` path.
    #[arg(short, long, env = "DOVER_CHANNEL")]
    pub channel: Option<String>,

    /// Messages replayed on entering a room
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub history_limit: usize,

    /// Bound on each history fetch in milliseconds (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_HISTORY_TIMEOUT.as_millis() as u64)]
    pub history_timeout_ms: u64,

    /// File remembering the last active room
    ///
    /// Without it the room is remembered for this process only.
    #[arg(long, env = "DOVER_SESSION_SLOT")]
    pub session_slot: Option<PathBuf>,

    /// Write logs to this file (stdout belongs to the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Channel settings, derived from `--server` unless `--channel` is set.
    pub fn channel_config(&self) -> Result<ChannelConfig, TransportError> {
        match &self.channel {
            Some(url) => Ok(ChannelConfig::new(url.clone())),
            None => ChannelConfig::for_server(&self.server),
        }
    }

    /// Controller settings.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig { history_limit: self.history_limit }
    }

    /// Runtime settings.
    pub fn runtime_config(&self) -> RuntimeConfig {
        let history_timeout =
            (self.history_timeout_ms > 0).then(|| Duration::from_millis(self.history_timeout_ms));
        RuntimeConfig { history_timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dover-tui").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&["--server", "http://chat.local:8080"]);

        assert_eq!(args.controller_config(), ControllerConfig { history_limit: 20 });
        assert_eq!(args.runtime_config(), RuntimeConfig::default());
        assert_eq!(args.channel_config().unwrap().url, "ws://chat.local:8080/chat");
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn explicit_channel_wins() {
        let args = parse(&["--server", "http://a", "--channel", "wss://b/socket"]);
        assert_eq!(args.channel_config().unwrap().url, "wss://b/socket");
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let args = parse(&["--server", "http://a", "--history-timeout-ms", "0"]);
        assert_eq!(args.runtime_config().history_timeout, None);
    }
}
