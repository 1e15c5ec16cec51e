//! Server configuration
//!
//! Settings come from an optional TOML file and the command line. The
//! command line only ever carries the listen port.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Port used when none is given on the command line
pub const DEFAULT_PORT: u16 = 8989;

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the accept loop binds to
    pub listen: String,
    /// Maximum number of concurrently registered sessions
    pub max_sessions: usize,
    /// Bound of each session's outbound line queue
    pub outbox_capacity: usize,
    /// Longest accepted inbound line, in bytes
    pub max_line_length: usize,
    /// Echo plain chat lines back to their sender
    pub echo_own_messages: bool,
    /// Append-only transcript file for public lines
    pub transcript: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_sessions: 10,
            outbox_capacity: 10,
            max_line_length: 4096,
            echo_own_messages: true,
            transcript: None,
        }
    }
}

impl Config {
    /// Load a config from a TOML file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse a config from TOML text
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply command-line arguments (program name already stripped)
    ///
    /// A port argument replaces the configured listen address. Without an
    /// explicit transcript path, lines are kept in `logs/log<port>`.
    pub fn with_args(mut self, args: &[String]) -> Result<Self, ConfigError> {
        let port = if args.is_empty() {
            self.listen_port()
        } else {
            let (listen, port) = resolve_listen_address(args)?;
            self.listen = listen;
            port
        };
        if self.transcript.is_none() {
            self.transcript = Some(PathBuf::from(format!("logs/log{}", port)));
        }
        Ok(self)
    }

    /// Port part of the listen address
    pub fn listen_port(&self) -> u16 {
        self.listen
            .rsplit(':')
            .next()
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }
}

/// Resolve the listen address from command-line arguments
///
/// No argument selects [`DEFAULT_PORT`], one argument is the port, and
/// anything more is a usage error.
pub fn resolve_listen_address(args: &[String]) -> Result<(String, u16), ConfigError> {
    let port = match args {
        [] => DEFAULT_PORT,
        [port] => port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?,
        _ => return Err(ConfigError::Usage),
    };
    Ok((format!("0.0.0.0:{}", port), port))
}
