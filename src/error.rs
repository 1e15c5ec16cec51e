//! Error types for the chat relay
//!
//! Defines session-level errors, outbox send errors and configuration errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Session-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (reply to the client and carry on). The display text of
/// the registration errors is the exact line sent back over the wire.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Name is blank or starts with the command prefix
    #[error("Invalid name. Please try again.")]
    NameInvalid,

    /// Another live session already uses this name
    #[error("Name already taken. Please choose a different name.")]
    NameTaken,

    /// Registry is at capacity (fatal for the connecting client)
    #[error("Server full. Try later.")]
    RegistryFull,

    /// Whisper recipient is not connected
    #[error("{0} is not online or does not exist.")]
    RecipientNotFound(String),

    /// Session has already left the registry
    #[error("Session not found")]
    SessionNotFound,

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error, including over-long lines (fatal)
    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

/// Outbox send errors
///
/// Returned when a line cannot be enqueued for a session. Broadcast treats
/// both cases as a silent drop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The outbox already holds its maximum number of lines
    #[error("Outbox full")]
    QueueFull,

    /// The writer side of the outbox has gone away
    #[error("Channel closed")]
    ChannelClosed,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Too many command-line arguments
    #[error("[USAGE]: ./TCPChat $port")]
    Usage,

    /// Port argument is not a valid TCP port
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}
