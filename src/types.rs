//! Basic type definitions for the chat relay
//!
//! Provides:
//! - `SessionId`: UUID-based identity that survives renames
//! - `timestamp`: the server clock formatting used in rendered lines

use chrono::{DateTime, Local};
use uuid::Uuid;

/// Timestamp format used in every rendered line (`YYYY-MM-DD HH:MM:SS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unique session identifier (newtype pattern)
///
/// A session's display name can change at any time, so connection tasks
/// hold on to this ID and resolve the current name through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format a point in time the way it appears inside `[...]` brackets
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
