//! Line rendering and fixed server texts
//!
//! Every outbound chat line is rendered exactly once, at the point it is
//! created; the resulting string is what goes into history and outboxes.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::types::timestamp;

/// Greeting written to a fresh connection, ending in the name prompt
pub const WELCOME_BANNER: &str = "Welcome to TCP-Chat!\n";

/// Name prompt, written without a trailing newline
pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]: ";

/// Rename rejected: invalid candidate
pub const RENAME_INVALID: &str = "[SERVER]: Invalid new name. Please try again.";

/// Rename rejected: candidate already in use
pub const RENAME_TAKEN: &str = "[SERVER]: Name already taken. Please choose a different name.";

/// Author tag used for system notices
const SERVER_AUTHOR: &str = "SERVER";

/// System notice broadcast to everyone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A session finished registering
    Joined(String),
    /// A session disconnected
    Left(String),
    /// A session changed its name
    Renamed { old: String, new: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Joined(name) => write!(f, "{} joined our chat", name),
            Notice::Left(name) => write!(f, "{} left our chat", name),
            Notice::Renamed { old, new } => write!(f, "{} changed their name to {}", old, new),
        }
    }
}

/// Render a chat line: `[ts][author]: body`
pub fn chat_line(at: &DateTime<Local>, author: &str, body: &str) -> Arc<str> {
    Arc::from(format!("[{}][{}]: {}", timestamp(at), author, body))
}

/// Render a system notice: `[ts][SERVER]: text`
pub fn notice_line(at: &DateTime<Local>, notice: &Notice) -> Arc<str> {
    chat_line(at, SERVER_AUTHOR, &notice.to_string())
}

/// Render a private message: `[ts][sender] whispers: body`
pub fn whisper_line(at: &DateTime<Local>, sender: &str, body: &str) -> Arc<str> {
    Arc::from(format!("[{}][{}] whispers: {}", timestamp(at), sender, body))
}

/// Reply for a dash-prefixed line that is not a command
pub fn unknown_command(line: &str) -> Arc<str> {
    Arc::from(format!("{} is not a command. try -h", line))
}

/// Usage reply for `-n` without a name
pub fn rename_usage() -> Arc<str> {
    Arc::from("Usage:\n-n [new-name]")
}

/// Usage reply for `-w` without a recipient
pub fn whisper_usage() -> Arc<str> {
    Arc::from("Usage:\n-w [recipient] [message]")
}

/// Static command manual
pub fn render_manual() -> Arc<str> {
    let mut manual = String::new();
    manual.push_str("TCP-Chat Manual\n");
    manual.push_str("--------------------------\n");
    manual.push_str("Commands:\n");
    manual.push_str("  -h, -help                          Show this help manual.\n");
    manual.push_str("  -n, -name <new-name>               Change your nickname.\n");
    manual.push_str("  -w, -whisper <recipient> <message> Send a private message.\n");
    manual.push_str("  <message>                          Send a chat message to everyone.\n");
    manual.push('\n');
    manual.push_str("  To leave the server, press: Ctrl + C\n");
    manual.push('\n');
    manual.push_str("Enjoy chatting!");
    Arc::from(manual)
}
