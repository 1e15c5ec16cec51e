//! Client command parsing
//!
//! Classifies one inbound line in a single tokenizing pass. Dispatch then
//! matches on the resulting variant.

/// A classified client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `-h` / `-help`
    Help,
    /// `-n` / `-name` with an optional new name
    Rename { name: Option<String> },
    /// `-w` / `-whisper` with an optional recipient and the remaining words
    Whisper {
        recipient: Option<String>,
        body: String,
    },
    /// Dash-prefixed line that matches no command
    Unknown(String),
    /// Anything else: a public chat message
    Chat(String),
}

impl Command {
    /// Classify a raw line
    ///
    /// Returns `None` for a blank line, which is dropped without a reply.
    pub fn parse(line: &str) -> Option<Self> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }

        let mut tokens = text.split_whitespace();
        let first = tokens.next()?;

        let command = match first {
            "-h" | "-help" if text == first => Command::Help,
            "-n" | "-name" => Command::Rename {
                name: tokens.next().map(str::to_string),
            },
            "-w" | "-whisper" => Command::Whisper {
                recipient: tokens.next().map(str::to_string),
                body: tokens.collect::<Vec<_>>().join(" "),
            },
            _ if first.starts_with('-') => Command::Unknown(text.to_string()),
            _ => Command::Chat(text.to_string()),
        };
        Some(command)
    }
}
