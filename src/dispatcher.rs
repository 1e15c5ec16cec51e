//! Command dispatcher
//!
//! Turns one classified client line into registry, history and broadcast
//! operations. Replies that only concern the sender bypass history.

use tracing::{debug, info};

use crate::command::Command;
use crate::error::ChatError;
use crate::message;
use crate::server::ChatServer;
use crate::types::SessionId;

/// Handle one classified line from session `id`
pub fn dispatch(server: &ChatServer, id: SessionId, command: Command) {
    match command {
        Command::Help => {
            server.reply(id, message::render_manual());
        }
        Command::Rename { name: None } => {
            server.reply(id, message::rename_usage());
        }
        Command::Rename { name: Some(name) } => handle_rename(server, id, &name),
        Command::Whisper {
            recipient: None, ..
        } => {
            server.reply(id, message::whisper_usage());
        }
        Command::Whisper {
            recipient: Some(recipient),
            body,
        } => handle_whisper(server, id, &recipient, &body),
        Command::Unknown(text) => {
            server.reply(id, message::unknown_command(&text));
        }
        Command::Chat(body) => {
            if let Err(e) = server.chat(id, &body) {
                debug!("Chat from {} dropped: {}", id, e);
            }
        }
    }
}

fn handle_rename(server: &ChatServer, id: SessionId, name: &str) {
    match server.rename(id, name) {
        Ok(old) => info!("Session {} renamed from '{}' to '{}'", id, old, name),
        Err(ChatError::NameInvalid) => {
            server.reply(id, message::RENAME_INVALID.into());
        }
        Err(ChatError::NameTaken) => {
            server.reply(id, message::RENAME_TAKEN.into());
        }
        Err(e) => debug!("Rename for {} failed: {}", id, e),
    }
}

fn handle_whisper(server: &ChatServer, id: SessionId, recipient: &str, body: &str) {
    match server.whisper(id, recipient, body) {
        Ok(()) => {}
        Err(e @ ChatError::RecipientNotFound(_)) => {
            server.reply(id, e.to_string().into());
        }
        Err(e) => debug!("Whisper from {} failed: {}", id, e),
    }
}
