//! Session registry
//!
//! The authoritative name -> Session map. Owns the uniqueness and capacity
//! invariants; callers wrap it in the server lock so every operation here is
//! a plain in-memory mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::session::Session;
use crate::types::SessionId;

/// Prefix shared by every client command
pub const COMMAND_PREFIX: char = '-';

/// Result of a successful registration
#[derive(Debug)]
pub struct Registered {
    /// ID of the new session
    pub id: SessionId,
    /// Name as stored in the registry (trimmed)
    pub name: String,
    /// Receiving end of the session's outbox, for the writer task
    pub outbox: mpsc::Receiver<Arc<str>>,
}

/// Validate a candidate display name
///
/// Returns the trimmed name. A name must be non-blank and must not start
/// with the command prefix. Interior spaces are allowed, but such a name
/// cannot be addressed by `-w`, which takes the recipient as one token.
pub fn validate_name(raw: &str) -> Result<&str, ChatError> {
    let name = raw.trim();
    if name.is_empty() || name.starts_with(COMMAND_PREFIX) {
        return Err(ChatError::NameInvalid);
    }
    Ok(name)
}

/// Name -> Session map with a fixed capacity
#[derive(Debug)]
pub struct Registry {
    sessions: HashMap<String, Session>,
    capacity: usize,
    outbox_capacity: usize,
}

impl Registry {
    /// Create an empty registry
    pub fn new(capacity: usize, outbox_capacity: usize) -> Self {
        Self {
            sessions: HashMap::with_capacity(capacity),
            capacity,
            outbox_capacity,
        }
    }

    /// Register a new session under `name`
    ///
    /// The name is validated first; a full registry rejects before the
    /// uniqueness check so the client is never asked to retry.
    pub fn register(&mut self, name: &str) -> Result<Registered, ChatError> {
        let name = validate_name(name)?;
        if self.is_full() {
            return Err(ChatError::RegistryFull);
        }
        if self.sessions.contains_key(name) {
            return Err(ChatError::NameTaken);
        }

        let (session, outbox) = Session::new(name.to_string(), self.outbox_capacity);
        let id = session.id;
        self.sessions.insert(name.to_string(), session);

        Ok(Registered {
            id,
            name: name.to_string(),
            outbox,
        })
    }

    /// Move a session from `old` to `new`
    ///
    /// Either both the key and the stored name change, or nothing does.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), ChatError> {
        let new = validate_name(new)?;
        if self.sessions.contains_key(new) {
            return Err(ChatError::NameTaken);
        }
        let mut session = self
            .sessions
            .remove(old)
            .ok_or(ChatError::SessionNotFound)?;
        session.set_name(new.to_string());
        self.sessions.insert(new.to_string(), session);
        Ok(())
    }

    /// Remove a session, closing its outbox
    ///
    /// The connection itself is left for the caller to close.
    pub fn deregister(&mut self, name: &str) -> bool {
        self.sessions.remove(name).is_some()
    }

    /// Look up a session by name
    pub fn lookup(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    /// Current name of the session with the given ID
    pub fn name_of(&self, id: SessionId) -> Option<&str> {
        self.sessions
            .values()
            .find(|session| session.id == id)
            .map(Session::name)
    }

    /// Copy of all registered names
    pub fn snapshot_names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    /// Iterate over all sessions
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.capacity
    }
}
