//! Session struct definition
//!
//! Represents one registered client: its identity and the producer side of
//! its bounded outbox. The consumer side belongs to the connection's writer
//! task.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SendError;
use crate::types::SessionId;

/// Connected session information
///
/// Owned by the registry. Dropping the session drops the only outbox
/// sender, which closes the queue and lets the writer task finish.
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Display name, only changed through the registry
    name: String,
    /// Rendered lines waiting for the writer task
    outbox: mpsc::Sender<Arc<str>>,
}

impl Session {
    /// Create a session and the receiving end of its outbox
    pub fn new(name: String, outbox_capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (outbox, rx) = mpsc::channel(outbox_capacity);
        let session = Self {
            id: SessionId::new(),
            name,
            outbox,
        };
        (session, rx)
    }

    /// Get the current display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Enqueue a line without waiting
    ///
    /// Fails with `QueueFull` when the writer has fallen behind; the line is
    /// dropped rather than stalling the caller.
    pub fn deliver(&self, line: Arc<str>) -> Result<(), SendError> {
        self.outbox.try_send(line).map_err(|err| match err {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
