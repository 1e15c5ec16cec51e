//! ChatServer shared state
//!
//! The registry and the history log live behind one `parking_lot::Mutex`,
//! so registering a session, taking its history snapshot and announcing it
//! happen as a single step relative to every other sender. Critical
//! sections only touch memory: enqueueing is non-blocking and the
//! transcript is fed through an unbounded channel. Logging and socket I/O
//! happen only after the lock is released.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::broadcast::{self, Fanout};
use crate::config::Config;
use crate::error::ChatError;
use crate::handler::handle_connection;
use crate::history::History;
use crate::message::{self, Notice};
use crate::registry::Registry;
use crate::transcript::Transcript;
use crate::types::SessionId;

/// First retry delay after a failed accept
const ACCEPT_BACKOFF_MIN_MS: u64 = 10;

/// Longest retry delay after repeated failed accepts
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// A freshly registered session, handed to its connection task
#[derive(Debug)]
pub struct Joined {
    /// Stable ID of the session
    pub id: SessionId,
    /// Name the session registered with
    pub name: String,
    /// History as it was just before the join notice
    pub backlog: Vec<Arc<str>>,
    /// Receiving end of the session's outbox
    pub outbox: mpsc::Receiver<Arc<str>>,
}

/// A public line that went into history, with its fan-out result
#[derive(Debug)]
#[must_use]
struct Published {
    line: Arc<str>,
    fanout: Fanout,
}

impl Published {
    /// Echo the line and any drops to the log; call with the lock released
    fn report(self) {
        info!(target: "chat_relay::transcript", "{}", self.line);
        for (name, e) in self.fanout.dropped {
            debug!("Dropping line for {}: {}", name, e);
        }
    }
}

/// Everything guarded by the server lock
#[derive(Debug)]
struct ServerState {
    registry: Registry,
    history: History,
}

impl ServerState {
    /// Append to history, persist, then fan out
    fn publish(&mut self, transcript: &Transcript, line: Arc<str>, exclude: Option<&str>) -> Published {
        self.history.append(Arc::clone(&line));
        transcript.record(&line);
        let fanout = broadcast::broadcast_all(&self.registry, &line, exclude);
        Published { line, fanout }
    }

    fn current_name(&self, id: SessionId) -> Result<String, ChatError> {
        self.registry
            .name_of(id)
            .map(str::to_string)
            .ok_or(ChatError::SessionNotFound)
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ServerState>,
    transcript: Transcript,
    echo_own_messages: bool,
    max_line_length: usize,
}

/// Cloneable handle to the relay state
///
/// Every connection task holds a clone; all of them see the same registry
/// and history.
#[derive(Debug, Clone)]
pub struct ChatServer {
    shared: Arc<Shared>,
}

impl ChatServer {
    /// Create a server with empty registry and history
    pub fn new(config: &Config, transcript: Transcript) -> Self {
        let state = ServerState {
            registry: Registry::new(config.max_sessions, config.outbox_capacity),
            history: History::new(),
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                transcript,
                echo_own_messages: config.echo_own_messages,
                max_line_length: config.max_line_length,
            }),
        }
    }

    /// Accept connections until the listener fails for good
    ///
    /// A failed accept is logged and retried after a short, growing delay.
    /// Each connection runs in its own task and its errors stay there.
    pub async fn run(self, listener: TcpListener) {
        info!("ChatServer started");
        let mut failures = 0u32;

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    failures = 0;
                    info!("New connection from {}", addr);
                    let server = self.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, server).await {
                            error!("Connection handler error for {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    error!("Failed to accept connection: {} (retrying in {:?})", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Register a session, snapshot history and announce the join
    ///
    /// The snapshot is taken before the join notice is published, so the
    /// new session sees the backlog followed by its own join notice and
    /// then live traffic, with nothing missing or repeated in between.
    pub fn join(&self, name: &str) -> Result<Joined, ChatError> {
        let (joined, published, total) = {
            let mut state = self.shared.state.lock();
            let registered = state.registry.register(name)?;
            let backlog = state.history.snapshot();

            let line = message::notice_line(&Local::now(), &Notice::Joined(registered.name.clone()));
            let published = state.publish(&self.shared.transcript, line, None);

            let joined = Joined {
                id: registered.id,
                name: registered.name,
                backlog,
                outbox: registered.outbox,
            };
            (joined, published, state.registry.len())
        };

        published.report();
        debug!(
            "Session {} registered as '{}', total sessions: {}",
            joined.id, joined.name, total
        );
        Ok(joined)
    }

    /// Deregister a session and announce the departure
    ///
    /// Returns the name the session had, or `None` if it was already gone.
    pub fn leave(&self, id: SessionId) -> Option<String> {
        let (name, published, total) = {
            let mut state = self.shared.state.lock();
            let name = state.current_name(id).ok()?;
            state.registry.deregister(&name);

            let line = message::notice_line(&Local::now(), &Notice::Left(name.clone()));
            let published = state.publish(&self.shared.transcript, line, None);
            (name, published, state.registry.len())
        };

        published.report();
        debug!("Session {} left, total sessions: {}", id, total);
        Some(name)
    }

    /// Publish a chat message from a session
    pub fn chat(&self, id: SessionId, body: &str) -> Result<(), ChatError> {
        let published = {
            let mut state = self.shared.state.lock();
            let name = state.current_name(id)?;
            let line = message::chat_line(&Local::now(), &name, body);

            let exclude = (!self.shared.echo_own_messages).then_some(name.as_str());
            state.publish(&self.shared.transcript, line, exclude)
        };

        published.report();
        Ok(())
    }

    /// Rename a session and announce it
    ///
    /// Returns the old name. On error the registry is left untouched.
    pub fn rename(&self, id: SessionId, new_name: &str) -> Result<String, ChatError> {
        let (old, published) = {
            let mut state = self.shared.state.lock();
            let old = state.current_name(id)?;
            state.registry.rename(&old, new_name)?;

            let notice = Notice::Renamed {
                old: old.clone(),
                new: new_name.trim().to_string(),
            };
            let line = message::notice_line(&Local::now(), &notice);
            (old, state.publish(&self.shared.transcript, line, None))
        };

        published.report();
        Ok(old)
    }

    /// Send a private message to `recipient`, echoed back to the sender
    ///
    /// Whispers never enter history or the transcript.
    pub fn whisper(&self, id: SessionId, recipient: &str, body: &str) -> Result<(), ChatError> {
        let delivered = {
            let state = self.shared.state.lock();
            let sender = state.current_name(id)?;
            if state.registry.lookup(recipient).is_none() {
                return Err(ChatError::RecipientNotFound(recipient.to_string()));
            }

            let line = message::whisper_line(&Local::now(), &sender, body);
            if recipient != sender {
                broadcast::send_to(&state.registry, &sender, &line);
            }
            broadcast::send_to(&state.registry, recipient, &line)
        };

        if !delivered {
            debug!("Whisper from {} to {} dropped", id, recipient);
        }
        Ok(())
    }

    /// Send a line to one session only, outside history
    pub fn reply(&self, id: SessionId, line: Arc<str>) -> bool {
        let state = self.shared.state.lock();
        match state.registry.name_of(id) {
            Some(name) => broadcast::send_to(&state.registry, name, &line),
            None => false,
        }
    }

    /// Current name of a session
    pub fn name_of(&self, id: SessionId) -> Option<String> {
        self.shared.state.lock().current_name(id).ok()
    }

    /// Snapshot of all registered names
    pub fn names(&self) -> Vec<String> {
        self.shared.state.lock().registry.snapshot_names()
    }

    /// Frozen copy of the history log
    pub fn history(&self) -> Vec<Arc<str>> {
        self.shared.state.lock().history.snapshot()
    }

    pub fn session_count(&self) -> usize {
        self.shared.state.lock().registry.len()
    }

    pub fn max_line_length(&self) -> usize {
        self.shared.max_line_length
    }
}

/// Delay before the next accept after `failures` consecutive errors
fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(10);
    Duration::from_millis(ACCEPT_BACKOFF_MIN_MS << exponent).min(ACCEPT_BACKOFF_MAX)
}
