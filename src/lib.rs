//! Multi-user TCP Chat Relay Library
//!
//! A line-based chat relay built on tokio: clients connect over plain TCP,
//! pick a unique display name and exchange public and private messages.
//!
//! # Features
//! - Name registration with uniqueness and capacity limits
//! - Public chat with history replay for late joiners
//! - Renaming (`-n <name>`) and whispers (`-w <recipient> <message>`)
//! - Append-only transcript of public lines
//!
//! # Architecture
//! Shared state behind one lock, with two tasks per connection:
//! - `ChatServer` holds the registry and history under a `parking_lot::Mutex`
//! - Each connection has a reader task dispatching commands
//! - Each connection has a writer task draining a bounded outbox
//! - Delivery never waits: a full outbox drops the line
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{ChatServer, Config, Transcript};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(&config.listen).await.unwrap();
//!
//!     ChatServer::new(&config, Transcript::disabled()).run(listener).await;
//! }
//! ```

pub mod broadcast;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod history;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
pub mod transcript;
pub mod types;

// Re-export main types for convenience
pub use command::Command;
pub use config::Config;
pub use error::{ChatError, ConfigError, SendError};
pub use handler::handle_connection;
pub use history::History;
pub use message::Notice;
pub use registry::Registry;
pub use server::{ChatServer, Joined};
pub use session::Session;
pub use transcript::Transcript;
pub use types::SessionId;
