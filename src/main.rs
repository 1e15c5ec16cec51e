//! TCP Chat Relay - Entry Point
//!
//! Loads configuration, starts the TCP listener and serves connections.

use std::env;
use std::process;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{ChatServer, Config, ConfigError, Transcript};

/// Environment variable naming an optional TOML config file
const CONFIG_ENV: &str = "CHAT_RELAY_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let base = match env::var(CONFIG_ENV) {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::default(),
    };

    // Port from command line, e.g. `chat_relay 2525`
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match base.with_args(&args) {
        Ok(config) => config,
        Err(e @ ConfigError::Usage) => {
            println!("{}", e);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let transcript = match &config.transcript {
        Some(path) => Transcript::open(path.clone()),
        None => Transcript::disabled(),
    };

    let listener = TcpListener::bind(&config.listen).await?;
    info!("Listening on {}", config.listen);

    ChatServer::new(&config, transcript).run(listener).await;
    Ok(())
}
