//! TCP connection handler
//!
//! Drives one connection through its lifecycle: name handshake, the paired
//! writer task, the read loop and teardown.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::dispatcher::dispatch;
use crate::error::ChatError;
use crate::message::{NAME_PROMPT, WELCOME_BANNER};
use crate::server::{ChatServer, Joined};
use crate::types::SessionId;

type LineReader = FramedRead<OwnedReadHalf, LinesCodec>;
type LineWriter = FramedWrite<OwnedWriteHalf, LinesCodec>;

/// How long the writer may keep flushing after the session has left
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle a new TCP connection
///
/// Errors end only this connection. A full server, or a client that
/// hangs up before picking a name, is a normal return.
pub async fn handle_connection(stream: TcpStream, server: ChatServer) -> Result<(), ChatError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(server.max_line_length()),
    );
    let mut writer = FramedWrite::new(write_half, LinesCodec::new());

    let Some(joined) = register(&server, &mut reader, &mut writer, &peer_addr).await? else {
        return Ok(());
    };

    let id = joined.id;
    info!("Client {} joined as '{}' from {}", id, joined.name, peer_addr);

    let write_task = tokio::spawn(write_lines(writer, joined.backlog, joined.outbox));

    let result = read_lines(&server, id, &mut reader).await;

    // Deregistering drops the outbox sender, which ends the writer
    if let Some(name) = server.leave(id) {
        info!("Client {} ('{}') disconnected", id, name);
    }
    if !finish_writer(write_task, WRITER_DRAIN_TIMEOUT).await {
        debug!("Writer for {} did not drain in time, closing", id);
    }

    result
}

/// Wait for a closed outbox to drain, aborting the writer after `limit`
///
/// A peer that stopped reading would otherwise keep the socket open until
/// the kernel gives up on it. Returns false if the writer was aborted.
async fn finish_writer(mut task: JoinHandle<()>, limit: Duration) -> bool {
    match timeout(limit, &mut task).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Write task panicked: {}", e);
            true
        }
        Err(_) => {
            task.abort();
            false
        }
    }
}

/// Prompt for a name until registration succeeds
///
/// Invalid and taken names re-prompt. Returns `None` when the client
/// disconnects first or the server is full.
async fn register(
    server: &ChatServer,
    reader: &mut LineReader,
    writer: &mut LineWriter,
    peer_addr: &str,
) -> Result<Option<Joined>, ChatError> {
    send_raw(writer, WELCOME_BANNER).await?;
    send_raw(writer, NAME_PROMPT).await?;

    loop {
        let Some(line) = reader.next().await.transpose()? else {
            debug!("{} disconnected before registering", peer_addr);
            return Ok(None);
        };

        match server.join(&line) {
            Ok(joined) => return Ok(Some(joined)),
            Err(e @ ChatError::RegistryFull) => {
                info!("Rejecting {}: {}", peer_addr, e);
                writer.send(e.to_string()).await?;
                SinkExt::<String>::close(writer).await?;
                return Ok(None);
            }
            Err(e @ (ChatError::NameInvalid | ChatError::NameTaken)) => {
                writer.send(e.to_string()).await?;
                send_raw(writer, NAME_PROMPT).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Write text that is not a complete line, such as the name prompt
async fn send_raw(writer: &mut LineWriter, text: &str) -> Result<(), ChatError> {
    let stream = writer.get_mut();
    stream.write_all(text.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Read loop: dispatch each line until EOF or a read error
async fn read_lines(
    server: &ChatServer,
    id: SessionId,
    reader: &mut LineReader,
) -> Result<(), ChatError> {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(line) => {
                if let Some(command) = Command::parse(&line) {
                    dispatch(server, id, command);
                }
            }
            Err(e) => {
                warn!("Read error from {}: {}", id, e);
                return Err(e.into());
            }
        }
    }
    debug!("Client {} closed the connection", id);
    Ok(())
}

/// Writer task: replay the backlog, then drain the outbox
///
/// Stops when the outbox is closed or a write fails. Write failures are
/// not reported further; the read loop notices the dead socket on its own.
async fn write_lines(
    mut writer: LineWriter,
    backlog: Vec<Arc<str>>,
    mut outbox: mpsc::Receiver<Arc<str>>,
) {
    for line in backlog {
        if let Err(e) = writer.feed(line).await {
            debug!("History replay failed: {}", e);
            return;
        }
    }

    loop {
        if let Err(e) = SinkExt::<Arc<str>>::flush(&mut writer).await {
            debug!("Write failed, ending write task: {}", e);
            return;
        }
        let Some(line) = outbox.recv().await else {
            break;
        };
        if let Err(e) = writer.feed(line).await {
            debug!("Write failed, ending write task: {}", e);
            return;
        }
    }

    debug!("Write task ended");
    let _ = SinkExt::<Arc<str>>::close(&mut writer).await;
}
