//! Transcript sink
//!
//! Persists every public line to an append-only file from a background
//! task. Recording never blocks, so it is safe to call under the server
//! lock, and the channel keeps lines in the order they were recorded.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::warn;

/// Handle to the transcript writer
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    sender: Option<mpsc::UnboundedSender<Arc<str>>>,
}

impl Transcript {
    /// Transcript that drops every line
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Spawn a writer task appending to `path`
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(write_transcript(path, receiver));
        Self {
            sender: Some(sender),
        }
    }

    /// Queue a public line for the file
    ///
    /// Only touches the channel, so it may be called under the server lock.
    pub fn record(&self, line: &Arc<str>) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Arc::clone(line));
        }
    }
}

async fn write_transcript(path: PathBuf, mut receiver: mpsc::UnboundedReceiver<Arc<str>>) {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create transcript directory {}: {}", dir.display(), e);
        }
    }

    let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Error opening transcript {}: {}", path.display(), e);
            return;
        }
    };

    while let Some(line) = receiver.recv().await {
        let write = async {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        };
        if let Err(e) = write.await {
            warn!("Error writing to transcript {}: {}", path.display(), e);
        }
    }
}
