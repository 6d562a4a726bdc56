//! Last-resort message sinks.
//!
//! When no transport delivers a message it is handed to a [`MessageSink`].
//! - [`JsonlSink`] appends one JSON object per line to a file
//! - [`LogSink`] emits the message as a structured log event

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::contact::ContactMessage;

/// Errors returned by sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing to storage failed.
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),
    /// The message could not be serialized.
    #[error("sink serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable fallback for messages no transport delivered.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Record one message.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the message could not be recorded.
    async fn record(&self, message: &ContactMessage) -> Result<(), SinkError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Append-only JSON Lines file sink.
///
/// Appends are serialized so concurrent submissions never interleave lines.
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    /// Create a sink writing to `path`. The file and its parent directory are
    /// created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MessageSink for JsonlSink {
    async fn record(&self, message: &ContactMessage) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        info!(id = %message.id(), path = %self.path.display(), "contact message stored");
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Sink that only logs the message. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn record(&self, message: &ContactMessage) -> Result<(), SinkError> {
        info!(
            id = %message.id(),
            name = message.name(),
            email = message.email(),
            subject = message.subject(),
            message = message.body(),
            submitted_at = %message.submitted_at().to_rfc3339(),
            "contact form submission"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
