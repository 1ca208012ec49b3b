//! Output sink boundary
//!
//! The engine hands a fully serialized document to an [`OutputSink`] and
//! does not know where it lands. Remote uploaders (object storage, file
//! sharing services) are external implementations of this trait; the crate
//! ships a filesystem sink and an in-memory sink for tests.

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Destination for a finished document
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Persist `payload` under `name`
    async fn store(&self, name: &str, payload: &[u8]) -> Result<()>;
}

/// Sink writing documents into a local directory
///
/// The directory is created on first use.
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    /// Create a sink rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl OutputSink for FsSink {
    async fn store(&self, name: &str, payload: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, payload).await?;
        tracing::info!(path = %path.display(), bytes = payload.len(), "document written");
        Ok(())
    }
}

/// Sink collecting documents in memory, for tests
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every stored (name, payload) pair
    pub async fn take(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = self.entries.lock().await;
        std::mem::take(&mut *entries)
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn store(&self, name: &str, payload: &[u8]) -> Result<()> {
        self.entries
            .lock()
            .await
            .push((name.to_string(), payload.to_vec()));
        Ok(())
    }
}
