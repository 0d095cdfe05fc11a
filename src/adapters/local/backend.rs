//! Local CSV file backend
//!
//! Writers take the dataset lock, write the complete snapshot to a temp file
//! in the destination's directory, fsync it, and rename it over the
//! destination. Readers take no lock: the rename is atomic, so a reader sees
//! either the previous file or the new one.

use super::lock::{FileLock, LockWait};
use crate::adapters::storage::row::{parse_csv, render_csv};
use crate::adapters::storage::traits::StorageBackend;
use crate::config::{BackendKind, LocalFileConfig};
use crate::core::retry::{Clock, SystemClock};
use crate::domain::{InventoryError, InvoiceRecord, Result, Snapshot};
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Complete new content written next to the destination, not yet visible
///
/// Dropping a staged write without committing deletes the temp file and
/// leaves the destination untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedWrite {
    /// Writes and fsyncs `bytes` into a temp file beside `destination`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the temp file cannot be created or written.
    pub fn stage(destination: &Path, bytes: &[u8]) -> Result<Self> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Atomically replaces the destination with the staged content
    ///
    /// # Errors
    ///
    /// Returns `Io` if the rename fails; the destination is then unchanged.
    pub fn commit(self) -> Result<()> {
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| InventoryError::Io(format!("atomic rename failed: {}", e.error)))?;

        // The new content is in place either way; only durability is in doubt
        if let Err(e) = sync_parent_dir(&destination) {
            tracing::warn!(
                path = %destination.display(),
                error = %e,
                "Directory fsync after rename failed"
            );
        }

        Ok(())
    }
}

/// Fsyncs the directory holding `path` so a rename into it survives a crash
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::File::open(parent)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Dataset stored as one CSV file on local disk
pub struct LocalFileBackend {
    path: PathBuf,
    wait: LockWait,
    clock: Arc<dyn Clock>,
}

impl LocalFileBackend {
    /// Creates a backend using the real clock
    pub fn new(config: &LocalFileConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a backend that polls the lock on `clock`
    pub fn with_clock(config: &LocalFileConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            wait: LockWait {
                timeout: Duration::from_millis(config.lock_timeout_ms),
                poll_interval: Duration::from_millis(config.lock_poll_interval_ms),
                stale_after: Duration::from_secs(config.lock_stale_after_secs),
            },
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(&self) -> Result<Snapshot> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse_csv(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Dataset file missing, starting empty");
                Ok(Snapshot::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = render_csv(snapshot)?;
        let destination = self.path.clone();

        tokio::task::spawn_blocking(move || StagedWrite::stage(&destination, &bytes)?.commit())
            .await
            .map_err(|e| InventoryError::Io(format!("write task failed: {e}")))??;

        tracing::debug!(
            path = %self.path.display(),
            records = snapshot.len(),
            "Wrote dataset file"
        );
        Ok(())
    }

    async fn lock(&self, operation: &str) -> Result<FileLock> {
        FileLock::acquire(&self.path, operation, self.wait, self.clock.as_ref()).await
    }
}

#[async_trait]
impl StorageBackend for LocalFileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load(&self) -> Result<Snapshot> {
        self.read_snapshot().await
    }

    async fn upsert(&self, records: &[InvoiceRecord]) -> Result<()> {
        let lock = self.lock("upsert").await?;

        let mut snapshot = self.read_snapshot().await?;
        for record in records {
            snapshot.upsert(record.clone());
        }
        self.write_snapshot(&snapshot).await?;

        lock.release()
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let lock = self.lock("replace_all").await?;
        self.write_snapshot(snapshot).await?;
        lock.release()
    }
}
