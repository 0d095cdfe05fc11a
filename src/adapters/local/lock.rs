//! Exclusive lock file for the local dataset
//!
//! The lock is a sibling file `<dataset>.lock` created with create-exclusive
//! semantics. Its JSON body names the holder so a timed-out writer can say
//! who it was waiting on. The file is removed when the guard is dropped, on
//! every exit path.
//!
//! A lock whose holder process is gone, or which is older than the stale
//! bound, is abandoned. So is a body that stays unreadable across two polls.
//! Abandoned locks are renamed to `<dataset>.lock.<reason>.<millis>` and the
//! waiter takes a fresh one.

use crate::core::retry::Clock;
use crate::domain::{InventoryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Body of the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub operation: String,
}

impl LockInfo {
    fn describe(&self) -> String {
        format!(
            "pid {} ({}) since {}",
            self.pid,
            self.operation,
            self.acquired_at.to_rfc3339()
        )
    }

    /// Why this holder no longer counts, if it doesn't
    fn abandoned_reason(&self, now: DateTime<Utc>, stale_after: Duration) -> Option<&'static str> {
        if !pid_is_alive(self.pid) {
            return Some("dead");
        }
        let age = (now - self.acquired_at).to_std().unwrap_or_default();
        (age > stale_after).then_some("stale")
    }
}

/// How long to wait for the lock, how often to look, and when a holder
/// is presumed gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub stale_after: Duration,
}

/// What the current lock file says about its holder
enum Holder {
    Live(LockInfo),
    Abandoned(&'static str),
    Unreadable,
    Gone,
}

/// Held lock; released on drop
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    released: bool,
}

impl FileLock {
    /// Lock file path for a dataset file
    pub fn path_for(dataset: &Path) -> PathBuf {
        let mut name = dataset.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquires the lock for `dataset`, polling until `wait.timeout`
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` naming the current holder if the lock is still
    /// taken after the wait bound, or `Io` if the lock file cannot be created
    /// for any other reason.
    pub async fn acquire(
        dataset: &Path,
        operation: &str,
        wait: LockWait,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let path = Self::path_for(dataset);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let started = clock.now();
        let mut attempts: u32 = 0;
        let mut unreadable_before = false;

        loop {
            attempts += 1;
            let info = LockInfo {
                pid: std::process::id(),
                acquired_at: clock.now(),
                operation: operation.to_string(),
            };

            match try_create(&path, &info).await {
                Ok(()) => {
                    tracing::debug!(
                        lock = %path.display(),
                        operation,
                        attempts,
                        "Acquired dataset lock"
                    );
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }

            let holder = match inspect_holder(&path, clock.now(), wait.stale_after).await {
                Holder::Gone => continue,
                Holder::Abandoned(reason) => {
                    archive_abandoned(&path, reason, clock.now()).await?;
                    continue;
                }
                // A writer between create and write shows an empty body
                // for a moment, so only a body that stays bad is corrupt
                Holder::Unreadable if unreadable_before => {
                    archive_abandoned(&path, "corrupt", clock.now()).await?;
                    unreadable_before = false;
                    continue;
                }
                Holder::Unreadable => {
                    unreadable_before = true;
                    "unknown holder".to_string()
                }
                Holder::Live(info) => {
                    unreadable_before = false;
                    info.describe()
                }
            };

            let waited = (clock.now() - started).to_std().unwrap_or_default();
            if waited >= wait.timeout {
                tracing::warn!(
                    lock = %path.display(),
                    waited_ms = waited.as_millis() as u64,
                    holder = %holder,
                    "Timed out waiting for dataset lock"
                );
                return Err(InventoryError::LockTimeout {
                    path: path.display().to_string(),
                    waited_ms: waited.as_millis() as u64,
                    holder,
                });
            }

            tracing::debug!(lock = %path.display(), attempts, "Dataset lock busy, waiting");
            clock.sleep(wait.poll_interval).await;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock, reporting a failure to remove the file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the lock file exists but cannot be removed.
    pub fn release(mut self) -> Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::error!(lock = %self.path.display(), error = %e, "Failed to release dataset lock");
        }
    }
}

async fn try_create(path: &Path, info: &LockInfo) -> std::io::Result<()> {
    let body = serde_json::to_vec(info).map_err(std::io::Error::other)?;
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = match file.write_all(&body).await {
        Ok(()) => file.sync_all().await,
        Err(e) => Err(e),
    };
    drop(file);

    match written {
        Ok(()) => Ok(()),
        Err(e) => Err(discard_partial_lock(path, e).await),
    }
}

/// Removes a lock file this process created but could not finish writing
async fn discard_partial_lock(path: &Path, error: std::io::Error) -> std::io::Error {
    if let Err(remove_error) = tokio::fs::remove_file(path).await {
        tracing::error!(
            lock = %path.display(),
            error = %remove_error,
            "Failed to remove half-written dataset lock"
        );
    }
    error
}

async fn inspect_holder(path: &Path, now: DateTime<Utc>, stale_after: Duration) -> Holder {
    let body = match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => return Holder::Gone,
        Err(_) => return Holder::Unreadable,
    };
    match serde_json::from_str::<LockInfo>(&body) {
        Ok(info) => match info.abandoned_reason(now, stale_after) {
            Some(reason) => {
                tracing::warn!(
                    lock = %path.display(),
                    holder = %info.describe(),
                    reason,
                    "Dataset lock holder is gone"
                );
                Holder::Abandoned(reason)
            }
            None => Holder::Live(info),
        },
        Err(_) => Holder::Unreadable,
    }
}

/// Moves an abandoned lock aside so a new one can be created
async fn archive_abandoned(path: &Path, reason: &str, now: DateTime<Utc>) -> Result<()> {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{reason}.{}", now.timestamp_millis()));
    let archived = PathBuf::from(name);

    match tokio::fs::rename(path, &archived).await {
        Ok(()) => {
            tracing::warn!(
                lock = %path.display(),
                archived = %archived.display(),
                reason,
                "Reclaimed abandoned dataset lock"
            );
            Ok(())
        }
        // Someone else reclaimed or released it first
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(target_os = "linux")]
fn pid_is_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

// Without procfs there is no cheap liveness check; age alone decides
#[cfg(not(target_os = "linux"))]
fn pid_is_alive(_pid: u32) -> bool {
    true
}
