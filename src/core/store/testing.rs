//! In-memory backend for unit tests

use crate::adapters::storage::traits::StorageBackend;
use crate::config::BackendKind;
use crate::domain::{InventoryError, InvoiceRecord, Result, Snapshot};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Healthy,
    Unavailable,
    Failing,
    DroppingWrites,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Snapshot,
    loads: usize,
    writes: usize,
}

/// Cloneable handle; clones share state
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    kind: BackendKind,
    mode: Mode,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    fn with_mode(kind: BackendKind, mode: Mode) -> Self {
        Self {
            kind,
            mode,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    pub fn new(kind: BackendKind) -> Self {
        Self::with_mode(kind, Mode::Healthy)
    }

    /// Every call fails with `BackendUnavailable`
    pub fn unavailable(kind: BackendKind) -> Self {
        Self::with_mode(kind, Mode::Unavailable)
    }

    /// Writes fail with `ConflictRetryExhausted`
    pub fn failing(kind: BackendKind) -> Self {
        Self::with_mode(kind, Mode::Failing)
    }

    /// Writes report success but store nothing
    pub fn dropping_writes(kind: BackendKind) -> Self {
        Self::with_mode(kind, Mode::DroppingWrites)
    }

    pub fn boxed(&self) -> Arc<dyn StorageBackend> {
        Arc::new(self.clone())
    }

    pub fn loads(&self) -> usize {
        self.state.lock().unwrap().loads
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().unwrap().snapshot.clone()
    }

    fn check_write(&self) -> Result<bool> {
        match self.mode {
            Mode::Unavailable => Err(InventoryError::unavailable(self.kind.as_str(), "offline")),
            Mode::Failing => Err(InventoryError::ConflictRetryExhausted {
                backend: self.kind.as_str().to_string(),
                attempts: 3,
            }),
            Mode::DroppingWrites => Ok(false),
            Mode::Healthy => Ok(true),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn load(&self) -> Result<Snapshot> {
        if self.mode == Mode::Unavailable {
            return Err(InventoryError::unavailable(self.kind.as_str(), "offline"));
        }
        let mut state = self.state.lock().unwrap();
        state.loads += 1;
        Ok(state.snapshot.clone())
    }

    async fn upsert(&self, records: &[InvoiceRecord]) -> Result<()> {
        let keep = self.check_write()?;
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        if keep {
            for record in records {
                state.snapshot.upsert(record.clone());
            }
        }
        Ok(())
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let keep = self.check_write()?;
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        if keep {
            state.snapshot = snapshot.clone();
        }
        Ok(())
    }
}
