//! Results reported by the record store

use crate::config::BackendKind;
use crate::domain::Snapshot;
use std::fmt;

/// Whether a save landed where it was supposed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// A remote backend, or the first configured backend, accepted the write
    Primary,
    /// Every remote backend was unavailable and only the local file has it
    LocalOnly,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Primary => "primary",
            SaveStatus::LocalOnly => "local-only",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful save or upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Backend that accepted the write
    pub backend: BackendKind,

    /// Store generation after the write
    pub generation: u64,

    /// Primary or local-only
    pub status: SaveStatus,

    /// Backends skipped as unavailable before one accepted, in order
    pub skipped: Vec<BackendKind>,

    /// SHA-256 of the canonical CSV rendering of what was written
    pub checksum: String,
}

impl SaveOutcome {
    pub fn is_local_only(&self) -> bool {
        self.status == SaveStatus::LocalOnly
    }
}

/// Answer to [`RecordStore::load_if_changed`](super::RecordStore::load_if_changed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No save since the caller's generation
    Unchanged { generation: u64 },
    /// Fresh content and the generation it belongs to
    Changed { generation: u64, snapshot: Snapshot },
}

impl LoadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            LoadOutcome::Unchanged { generation } | LoadOutcome::Changed { generation, .. } => {
                *generation
            }
        }
    }
}
