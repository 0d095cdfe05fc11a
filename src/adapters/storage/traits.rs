//! Storage backend abstraction
//!
//! This module defines the capability every dataset backend implements so
//! the record store can treat a local file, a hosted table, and a hosted
//! spreadsheet interchangeably.

use crate::config::BackendKind;
use crate::domain::{InvoiceRecord, Result, Snapshot};
use async_trait::async_trait;

/// Persistence capability shared by all backends
///
/// Backends are selected by configuration and used through
/// `Arc<dyn StorageBackend>`. Every write is all-or-nothing: on error the
/// persisted dataset is exactly what it was before the call.
///
/// Errors that mean "try another backend" (unreachable, misconfigured,
/// rejected credentials) must be reported as
/// [`InventoryError::BackendUnavailable`](crate::domain::InventoryError::BackendUnavailable);
/// anything else stops the fallback chain.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which variant this is
    fn kind(&self) -> BackendKind;

    /// Name used in logs and error messages
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Load the complete dataset
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the backend cannot be reached, or
    /// `Serialization` if stored rows cannot be decoded.
    async fn load(&self) -> Result<Snapshot>;

    /// Replace-if-present, insert-if-absent by natural key
    ///
    /// Records not named in `records` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write did not take effect.
    async fn upsert(&self, records: &[InvoiceRecord]) -> Result<()>;

    /// Persist `snapshot` as the complete dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the write did not take effect.
    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()>;
}
