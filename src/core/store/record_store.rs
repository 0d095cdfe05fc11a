//! Record store facade
//!
//! Owns the persisted snapshot. Backends are tried in priority order; a
//! backend reporting `BackendUnavailable` is skipped and the next one gets
//! the whole operation. Any other error ends the chain, so one save never
//! lands partly in one backend and partly in another.
//!
//! Every successful write invalidates the read cache and bumps the
//! generation counter before returning, so the next `load()` in this process
//! always sees it.

use super::outcome::{LoadOutcome, SaveOutcome, SaveStatus};
use crate::adapters::storage::factory::create_backends;
use crate::adapters::storage::row::snapshot_checksum;
use crate::adapters::storage::traits::StorageBackend;
use crate::config::{BackendKind, InventoryConfig};
use crate::core::retry::{Clock, SystemClock};
use crate::domain::{InventoryError, InvoiceRecord, Result, Snapshot};
use crate::{log_backend_fallback, log_save_outcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Facade over the configured backends
pub struct RecordStore {
    backends: Vec<Arc<dyn StorageBackend>>,
    cache: Mutex<Option<Snapshot>>,
    generation: AtomicU64,
}

impl RecordStore {
    /// Creates a store over backends already in priority order
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `backends` is empty.
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>) -> Result<Self> {
        if backends.is_empty() {
            return Err(InventoryError::Configuration(
                "record store needs at least one backend".to_string(),
            ));
        }

        Ok(Self {
            backends,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Builds the configured backends and a store over them
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a backend cannot be created.
    pub fn from_config(config: &InventoryConfig) -> Result<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`from_config`](Self::from_config), waiting on `clock`
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a backend cannot be created.
    pub fn from_config_with_clock(config: &InventoryConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(create_backends(&config.storage, clock)?)
    }

    /// Backend kinds in priority order
    pub fn priority(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Incremented on every successful save or upsert
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Drops the cached snapshot
    pub fn invalidate_cache(&self) {
        *self.cache_slot() = None;
    }

    fn cache_slot(&self) -> MutexGuard<'_, Option<Snapshot>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the full current snapshot
    ///
    /// Served from cache when nothing was saved since the last load;
    /// otherwise from the first backend that answers.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if no backend answers.
    pub async fn load(&self) -> Result<Snapshot> {
        let cached = self.cache_slot().clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }

        let mut reasons = Vec::new();
        for backend in &self.backends {
            match backend.load().await {
                Ok(snapshot) => {
                    tracing::debug!(
                        backend = backend.name(),
                        records = snapshot.len(),
                        "Loaded snapshot"
                    );
                    *self.cache_slot() = Some(snapshot.clone());
                    return Ok(snapshot);
                }
                Err(e) if e.is_backend_unavailable() => {
                    log_backend_fallback!(backend.name(), e);
                    reasons.push(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Err(all_unavailable(reasons))
    }

    /// Returns fresh content only if something was saved since `last_seen`
    ///
    /// Pass `None` to always load.
    ///
    /// # Errors
    ///
    /// Returns the error of [`load`](Self::load).
    pub async fn load_if_changed(&self, last_seen: Option<u64>) -> Result<LoadOutcome> {
        let generation = self.generation();
        if last_seen == Some(generation) {
            return Ok(LoadOutcome::Unchanged { generation });
        }

        let snapshot = self.load().await?;
        Ok(LoadOutcome::Changed {
            generation,
            snapshot,
        })
    }

    /// Persists `snapshot` as the complete dataset
    ///
    /// With `verify_key`, the accepting backend is reloaded afterwards and
    /// must contain a record with that natural key.
    ///
    /// # Errors
    ///
    /// - `BackendUnavailable` if every backend was unavailable
    /// - `VerificationFailure` if the write reported success but the key is
    ///   absent on reload
    /// - any non-fallthrough error of the first backend that raised one
    pub async fn save(&self, snapshot: &Snapshot, verify_key: Option<&str>) -> Result<SaveOutcome> {
        let checksum = snapshot_checksum(snapshot)?;
        let keys: Vec<&str> = verify_key.into_iter().collect();

        self.write_through(snapshot.len(), checksum, &keys, |backend| {
            let snapshot = snapshot.clone();
            async move { backend.replace_all(&snapshot).await }
        })
        .await
    }

    /// Upserts `records` by natural key through the same fallback chain
    ///
    /// Every upserted key is verified on the accepting backend.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn upsert(&self, records: &[InvoiceRecord]) -> Result<SaveOutcome> {
        let written = Snapshot::from_records(records.to_vec());
        let checksum = snapshot_checksum(&written)?;
        let keys: Vec<&str> = records.iter().map(|r| r.invoice_number.as_str()).collect();

        self.write_through(records.len(), checksum, &keys, |backend| {
            let records = records.to_vec();
            async move { backend.upsert(&records).await }
        })
        .await
    }

    async fn write_through<F, Fut>(
        &self,
        record_count: usize,
        checksum: String,
        verify_keys: &[&str],
        write: F,
    ) -> Result<SaveOutcome>
    where
        F: Fn(Arc<dyn StorageBackend>) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let mut skipped = Vec::new();
        let mut reasons = Vec::new();

        for backend in &self.backends {
            match write(backend.clone()).await {
                Ok(()) => {
                    self.invalidate_cache();
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    log_save_outcome!(backend.name(), record_count, generation);

                    if !verify_keys.is_empty() {
                        verify(backend.as_ref(), verify_keys).await?;
                    }

                    let status = if backend.kind() == BackendKind::Local
                        && skipped.iter().any(BackendKind::is_remote)
                    {
                        tracing::warn!(
                            skipped = ?skipped,
                            "Save accepted by local file only"
                        );
                        SaveStatus::LocalOnly
                    } else {
                        SaveStatus::Primary
                    };

                    return Ok(SaveOutcome {
                        backend: backend.kind(),
                        generation,
                        status,
                        skipped,
                        checksum,
                    });
                }
                Err(e) if e.is_backend_unavailable() => {
                    log_backend_fallback!(backend.name(), e);
                    skipped.push(backend.kind());
                    reasons.push(e.to_string());
                }
                Err(e) => {
                    tracing::error!(backend = backend.name(), error = %e, "Save failed");
                    return Err(e);
                }
            }
        }

        Err(all_unavailable(reasons))
    }
}

/// Reloads from the backend that accepted the write and checks every key
async fn verify(backend: &dyn StorageBackend, keys: &[&str]) -> Result<()> {
    let reloaded = backend.load().await?;
    for key in keys {
        if !reloaded.contains(key) {
            tracing::error!(
                backend = backend.name(),
                invoice_number = %key,
                "Saved invoice missing on reload"
            );
            return Err(InventoryError::VerificationFailure {
                invoice_number: key.to_string(),
                backend: backend.name().to_string(),
            });
        }
    }
    tracing::debug!(backend = backend.name(), keys = keys.len(), "Verified save");
    Ok(())
}

fn all_unavailable(reasons: Vec<String>) -> InventoryError {
    InventoryError::unavailable("all", reasons.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::testing::MemoryBackend;
    use crate::domain::{InvoiceId, InvoiceNumber, InvoiceStatus};

    fn record(id: &str, key: &str) -> InvoiceRecord {
        InvoiceRecord {
            id: InvoiceId::new(id),
            invoice_number: InvoiceNumber::new(key).unwrap(),
            amount: None,
            insurer_code: String::new(),
            coverage_year: None,
            status: InvoiceStatus::Pending,
            filed_date: None,
            last_transition_at: None,
            derived_month: String::new(),
            notes: String::new(),
        }
    }

    fn one(key: &str) -> Snapshot {
        Snapshot::from_records(vec![record("CHIA-0001", key)])
    }

    #[tokio::test]
    async fn test_save_then_load_sees_new_content() {
        let local = MemoryBackend::new(BackendKind::Local);
        let store = RecordStore::new(vec![local.boxed()]).unwrap();

        assert!(store.load().await.unwrap().is_empty());
        let outcome = store.save(&one("FAC-1"), Some("FAC-1")).await.unwrap();

        assert_eq!(outcome.status, SaveStatus::Primary);
        assert_eq!(outcome.generation, 1);
        assert!(store.load().await.unwrap().contains("FAC-1"));
    }

    #[tokio::test]
    async fn test_falls_through_to_local_and_tags_local_only() {
        let remote = MemoryBackend::unavailable(BackendKind::Table);
        let local = MemoryBackend::new(BackendKind::Local);
        let store = RecordStore::new(vec![remote.boxed(), local.boxed()]).unwrap();

        let outcome = store.save(&one("FAC-1"), Some("FAC-1")).await.unwrap();

        assert_eq!(outcome.backend, BackendKind::Local);
        assert!(outcome.is_local_only());
        assert_eq!(outcome.skipped, vec![BackendKind::Table]);
        assert_eq!(local.writes(), 1);
        assert_eq!(remote.writes(), 0);
        assert!(store.load().await.unwrap().contains("FAC-1"));
    }

    #[tokio::test]
    async fn test_fatal_error_stops_chain() {
        let remote = MemoryBackend::failing(BackendKind::Spreadsheet);
        let local = MemoryBackend::new(BackendKind::Local);
        let store = RecordStore::new(vec![remote.boxed(), local.boxed()]).unwrap();

        let err = store.save(&one("FAC-1"), None).await.unwrap_err();

        assert!(matches!(err, InventoryError::ConflictRetryExhausted { .. }));
        assert_eq!(local.writes(), 0);
        assert_eq!(store.generation(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_after_success_is_verification_failure() {
        let lossy = MemoryBackend::dropping_writes(BackendKind::Local);
        let store = RecordStore::new(vec![lossy.boxed()]).unwrap();

        let err = store.save(&one("FAC-1"), Some("FAC-1")).await.unwrap_err();

        match err {
            InventoryError::VerificationFailure { invoice_number, backend } => {
                assert_eq!(invoice_number, "FAC-1");
                assert_eq!(backend, "local");
            }
            other => panic!("expected VerificationFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_unavailable() {
        let store = RecordStore::new(vec![
            MemoryBackend::unavailable(BackendKind::Table).boxed(),
            MemoryBackend::unavailable(BackendKind::Local).boxed(),
        ])
        .unwrap();

        assert!(store.load().await.unwrap_err().is_backend_unavailable());
        assert!(store
            .save(&one("FAC-1"), None)
            .await
            .unwrap_err()
            .is_backend_unavailable());
    }

    #[tokio::test]
    async fn test_load_is_cached_until_save() {
        let local = MemoryBackend::new(BackendKind::Local);
        let store = RecordStore::new(vec![local.boxed()]).unwrap();

        store.load().await.unwrap();
        store.load().await.unwrap();
        assert_eq!(local.loads(), 1);

        store.save(&one("FAC-1"), None).await.unwrap();
        store.load().await.unwrap();
        assert_eq!(local.loads(), 2);
    }

    #[tokio::test]
    async fn test_load_if_changed_tracks_generation() {
        let store = RecordStore::new(vec![MemoryBackend::new(BackendKind::Local).boxed()]).unwrap();

        let first = store.load_if_changed(None).await.unwrap();
        assert!(matches!(first, LoadOutcome::Changed { generation: 0, .. }));
        assert_eq!(
            store.load_if_changed(Some(0)).await.unwrap(),
            LoadOutcome::Unchanged { generation: 0 }
        );

        store.save(&one("FAC-1"), None).await.unwrap();
        match store.load_if_changed(Some(0)).await.unwrap() {
            LoadOutcome::Changed {
                generation,
                snapshot,
            } => {
                assert_eq!(generation, 1);
                assert!(snapshot.contains("FAC-1"));
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upsert_verifies_every_key() {
        let local = MemoryBackend::new(BackendKind::Local);
        let store = RecordStore::new(vec![local.boxed()]).unwrap();
        store.save(&one("FAC-1"), None).await.unwrap();

        let outcome = store
            .upsert(&[record("CHIA-0002", "FAC-2"), record("CHIA-0003", "FAC-3")])
            .await
            .unwrap();

        assert_eq!(outcome.generation, 2);
        assert_eq!(store.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_equal_snapshots_have_equal_checksums() {
        let store = RecordStore::new(vec![MemoryBackend::new(BackendKind::Local).boxed()]).unwrap();
        let a = store.save(&one("FAC-1"), None).await.unwrap();
        let b = store.save(&one("FAC-1"), None).await.unwrap();
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn test_empty_backend_list_rejected() {
        assert!(RecordStore::new(Vec::new()).is_err());
    }
}
