//! Storage backend factory
//!
//! Builds the configured backends in priority order.

use super::traits::StorageBackend;
use crate::adapters::local::LocalFileBackend;
use crate::adapters::sheets::SpreadsheetBackend;
use crate::adapters::table::TableStoreBackend;
use crate::config::{BackendKind, StorageConfig};
use crate::core::retry::Clock;
use crate::domain::{InventoryError, Result};
use std::sync::Arc;

/// Creates one backend per entry of `storage.priority`, in order
///
/// `clock` drives lock polling and conflict backoff.
///
/// # Errors
///
/// Returns `Configuration` if a listed backend has no section or its client
/// cannot be built.
pub fn create_backends(
    storage: &StorageConfig,
    clock: Arc<dyn Clock>,
) -> Result<Vec<Arc<dyn StorageBackend>>> {
    storage
        .priority
        .iter()
        .map(|kind| create_backend(storage, *kind, clock.clone()))
        .collect()
}

fn create_backend(
    storage: &StorageConfig,
    kind: BackendKind,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn StorageBackend>> {
    let missing = || InventoryError::Configuration(format!("storage.{kind} section is missing"));

    let backend: Arc<dyn StorageBackend> = match kind {
        BackendKind::Table => {
            let config = storage.table.as_ref().ok_or_else(missing)?;
            tracing::info!(table = %config.table, "Creating table-store backend");
            Arc::new(TableStoreBackend::new(config)?)
        }
        BackendKind::Spreadsheet => {
            let config = storage.spreadsheet.as_ref().ok_or_else(missing)?;
            tracing::info!(worksheet = %config.worksheet, "Creating spreadsheet backend");
            Arc::new(SpreadsheetBackend::with_clock(config, clock)?)
        }
        BackendKind::Local => {
            let config = storage.local.as_ref().ok_or_else(missing)?;
            tracing::info!(path = %config.path, "Creating local file backend");
            Arc::new(LocalFileBackend::with_clock(config, clock))
        }
    };

    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, LocalFileConfig, TableStoreConfig};
    use crate::core::retry::SystemClock;

    #[test]
    fn test_backends_follow_priority() {
        let storage = StorageConfig {
            priority: vec![BackendKind::Table, BackendKind::Local],
            local: Some(LocalFileConfig {
                path: "inventario.csv".to_string(),
                lock_timeout_ms: 10_000,
                lock_poll_interval_ms: 250,
                lock_stale_after_secs: 300,
            }),
            table: Some(TableStoreConfig {
                base_url: "https://project.example.com".to_string(),
                api_key: secret_string("key"),
                table: "inventario".to_string(),
                timeout_seconds: 5,
            }),
            spreadsheet: None,
        };

        let backends = create_backends(&storage, Arc::new(SystemClock)).unwrap();
        let kinds: Vec<_> = backends.iter().map(|b| b.kind()).collect();
        assert_eq!(kinds, vec![BackendKind::Table, BackendKind::Local]);
    }

    #[test]
    fn test_missing_section_is_configuration_error() {
        let storage = StorageConfig {
            priority: vec![BackendKind::Spreadsheet],
            local: None,
            table: None,
            spreadsheet: None,
        };

        let err = create_backends(&storage, Arc::new(SystemClock))
            .err()
            .unwrap();
        assert!(matches!(err, InventoryError::Configuration(_)));
    }
}
