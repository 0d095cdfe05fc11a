//! Integration tests for the record store over real backends
//!
//! The table store is either a mock server or an address nothing listens
//! on; the local file lives in a scratch directory.

use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server};
use radicacion::adapters::local::LocalFileBackend;
use radicacion::adapters::StorageBackend;
use radicacion::config::{parse_config, BackendKind, InventoryConfig};
use radicacion::core::lifecycle::TransitionEngine;
use radicacion::core::retry::ManualClock;
use radicacion::core::store::{LoadOutcome, RecordStore, SaveStatus};
use radicacion::core::workflow::{InvoiceForm, InvoiceWorkflow};
use radicacion::domain::{
    InventoryError, InvoiceId, InvoiceNumber, InvoiceRecord, InvoiceStatus, Snapshot,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn table_then_local(table_url: &str, dataset: &Path) -> InventoryConfig {
    parse_config(&format!(
        r#"
[application]
id_prefix = "CHIA"

[storage]
priority = ["table", "local"]

[storage.local]
path = '{}'
lock_timeout_ms = 1000
lock_poll_interval_ms = 50

[storage.table]
base_url = "{}"
api_key = "service-role-key"
timeout_seconds = 2

[logging]
local_enabled = false
"#,
        dataset.display(),
        table_url
    ))
    .unwrap()
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 8, 9, 10, 0, 0).unwrap())
}

fn record(key: &str) -> InvoiceRecord {
    InvoiceRecord {
        id: InvoiceId::new("CHIA-0001"),
        invoice_number: InvoiceNumber::new(key).unwrap(),
        amount: None,
        insurer_code: "EPS001".to_string(),
        coverage_year: Some(2025),
        status: InvoiceStatus::Pending,
        filed_date: None,
        last_transition_at: None,
        derived_month: String::new(),
        notes: String::new(),
    }
}

#[tokio::test]
async fn test_unreachable_remote_falls_back_to_local_file() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("inventario_cuentas.csv");
    let config = table_then_local(UNREACHABLE, &dataset);
    let clock = clock();

    let store = Arc::new(RecordStore::from_config_with_clock(&config, Arc::new(clock.clone())).unwrap());
    let workflow = InvoiceWorkflow::new(
        store.clone(),
        TransitionEngine::new(config.application.id_prefix.clone()),
        Arc::new(clock),
    );

    let saved = workflow
        .save_invoice(
            &InvoiceForm {
                invoice_number: "FAC-1".to_string(),
                amount: "$ 1.250.000".to_string(),
                status: "Pendiente".to_string(),
                ..InvoiceForm::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(saved.outcome.status, SaveStatus::LocalOnly);
    assert!(saved.outcome.is_local_only());
    assert_eq!(saved.outcome.backend, BackendKind::Local);
    assert_eq!(saved.outcome.skipped, vec![BackendKind::Table]);
    assert_eq!(saved.record.id.as_str(), "CHIA-0001");

    // A later load still can't reach the table and answers from the file
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.find("FAC-1"), Some(&saved.record));

    let on_disk = LocalFileBackend::new(config.storage.local.as_ref().unwrap())
        .load()
        .await
        .unwrap();
    assert_eq!(on_disk, loaded);
}

#[tokio::test]
async fn test_reachable_remote_takes_the_save() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("inventario_cuentas.csv");
    let mut server = Server::new_async().await;

    let write = server
        .mock("POST", "/rest/v1/inventario")
        .match_query(Matcher::Any)
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let reload = server
        .mock("GET", "/rest/v1/inventario")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([{ "id": "CHIA-0001", "invoice_number": "FAC-1", "status": "Pending" }])
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let config = table_then_local(&server.url(), &dataset);
    let store = RecordStore::from_config(&config).unwrap();

    let outcome = store
        .save(&Snapshot::from_records(vec![record("FAC-1")]), Some("FAC-1"))
        .await
        .unwrap();

    write.assert_async().await;
    reload.assert_async().await;
    assert_eq!(outcome.status, SaveStatus::Primary);
    assert_eq!(outcome.backend, BackendKind::Table);
    assert!(outcome.skipped.is_empty());
    assert!(!dataset.exists());
}

#[tokio::test]
async fn test_key_missing_after_reported_success_fails_verification() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("inventario_cuentas.csv");
    let mut server = Server::new_async().await;

    let _write = server
        .mock("POST", "/rest/v1/inventario")
        .match_query(Matcher::Any)
        .with_status(201)
        .create_async()
        .await;
    let _reload = server
        .mock("GET", "/rest/v1/inventario")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let store = RecordStore::from_config(&table_then_local(&server.url(), &dataset)).unwrap();
    let err = store
        .save(&Snapshot::from_records(vec![record("FAC-1")]), Some("FAC-1"))
        .await
        .unwrap_err();

    match err {
        InventoryError::VerificationFailure {
            invoice_number,
            backend,
        } => {
            assert_eq!(invoice_number, "FAC-1");
            assert_eq!(backend, "table");
        }
        other => panic!("expected verification failure, got {other:?}"),
    }
    // Verification failure is not a reason to write elsewhere
    assert!(!dataset.exists());
}

#[tokio::test]
async fn test_generation_signals_unchanged_until_next_save() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("inventario_cuentas.csv");
    let store = RecordStore::from_config(&table_then_local(UNREACHABLE, &dataset)).unwrap();

    let first = store.load_if_changed(None).await.unwrap();
    let seen = first.generation();
    assert!(matches!(first, LoadOutcome::Changed { .. }));
    assert!(matches!(
        store.load_if_changed(Some(seen)).await.unwrap(),
        LoadOutcome::Unchanged { .. }
    ));

    let outcome = store
        .save(&Snapshot::from_records(vec![record("FAC-1")]), Some("FAC-1"))
        .await
        .unwrap();
    assert_eq!(outcome.generation, seen + 1);

    match store.load_if_changed(Some(seen)).await.unwrap() {
        LoadOutcome::Changed {
            generation,
            snapshot,
        } => {
            assert_eq!(generation, seen + 1);
            assert!(snapshot.contains("FAC-1"));
        }
        other => panic!("expected fresh content, got {other:?}"),
    }
}

#[tokio::test]
async fn test_equal_snapshots_have_equal_checksums() {
    let dir = TempDir::new().unwrap();
    let dataset = dir.path().join("inventario_cuentas.csv");
    let store = RecordStore::from_config(&table_then_local(UNREACHABLE, &dataset)).unwrap();
    let snapshot = Snapshot::from_records(vec![record("FAC-1"), record("FAC-2")]);

    let first = store.save(&snapshot, None).await.unwrap();
    let bytes = std::fs::read(&dataset).unwrap();
    let second = store.save(&snapshot, None).await.unwrap();

    assert_eq!(first.checksum, second.checksum);
    assert_eq!(first.checksum.len(), 64);
    assert_eq!(std::fs::read(&dataset).unwrap(), bytes);
}

#[tokio::test]
async fn test_no_backend_reachable_is_unavailable() {
    let config = parse_config(&format!(
        "[storage]\npriority = [\"table\"]\n[storage.table]\nbase_url = \"{UNREACHABLE}\"\napi_key = \"k\"\ntimeout_seconds = 2\n"
    ))
    .unwrap();
    let store = RecordStore::from_config(&config).unwrap();

    let err = store
        .save(&Snapshot::from_records(vec![record("FAC-1")]), Some("FAC-1"))
        .await
        .unwrap_err();

    assert!(err.is_backend_unavailable(), "got {err:?}");
}
