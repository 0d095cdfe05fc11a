// Radicacion - Clinic invoice filing tracker core
// Copyright (c) 2025 Radicacion Contributors
// Licensed under the MIT License

//! # Radicacion - Invoice Filing Tracker Core
//!
//! Radicacion keeps one authoritative dataset of clinic invoices consistent
//! across interchangeable storage backends and decides, on every save, how
//! each invoice moves through the filing workflow.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Persisting** the full invoice snapshot to a hosted table store, a
//!   hosted spreadsheet, or a local CSV file, tried in configured order
//! - **Verifying** every save by reloading it from the backend that took it
//! - **Transitioning** invoices between `Pending`, `Audited`, `Remediated`
//!   and `Filed` while deriving ids, filed dates and month labels
//! - **Moving** a selection of invoices to a new status with one write
//!
//! ## Architecture
//!
//! Radicacion follows a layered architecture:
//!
//! - [`core`] - Business logic (lifecycle, store, batch, workflow, queries)
//! - [`adapters`] - Storage backends (local file, table store, spreadsheet)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use radicacion::config::load_config;
//! use radicacion::core::store::RecordStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("radicacion.toml")?;
//!     let _guard = radicacion::logging::init_logging(
//!         &config.application.log_level,
//!         &config.logging,
//!     )?;
//!
//!     let store = RecordStore::from_config(&config)?;
//!     let snapshot = store.load().await?;
//!
//!     println!("{} invoices", snapshot.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! ### Backend Fallback
//!
//! Backends listed in `storage.priority` are tried in order. A backend that
//! is unreachable or misconfigured is skipped; a save that only the local
//! file accepted is tagged local-only so the caller can tell.
//!
//! ```rust,no_run
//! use radicacion::core::store::{RecordStore, SaveStatus};
//! use radicacion::domain::Snapshot;
//!
//! # async fn example(store: &RecordStore, snapshot: Snapshot) -> radicacion::domain::Result<()> {
//! let outcome = store.save(&snapshot, Some("FAC-1")).await?;
//! if outcome.status == SaveStatus::LocalOnly {
//!     tracing::warn!("Remote storage unreachable, saved locally");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Batch Moves
//!
//! ```rust,no_run
//! use radicacion::core::batch::BatchMover;
//! use radicacion::core::query::BucketQuery;
//! use radicacion::domain::InvoiceStatus;
//!
//! # async fn example(mover: &BatchMover, snapshot: radicacion::domain::Snapshot) -> radicacion::domain::Result<()> {
//! let page = BucketQuery::new(InvoiceStatus::Audited).run(&snapshot);
//! let keys: Vec<&str> = page.records.iter().map(|r| r.invoice_number.as_str()).collect();
//!
//! let summary = mover.move_to(&snapshot, &keys, InvoiceStatus::Filed).await?;
//! println!("Filed {} invoices", summary.moved_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::InventoryError`]:
//!
//! ```rust,no_run
//! use radicacion::domain::InventoryError;
//!
//! fn example() -> Result<(), InventoryError> {
//!     // Errors are automatically converted using the ? operator
//!     let config = radicacion::config::load_config("radicacion.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
