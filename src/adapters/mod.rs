//! Dataset storage integrations.
//!
//! This module provides one storage capability and its variants:
//!
//! - [`storage`] - the `StorageBackend` trait, row codec and factory
//! - [`local`] - CSV file on local disk, lock file plus atomic replace
//! - [`table`] - hosted table store with native upsert-on-conflict
//! - [`sheets`] - hosted spreadsheet rewritten under a revision token
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external services and
//! enable testing against local files and mock HTTP servers. Variants are
//! selected by configuration, never by swapping code.
//!
//! ```rust,no_run
//! use radicacion::adapters::{create_backends, StorageBackend};
//! use radicacion::config::load_config;
//! use radicacion::core::retry::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("radicacion.toml")?;
//! let backends = create_backends(&config.storage, Arc::new(SystemClock))?;
//! for backend in &backends {
//!     println!("{} holds {} invoices", backend.name(), backend.load().await?.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod local;
pub mod sheets;
pub mod storage;
pub mod table;

pub use storage::{create_backends, StorageBackend};
