//! Core business logic for the invoice inventory.
//!
//! # Modules
//!
//! - [`normalize`] - Currency, date and year parsing for form and sheet input
//! - [`retry`] - Bounded retry policy and injectable clock
//! - [`lifecycle`] - Id allocation and the status transition engine
//! - [`store`] - Record store facade over the configured backends
//! - [`batch`] - Move many invoices to one status with a single save
//! - [`workflow`] - Save one invoice from form input
//! - [`query`] - Status bucket filter, sort and pagination
//! - [`summary`] - Aggregates for the dashboard
//!
//! # Save Workflow
//!
//! Every save follows the same path:
//!
//! 1. **Normalize**: Turn form text into a typed draft, rejecting bad fields
//! 2. **Load**: Read the full snapshot from the first reachable backend
//! 3. **Transition**: Compute the next record state from the previous one
//! 4. **Save**: Write the whole snapshot through the backend chain
//! 5. **Verify**: Reload from the accepting backend and check the key
//!
//! # Example
//!
//! ```rust,no_run
//! use radicacion::config::load_config;
//! use radicacion::core::lifecycle::TransitionEngine;
//! use radicacion::core::retry::SystemClock;
//! use radicacion::core::store::RecordStore;
//! use radicacion::core::workflow::{InvoiceForm, InvoiceWorkflow};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("radicacion.toml")?;
//! let store = Arc::new(RecordStore::from_config(&config)?);
//! let workflow = InvoiceWorkflow::new(
//!     store,
//!     TransitionEngine::new(config.application.id_prefix.clone()),
//!     Arc::new(SystemClock),
//! );
//!
//! let form = InvoiceForm {
//!     invoice_number: "FAC-1".to_string(),
//!     amount: "$ 1.250.000".to_string(),
//!     status: "Pendiente".to_string(),
//!     ..InvoiceForm::default()
//! };
//! let saved = workflow.save_invoice(&form, None).await?;
//! println!("{} saved ({})", saved.record.id, saved.outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod lifecycle;
pub mod normalize;
pub mod query;
pub mod retry;
pub mod store;
pub mod summary;
pub mod workflow;
