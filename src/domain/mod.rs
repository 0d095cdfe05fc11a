//! Domain models and types for the invoice inventory.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`InvoiceId`], [`InvoiceNumber`])
//! - **Workflow status** ([`InvoiceStatus`]) with a single explicit parse table
//! - **Records** ([`InvoiceRecord`], [`InvoiceDraft`], [`Snapshot`])
//! - **Error types** ([`InventoryError`], [`RemoteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use radicacion::domain::{InvoiceDraft, InvoiceNumber, InvoiceStatus};
//!
//! # fn example() -> radicacion::domain::Result<()> {
//! let draft = InvoiceDraft::new(InvoiceNumber::new("FAC-1")?)
//!     .with_insurer("EPS001")
//!     .with_status(InvoiceStatus::parse("Radicada")?);
//! assert!(draft.status.is_filed());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod invoice;
pub mod result;
pub mod status;

// Re-export commonly used types for convenience
pub use errors::{InventoryError, RemoteError};
pub use ids::{InvoiceId, InvoiceNumber};
pub use invoice::{IdReassignment, InvoiceDraft, InvoiceRecord, Snapshot};
pub use result::Result;
pub use status::InvoiceStatus;
