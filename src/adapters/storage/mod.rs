//! Backend abstraction shared by every storage variant
//!
//! - [`traits`] - the `StorageBackend` capability
//! - [`row`] - header-keyed text cell codec used by the file and spreadsheet
//! - [`factory`] - builds the configured priority list

pub mod factory;
pub mod row;
pub mod traits;

pub use factory::create_backends;
pub use row::{parse_csv, render_csv, snapshot_checksum, RECORD_COLUMNS};
pub use traits::StorageBackend;
