//! Hosted table-store backend (PostgREST-compatible)

pub mod client;
pub mod models;

pub use client::TableStoreBackend;
pub use models::TableRow;
