//! Hosted spreadsheet backend with revision-guarded full rewrites

pub mod client;
pub mod models;

pub use client::SpreadsheetBackend;
