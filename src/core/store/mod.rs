//! Record store: the single owner of the persisted snapshot
//!
//! - [`record_store`] - backend selection, write-then-verify, cache and
//!   generation counter
//! - [`outcome`] - save and load results

pub mod outcome;
pub mod record_store;

#[cfg(test)]
pub(crate) mod testing;

pub use outcome::{LoadOutcome, SaveOutcome, SaveStatus};
pub use record_store::RecordStore;
