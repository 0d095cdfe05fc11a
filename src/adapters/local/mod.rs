//! Local CSV file backend
//!
//! One flat file guarded by a `<file>.lock` sibling, replaced atomically on
//! every write.

pub mod backend;
pub mod lock;

pub use backend::{LocalFileBackend, StagedWrite};
pub use lock::{FileLock, LockInfo, LockWait};
