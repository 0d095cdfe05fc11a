//! Logging for the inventory services
//!
//! Everything goes through `tracing`. The console layer is always on and
//! honours `RUST_LOG`; the JSON file layer is optional and rotates daily
//! or hourly. The macros below keep backend events uniform so log queries
//! can rely on the same field names.
//!
//! ```no_run
//! use radicacion::config::LoggingConfig;
//! use radicacion::logging::init_logging;
//!
//! let config = LoggingConfig {
//!     local_rotation: "hourly".to_string(),
//!     ..LoggingConfig::default()
//! };
//! let _guard = init_logging("info", &config)?;
//! tracing::info!(records = 0, "Inventory opened");
//! # Ok::<(), radicacion::domain::InventoryError>(())
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use radicacion::log_retry_attempt;
///
/// log_retry_attempt!("spreadsheet", 2, 3, "revision conflict");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($backend:expr, $attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            backend = %$backend,
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log a fall-through from one backend to the next
///
/// # Example
///
/// ```no_run
/// use radicacion::log_backend_fallback;
///
/// log_backend_fallback!("table", "connection refused");
/// ```
#[macro_export]
macro_rules! log_backend_fallback {
    ($backend:expr, $reason:expr) => {
        tracing::warn!(
            backend = %$backend,
            reason = %$reason,
            "Backend unavailable, trying next"
        );
    };
}

/// Log the outcome of a snapshot save
///
/// # Example
///
/// ```no_run
/// use radicacion::log_save_outcome;
///
/// log_save_outcome!("local", 12, 4);
/// ```
#[macro_export]
macro_rules! log_save_outcome {
    ($backend:expr, $records:expr, $generation:expr) => {
        tracing::info!(
            backend = %$backend,
            records = $records,
            generation = $generation,
            "Snapshot saved"
        );
    };
}
