//! Configuration management.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `RADICACION_*`
//! environment overrides and validation on load.
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! id_prefix = "CHIA"
//!
//! [storage]
//! priority = ["table", "local"]
//!
//! [storage.local]
//! path = "inventario_cuentas.csv"
//! lock_timeout_ms = 10000
//! lock_poll_interval_ms = 250
//! lock_stale_after_secs = 300
//!
//! [storage.table]
//! base_url = "https://project.supabase.co"
//! api_key = "${RADICACION_TABLE_KEY}"
//! table = "inventario"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use radicacion::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("radicacion.toml")?;
//! println!("Backends: {:?}", config.storage.priority);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, BackendKind, InventoryConfig, LocalFileConfig, LoggingConfig, RetryConfig,
    SpreadsheetConfig, StorageConfig, TableStoreConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
