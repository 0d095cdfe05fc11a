//! Configuration schema types
//!
//! Maps one-to-one onto the TOML file. Every section validates itself and
//! `InventoryConfig::validate` checks the cross-section rules.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted table store with native upsert
    Table,
    /// Hosted spreadsheet service with a revision token
    Spreadsheet,
    /// Local CSV file guarded by a lock file
    Local,
}

impl BackendKind {
    /// Name used in config, logs, and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Table => "table",
            BackendKind::Spreadsheet => "spreadsheet",
            BackendKind::Local => "local",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, BackendKind::Local)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Storage backends and their priority
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InventoryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix of allocated invoice ids (`<prefix>-NNNN`)
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.id_prefix.is_empty() || !self.id_prefix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(format!(
                "application.id_prefix must be non-empty and alphanumeric, got '{}'",
                self.id_prefix
            ));
        }

        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            id_prefix: default_id_prefix(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backends to try, first to last
    #[serde(default = "default_priority")]
    pub priority: Vec<BackendKind>,

    /// Local file backend (required if `local` is in the priority list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalFileConfig>,

    /// Table-store backend (required if `table` is in the priority list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableStoreConfig>,

    /// Spreadsheet backend (required if `spreadsheet` is in the priority list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet: Option<SpreadsheetConfig>,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.priority.is_empty() {
            return Err("storage.priority cannot be empty".to_string());
        }

        for (i, kind) in self.priority.iter().enumerate() {
            if self.priority[..i].contains(kind) {
                return Err(format!("storage.priority lists '{kind}' more than once"));
            }

            // Only the backends actually selected are validated
            match kind {
                BackendKind::Local => match self.local {
                    Some(ref config) => config.validate()?,
                    None => {
                        return Err(
                            "storage.local is required when 'local' is in storage.priority"
                                .to_string(),
                        )
                    }
                },
                BackendKind::Table => match self.table {
                    Some(ref config) => config.validate()?,
                    None => {
                        return Err(
                            "storage.table is required when 'table' is in storage.priority"
                                .to_string(),
                        )
                    }
                },
                BackendKind::Spreadsheet => match self.spreadsheet {
                    Some(ref config) => config.validate()?,
                    None => {
                        return Err("storage.spreadsheet is required when 'spreadsheet' is in storage.priority".to_string())
                    }
                },
            }
        }

        Ok(())
    }
}

/// Local file backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFileConfig {
    /// Path of the CSV dataset file
    pub path: String,

    /// Maximum time to wait for the lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Interval between lock attempts
    #[serde(default = "default_lock_poll_interval_ms")]
    pub lock_poll_interval_ms: u64,

    /// Age after which a lock file is considered abandoned
    #[serde(default = "default_lock_stale_after_secs")]
    pub lock_stale_after_secs: u64,
}

impl LocalFileConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("storage.local.path cannot be empty".to_string());
        }

        if self.lock_poll_interval_ms == 0 {
            return Err("storage.local.lock_poll_interval_ms must be > 0".to_string());
        }

        if self.lock_stale_after_secs == 0 {
            return Err("storage.local.lock_stale_after_secs must be > 0".to_string());
        }

        if self.lock_timeout_ms < self.lock_poll_interval_ms {
            return Err(format!(
                "storage.local.lock_timeout_ms ({}) must be >= lock_poll_interval_ms ({})",
                self.lock_timeout_ms, self.lock_poll_interval_ms
            ));
        }

        Ok(())
    }
}

/// Hosted table-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStoreConfig {
    /// Project URL, e.g. `https://project.supabase.co`
    pub base_url: String,

    /// Service API key
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Table name
    #[serde(default = "default_table")]
    pub table: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl TableStoreConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_url("storage.table.base_url", &self.base_url)?;

        if self.api_key.expose_secret().is_blank() {
            return Err("storage.table.api_key cannot be empty".to_string());
        }

        if self.table.trim().is_empty() {
            return Err("storage.table.table cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("storage.table.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }
}

/// Hosted spreadsheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    /// Service URL
    #[serde(default = "default_spreadsheet_base_url")]
    pub base_url: String,

    /// Spreadsheet document id
    pub spreadsheet_id: String,

    /// Worksheet holding the dataset
    #[serde(default = "default_table")]
    pub worksheet: String,

    /// OAuth access token
    /// Stored securely in memory and automatically zeroized on drop
    pub access_token: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Revision-conflict retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl SpreadsheetConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_url("storage.spreadsheet.base_url", &self.base_url)?;

        if self.spreadsheet_id.trim().is_empty() {
            return Err("storage.spreadsheet.spreadsheet_id cannot be empty".to_string());
        }

        if self.worksheet.trim().is_empty() {
            return Err("storage.spreadsheet.worksheet cannot be empty".to_string());
        }

        if self.access_token.expose_secret().is_blank() {
            return Err("storage.spreadsheet.access_token cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("storage.spreadsheet.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate("storage.spreadsheet.retry")
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if !(1..=10).contains(&self.max_attempts) {
            return Err(format!(
                "{section}.max_attempts must be between 1 and 10, got {}",
                self.max_attempts
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "{section}.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }

    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(format!("{field} must start with http:// or https://"));
    }

    url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_id_prefix() -> String {
    "CHIA".to_string()
}

fn default_priority() -> Vec<BackendKind> {
    vec![BackendKind::Local]
}

fn default_true() -> bool {
    true
}

fn default_lock_timeout_ms() -> u64 {
    10_000
}

fn default_lock_poll_interval_ms() -> u64 {
    250
}

fn default_lock_stale_after_secs() -> u64 {
    300
}

fn default_table() -> String {
    "inventario".to_string()
}

fn default_spreadsheet_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
