//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{BackendKind, InventoryConfig};
use super::secret::secret_string;
use crate::domain::errors::InventoryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into InventoryConfig
/// 4. Applies environment variable overrides (RADICACION_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `InventoryError::Configuration` if the file is missing or
/// unreadable, a referenced variable is unset, the TOML is malformed, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use radicacion::config::load_config;
///
/// let config = load_config("radicacion.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<InventoryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(InventoryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        InventoryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<InventoryConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: InventoryConfig = toml::from_str(&contents)
        .map_err(|e| InventoryError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        InventoryError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    tracing::debug!(
        priority = ?config.storage.priority,
        id_prefix = %config.application.id_prefix,
        "Configuration loaded"
    );

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| InventoryError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(InventoryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the RADICACION_* prefix
///
/// Variables follow the pattern RADICACION_<SECTION>_<KEY>, e.g.
/// RADICACION_STORAGE_PRIORITY=table,local or RADICACION_STORAGE_LOCAL_PATH.
fn apply_env_overrides(config: &mut InventoryConfig) -> Result<()> {
    if let Ok(val) = std::env::var("RADICACION_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("RADICACION_APPLICATION_ID_PREFIX") {
        config.application.id_prefix = val;
    }

    if let Ok(val) = std::env::var("RADICACION_STORAGE_PRIORITY") {
        config.storage.priority = parse_priority(&val)?;
    }

    if let Some(ref mut local) = config.storage.local {
        if let Ok(val) = std::env::var("RADICACION_STORAGE_LOCAL_PATH") {
            local.path = val;
        }
        if let Ok(val) = std::env::var("RADICACION_STORAGE_LOCAL_LOCK_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                local.lock_timeout_ms = ms;
            }
        }
    }

    if let Some(ref mut table) = config.storage.table {
        if let Ok(val) = std::env::var("RADICACION_STORAGE_TABLE_BASE_URL") {
            table.base_url = val;
        }
        if let Ok(val) = std::env::var("RADICACION_STORAGE_TABLE_API_KEY") {
            table.api_key = secret_string(val);
        }
    }

    if let Some(ref mut sheet) = config.storage.spreadsheet {
        if let Ok(val) = std::env::var("RADICACION_STORAGE_SPREADSHEET_ID") {
            sheet.spreadsheet_id = val;
        }
        if let Ok(val) = std::env::var("RADICACION_STORAGE_SPREADSHEET_ACCESS_TOKEN") {
            sheet.access_token = secret_string(val);
        }
        if let Ok(val) = std::env::var("RADICACION_STORAGE_SPREADSHEET_RETRY_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                sheet.retry.max_attempts = attempts;
            }
        }
    }

    if let Ok(val) = std::env::var("RADICACION_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("RADICACION_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

/// Parses a comma-separated backend list such as `table, local`
fn parse_priority(value: &str) -> Result<Vec<BackendKind>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| match name.to_lowercase().as_str() {
            "table" => Ok(BackendKind::Table),
            "spreadsheet" => Ok(BackendKind::Spreadsheet),
            "local" => Ok(BackendKind::Local),
            other => Err(InventoryError::Configuration(format!(
                "Unknown backend '{other}' in RADICACION_STORAGE_PRIORITY. Must be one of: table, spreadsheet, local"
            ))),
        })
        .collect()
}
