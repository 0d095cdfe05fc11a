//! Structured logging setup using tracing
//!
//! Console output plus an optional JSON file layer with rotation.

use crate::config::LoggingConfig;
use crate::domain::{InventoryError, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// File name inside the configured log directory; the appender adds the date suffix.
const LOG_FILE_PREFIX: &str = "radicacion.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the non-blocking file writer alive
///
/// Dropping it flushes pending file output, so hold it until shutdown.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `level`.
///
/// # Errors
///
/// Returns `InventoryError::Configuration` for an unknown level, an
/// uncreatable log directory, or a subscriber that is already installed.
///
/// # Example
///
/// ```no_run
/// use radicacion::config::LoggingConfig;
///
/// let _guard = radicacion::logging::init_logging("debug", &LoggingConfig::default())?;
/// # Ok::<(), radicacion::domain::InventoryError>(())
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = crate_filter(parse_log_level(level)?);

    let mut layers: Vec<BoxedLayer> = vec![console_layer(filter.clone())];
    let file_guard = match file_layer(config, filter)? {
        Some((layer, guard)) => {
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| {
            InventoryError::Configuration(format!("Failed to install log subscriber: {e}"))
        })?;

    tracing::debug!(
        requested_level = level,
        file_output = file_guard.is_some(),
        directory = %config.local_path,
        "Log subscriber installed"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn crate_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("radicacion={level}")))
}

fn console_layer(filter: EnvFilter) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(filter)
        .boxed()
}

/// JSON lines into a rolling file, or `None` when file output is off
fn file_layer(
    config: &LoggingConfig,
    filter: EnvFilter,
) -> Result<Option<(BoxedLayer, WorkerGuard)>> {
    if !config.local_enabled {
        return Ok(None);
    }

    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        InventoryError::Configuration(format!(
            "Failed to create log directory {}: {}",
            config.local_path, e
        ))
    })?;

    let appender = RollingFileAppender::new(
        parse_rotation(&config.local_rotation),
        &config.local_path,
        LOG_FILE_PREFIX,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(false)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();

    Ok(Some((layer, guard)))
}

/// Case-insensitive level name
fn parse_log_level(name: &str) -> Result<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(InventoryError::Configuration(format!(
            "Unknown log level '{other}' (expected trace, debug, info, warn or error)"
        ))),
    }
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation {
        "hourly" => Rotation::HOURLY,
        _ => Rotation::DAILY,
    }
}
