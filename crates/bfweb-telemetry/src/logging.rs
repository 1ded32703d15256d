//! Structured logging for bfweb.
//!
//! Installs a global `tracing` subscriber. Output is either single-line text
//! or JSON, written to stdout and, when a log file is configured, appended to
//! that file as well.
//!
//! # Example
//!
//! ```rust,ignore
//! use bfweb_telemetry::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig {
//!     file: Some("logs/service.log".into()),
//!     ..LogConfig::default()
//! };
//! init_logging(&config)?;
//!
//! tracing::info!(path = "/", "request served");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether logging is enabled at all.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "bfweb_middleware=debug,warn").
    pub level: String,

    /// Whether to output JSON instead of text.
    pub json_format: bool,

    /// Optional log file; output goes to stdout and is appended here.
    pub file: Option<PathBuf>,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: false,
            file: None,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with verbose text output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            file_line_info: true,
            ..Self::default()
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            json_format: true,
            ..Self::default()
        }
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the level directive is invalid or
/// a global subscriber is already installed, and `TelemetryError::LogFile`
/// if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let writer = make_writer(config)?;
    // Escape codes would end up in the log file.
    let ansi = config.file.is_none();

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))
}

fn make_writer(config: &LogConfig) -> TelemetryResult<BoxMakeWriter> {
    match &config.file {
        None => Ok(BoxMakeWriter::new(std::io::stdout)),
        Some(path) => {
            let file = open_log_file(path)?;
            Ok(BoxMakeWriter::new(std::io::stdout.and(Arc::new(file))))
        }
    }
}

fn open_log_file(path: &Path) -> TelemetryResult<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.to_path_buf(),
            source,
        })
}
