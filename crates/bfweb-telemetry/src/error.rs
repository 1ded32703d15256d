//! Telemetry error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to parse address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Log file could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("failed".to_string());
        assert_eq!(err.to_string(), "Failed to initialize metrics: failed");
    }

    #[test]
    fn test_log_file_error_display() {
        let err = TelemetryError::LogFile {
            path: PathBuf::from("/nope/app.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope/app.log"));
    }
}
