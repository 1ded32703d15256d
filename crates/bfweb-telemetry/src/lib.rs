//! # bfweb Telemetry
//!
//! Logging and metrics setup for bfweb services.
//!
//! - [`logging`]: `tracing-subscriber` initialisation (text or JSON, stdout
//!   and an optional append-only log file)
//! - [`metrics`]: Prometheus recorder installation and the counters and
//!   histograms recorded by the request pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use bfweb_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! tracing::info!("service starting");
//! ```

#![doc(html_root_url = "https://docs.rs/bfweb-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
