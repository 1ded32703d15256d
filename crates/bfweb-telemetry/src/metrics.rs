//! Prometheus metrics for bfweb.
//!
//! The request pipeline records through the `metrics` facade; nothing is
//! exported until [`init_metrics`] installs the Prometheus recorder. Recording
//! without a recorder is a no-op.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Total requests, labelled by method and status.
pub const REQUESTS_TOTAL: &str = "bfweb_requests_total";
/// Request duration histogram, labelled by method.
pub const REQUEST_DURATION: &str = "bfweb_request_duration_seconds";
/// Rate-limit admission decisions, labelled by outcome.
pub const ADMISSION_TOTAL: &str = "bfweb_admission_total";
/// Panics caught by the recovery stage.
pub const PANICS_TOTAL: &str = "bfweb_panics_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether the Prometheus exporter is installed.
    pub enabled: bool,

    /// Listen address of the scrape endpoint.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Enables the exporter on the given address.
    #[must_use]
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.enabled = true;
        self.addr = addr.into();
        self
    }
}

/// Installs the Prometheus recorder and its scrape listener.
///
/// Must be called from within a tokio runtime when enabled.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the exporter cannot be built or a global
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    tokio::spawn(async move {
        if exporter.await.is_err() {
            tracing::error!("Prometheus exporter stopped");
        }
    });

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION, "HTTP request duration in seconds");
    describe_counter!(
        ADMISSION_TOTAL,
        "Rate limiter admission decisions by outcome"
    );
    describe_counter!(PANICS_TOTAL, "Panics recovered while handling requests");
}

/// Records a completed request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records a rate limiter decision.
pub fn record_admission(outcome: &'static str) {
    counter!(ADMISSION_TOTAL, "outcome" => outcome).increment(1);
}

/// Records a recovered panic.
pub fn record_panic() {
    counter!(PANICS_TOTAL).increment(1);
}
