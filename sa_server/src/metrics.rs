//! Prometheus metrics for monitoring the auth server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener when
//! `METRICS_BIND` (or `--metrics-bind`) is set. Without an installed exporter
//! every recording call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sa_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/auth/login", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment registrations counter, labelled by outcome.
pub fn registrations_total(outcome: &'static str) {
    metrics::counter!("registrations_total", "outcome" => outcome).increment(1);
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment rejected session tokens counter.
pub fn invalid_tokens_total() {
    metrics::counter!("invalid_tokens_total").increment(1);
}
