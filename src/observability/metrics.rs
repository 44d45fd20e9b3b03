//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_proxy_requests_total` (counter): requests by method, status, rule
//! - `dev_proxy_request_duration_seconds` (histogram): latency distribution
//! - `dev_proxy_rewrite_noop_total` (counter): rewrites whose pattern missed
//! - `dev_proxy_upstream_errors_total` (counter): transport failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and off by default

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Label used when no rule matched.
pub const NO_RULE: &str = "none";

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, rule: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("rule", rule.to_string()),
    ];
    metrics::counter!("dev_proxy_requests_total", &labels).increment(1);
    metrics::histogram!("dev_proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rewrite_noop(rule: &str) {
    metrics::counter!("dev_proxy_rewrite_noop_total", "rule" => rule.to_string()).increment(1);
}

pub fn record_upstream_error(rule: &str, kind: &'static str) {
    metrics::counter!(
        "dev_proxy_upstream_errors_total",
        "rule" => rule.to_string(),
        "kind" => kind
    )
    .increment(1);
}
