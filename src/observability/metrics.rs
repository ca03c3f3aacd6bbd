//! Metrics collection and exposition.
//!
//! # Metrics
//! - `winscan_requests_total` (counter): gateway responses by route, status
//! - `winscan_request_duration_seconds` (histogram): handler latency by route
//! - `winscan_cache_lookups_total` (counter): hit / stale / miss / bypass
//! - `winscan_revalidations_total` (counter): background refresh outcomes
//! - `winscan_upstream_attempts_total` (counter): per-endpoint attempt results
//! - `winscan_dedup_joins_total` (counter): callers merged into an in-flight fetch
//! - `winscan_cache_entries` (gauge): stored cache entries

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "winscan_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("winscan_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(outcome: &'static str) {
    counter!("winscan_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("winscan_cache_entries").set(entries as f64);
}

pub fn record_revalidation(result: &'static str) {
    counter!("winscan_revalidations_total", "result" => result).increment(1);
}

pub fn record_upstream_attempt(endpoint: &str, result: &'static str) {
    counter!(
        "winscan_upstream_attempts_total",
        "endpoint" => endpoint.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_dedup_join() {
    counter!("winscan_dedup_joins_total").increment(1);
}
