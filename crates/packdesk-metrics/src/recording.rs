// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a no-op.

use std::time::Duration;

use metrics::{describe_counter, describe_histogram};

/// Register all Packdesk metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "packdesk_stream_records_total",
        "Change records seen by the cache maintainer, by outcome"
    );
    describe_counter!(
        "packdesk_recompute_total",
        "Per-customer metric recomputes, by outcome"
    );
    describe_counter!(
        "packdesk_cache_lookups_total",
        "Metrics cache lookups on the read path, by result"
    );
    describe_histogram!(
        "packdesk_read_latency_seconds",
        "Read path latency in seconds, by endpoint"
    );
}

/// Record one change record's outcome (`processed`, `duplicate`, `empty`, `malformed`, `failed`).
pub fn record_stream_record(outcome: &'static str) {
    metrics::counter!("packdesk_stream_records_total", "outcome" => outcome).increment(1);
}

/// Record a recompute outcome (`written`, `no_orders`, `failed`).
pub fn record_recompute(outcome: &'static str) {
    metrics::counter!("packdesk_recompute_total", "outcome" => outcome).increment(1);
}

/// Record a cache lookup result.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("packdesk_cache_lookups_total", "result" => result).increment(1);
}

/// Record read latency for an endpoint.
pub fn record_read_latency(endpoint: &'static str, elapsed: Duration) {
    metrics::histogram!("packdesk_read_latency_seconds", "endpoint" => endpoint)
        .record(elapsed.as_secs_f64());
}
