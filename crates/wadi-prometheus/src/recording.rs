// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder can collect these metrics.
//! Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all WADI metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("wadi_runs_total", "Runs finished, by transport and final status");
    describe_counter!("wadi_credits_debited_total", "Credits debited for generation");
    describe_counter!("wadi_credits_refunded_total", "Credits refunded after failed generation");
    describe_counter!("wadi_refund_failures_total", "Refunds that could not be applied");
    describe_counter!("wadi_stream_chunks_total", "Text chunks forwarded to clients");
    describe_counter!("wadi_memory_pruned_total", "Memories evicted by the project cap");
    describe_gauge!("wadi_active_connections", "Open socket connections");
    describe_histogram!(
        "wadi_run_duration_seconds",
        "Wall time from debit to final persistence"
    );
}

/// Record a finished run.
pub fn record_run(transport: &'static str, status: &str, seconds: f64) {
    metrics::counter!("wadi_runs_total", "transport" => transport, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("wadi_run_duration_seconds", "transport" => transport).record(seconds);
}

/// Record a refund issued after a failed generation.
pub fn record_refund(amount: i64) {
    metrics::counter!("wadi_credits_refunded_total").increment(amount.max(0) as u64);
}

/// Record a refund that failed to apply.
pub fn record_refund_failure() {
    metrics::counter!("wadi_refund_failures_total").increment(1);
}

/// Record one streamed chunk.
pub fn record_chunk() {
    metrics::counter!("wadi_stream_chunks_total").increment(1);
}

/// Adjust the open socket connection gauge.
pub fn connection_opened() {
    metrics::gauge!("wadi_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("wadi_active_connections").decrement(1.0);
}
