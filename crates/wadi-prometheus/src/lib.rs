// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for WADI.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format and served by the gateway's
//! `/metrics` endpoint.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use wadi_core::WadiError;

pub use recording::{
    connection_closed, connection_opened, record_chunk, record_refund, record_refund_failure,
    record_run, register_metrics,
};

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, WadiError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            WadiError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wraps an existing handle (e.g. from a locally built recorder).
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_are_noops_without_recorder() {
        record_run("http", "complete", 0.5);
        record_refund(3);
        record_chunk();
        connection_opened();
        connection_closed();
    }

    #[test]
    fn local_recorder_renders_run_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = PrometheusExporter::from_handle(recorder.handle());
        metrics::with_local_recorder(&recorder, || {
            record_run("sse", "failed", 1.25);
            record_refund(10);
        });
        let text = exporter.render();
        assert!(text.contains("wadi_runs_total"));
        assert!(text.contains("status=\"failed\""));
        assert!(text.contains("wadi_credits_refunded_total 10"));
    }
}
