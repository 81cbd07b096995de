//! Metrics collection and Prometheus export.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use narrator_core::{DeleteOutcome, NarratorError, NarratorResult};

/// Metrics recorder for workflow operations.
///
/// Calls are cheap no-ops until a global recorder is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowMetrics;

impl WorkflowMetrics {
    /// Install the Prometheus recorder and return a handle for rendering `/metrics`.
    pub fn install() -> NarratorResult<PrometheusHandle> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| NarratorError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();
        Ok(handle)
    }

    fn register_metrics() {
        describe_counter!(
            "narrator_generate_total",
            "Total number of generate requests"
        );
        describe_counter!(
            "narrator_generate_failed_total",
            "Generate requests that failed"
        );
        describe_counter!(
            "narrator_delete_total",
            "Delete requests, labelled by outcome"
        );
        describe_histogram!(
            "narrator_synthesis_ms",
            "Synthesizer wall time in milliseconds"
        );
        describe_gauge!("narrator_sessions_active", "Number of live UI sessions");
    }

    /// Record a generate request received.
    pub fn generate_received(&self) {
        counter!("narrator_generate_total").increment(1);
    }

    /// Record a generate request that failed.
    pub fn generate_failed(&self) {
        counter!("narrator_generate_failed_total").increment(1);
    }

    /// Record synthesizer latency.
    pub fn record_synthesis_ms(&self, ms: f64) {
        histogram!("narrator_synthesis_ms").record(ms);
    }

    /// Record the outcome of a delete request.
    pub fn delete_finished(&self, outcome: &DeleteOutcome) {
        counter!("narrator_delete_total", "outcome" => outcome.label()).increment(1);
    }

    /// Set the number of live sessions.
    pub fn set_active_sessions(&self, count: usize) {
        gauge!("narrator_sessions_active").set(count as f64);
    }
}
