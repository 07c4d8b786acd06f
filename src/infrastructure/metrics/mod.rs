//! Prometheus Metrics Module
//!
//! Exposes pipeline metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Producer**: Ticks published/failed, retry attempts
//! - **Consumer**: Records processed/failed per batch
//! - **Sinks**: Writes and failures per sink

use std::sync::OnceLock;

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    // Producer counters
    describe_counter!(
        "tickflow_ticks_published_total",
        "Ticks durably published to the stream"
    );
    describe_counter!(
        "tickflow_ticks_failed_total",
        "Symbols that failed fetch or exhausted publish retries"
    );
    describe_counter!(
        "tickflow_publish_retries_total",
        "Publish attempts that failed transiently"
    );

    // Consumer counters
    describe_counter!(
        "tickflow_records_processed_total",
        "Delivered records processed successfully"
    );
    describe_counter!(
        "tickflow_records_failed_total",
        "Delivered records reported back for redelivery"
    );

    // Sink counters
    describe_counter!("tickflow_sink_writes_total", "Successful sink writes by sink");
    describe_counter!("tickflow_sink_failures_total", "Failed sink writes by sink");
}
