//! Prometheus metrics exposition
//!
//! - `token_operations_total` (counter): label `op` (create, update,
//!   regenerate, destroy)
//! - `api_request_duration_seconds` (histogram): label `status`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Explicit buckets make the duration metric render as a histogram
/// (`_bucket` lines usable with `histogram_quantile()`) rather than the
/// default summary.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "api_request_duration_seconds".to_string(),
            ),
            &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a completed token operation.
pub fn record_operation(op: &str) {
    metrics::counter!("token_operations_total", "op" => op.to_string()).increment(1);
}

/// Record a completed API request with its status code.
pub fn record_request(status: u16, duration_secs: f64) {
    metrics::histogram!("api_request_duration_seconds", "status" => status.to_string())
        .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // Without an installed recorder, metrics calls are no-ops.
        record_operation("create");
        record_request(200, 0.01);
    }

    /// Isolated recorder/handle pair — only one global recorder can
    /// exist per process, so tests avoid install_recorder().
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                metrics_exporter_prometheus::Matcher::Full(
                    "api_request_duration_seconds".to_string(),
                ),
                &[0.001, 0.01, 0.1, 1.0],
            )
            .expect("failed to set histogram buckets")
            .build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn operation_counter_carries_op_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_operation("create");
        record_operation("regenerate");

        let output = handle.render();
        assert!(output.contains("token_operations_total"));
        assert!(output.contains("op=\"create\""));
        assert!(output.contains("op=\"regenerate\""));
    }

    #[test]
    fn request_histogram_renders_buckets() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request(201, 0.004);

        let output = handle.render();
        assert!(
            output.contains("api_request_duration_seconds_bucket"),
            "histogram must render _bucket lines, got:\n{output}"
        );
        assert!(output.contains("status=\"201\""));
    }
}
