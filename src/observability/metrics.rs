//! Request metrics collection and exposition.

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Total requests counter metric name.
pub const METRIC_REQUESTS_TOTAL: &str = "http_requests_total";
/// Request duration histogram metric name.
pub const METRIC_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Histogram buckets: 1ms upward, one decade per bucket.
pub const DURATION_BUCKETS: [f64; 5] = [0.001, 0.01, 0.1, 1.0, 10.0];

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder and return a handle for the
/// `/metrics` exposition endpoint.
///
/// Idempotent: subsequent calls return the handle installed by the first.
/// A failed install is fatal at startup (only possible when some other
/// recorder already claimed the global slot), matching how the signal
/// handler install is treated.
pub fn prometheus_handle() -> PrometheusHandle {
    PROMETHEUS
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(METRIC_REQUEST_DURATION.to_string()),
                    &DURATION_BUCKETS,
                )
                .expect("duration buckets are non-empty")
                .install_recorder()
                .expect("global metrics recorder already installed");

            describe_counter!(METRIC_REQUESTS_TOTAL, "Total http requests");
            describe_histogram!(METRIC_REQUEST_DURATION, "Duration of http requests");

            handle
        })
        .clone()
}

/// Record one completed request: exactly one counter increment and one
/// duration observation, both labeled with the status code written to the
/// response.
pub fn record_request(status: u16, started: Instant) {
    let code = status.to_string();
    counter!(METRIC_REQUESTS_TOTAL, "code" => code.clone()).increment(1);
    histogram!(METRIC_REQUEST_DURATION, "code" => code).record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_requests_show_up_in_the_exposition() {
        let handle = prometheus_handle();

        record_request(200, Instant::now());
        record_request(500, Instant::now());

        let rendered = handle.render();
        assert!(rendered.contains(METRIC_REQUESTS_TOTAL));
        assert!(rendered.contains(METRIC_REQUEST_DURATION));
        assert!(rendered.contains("code=\"200\""));
        assert!(rendered.contains("code=\"500\""));
    }

    #[test]
    fn handle_install_is_idempotent() {
        let _first = prometheus_handle();
        record_request(204, Instant::now());

        // The second call must return a handle over the same registry.
        let second = prometheus_handle();
        assert!(second.render().contains("code=\"204\""));
    }
}
