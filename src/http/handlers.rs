//! Request handlers and middleware for both listeners.

use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;

use crate::config::SuccessRate;
use crate::http::server::{AppState, MetricsState};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// Body returned on a successful roll.
pub const SUCCESS_BODY: &str = "Hello World!\n";
/// Body returned on a failed roll.
pub const FAILURE_BODY: &str = "Fail\n";

/// Artificial per-request processing time, so the latency histogram has a
/// realistic non-zero distribution.
const PROCESSING_DELAY: Duration = Duration::from_millis(5);

/// Map a uniform roll in `[1, 100]` to an outcome.
///
/// Success iff `roll <= rate`, which makes the success probability exactly
/// `rate/100`: a rate of 0 always fails and a rate of 100 always succeeds.
fn outcome(rate: SuccessRate, roll: u8) -> (StatusCode, &'static str) {
    if roll <= rate.percent() {
        (StatusCode::OK, SUCCESS_BODY)
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY)
    }
}

/// The flaky endpoint: randomly succeed or fail at the configured rate.
pub async fn simulate(State(state): State<AppState>) -> (StatusCode, &'static str) {
    tokio::time::sleep(PROCESSING_DELAY).await;
    let roll = rand::thread_rng().gen_range(1..=100u8);
    outcome(state.success_rate, roll)
}

/// Middleware: record exactly one counter increment and one duration
/// observation per completed request.
///
/// Sits outside the timeout layer so the label carries the status code
/// actually written to the response, timeout rejections included.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(response.status().as_u16(), started);
    response
}

/// Middleware: once draining begins, answer with `Connection: close` so
/// clients stop reusing keep-alive connections during the settle window and
/// are steered toward reconnecting elsewhere.
pub async fn connection_close_on_drain(
    State(shutdown): State<Shutdown>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if shutdown.is_triggered() {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

/// Liveness probe: the process is up.
pub async fn liveness() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Readiness probe: 502 steers load balancers away during startup and drain.
pub async fn readiness(State(state): State<MetricsState>) -> (StatusCode, &'static str) {
    if state.health.is_ready() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::BAD_GATEWAY, "Unhealthy")
    }
}

/// Prometheus exposition.
pub async fn metrics_exposition(State(state): State<MetricsState>) -> String {
    state.prometheus.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::health::HealthState;
    use crate::http::server::{app_router, metrics_router};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn config(percent: u16) -> Config {
        Config::new(SuccessRate::new(percent).unwrap())
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn outcome_extremes_are_deterministic() {
        let always = SuccessRate::new(100).unwrap();
        let never = SuccessRate::new(0).unwrap();
        for roll in 1..=100u8 {
            assert_eq!(outcome(always, roll).0, StatusCode::OK);
            assert_eq!(outcome(never, roll).0, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn outcome_boundary_sits_at_the_rate() {
        let rate = SuccessRate::new(30).unwrap();
        assert_eq!(outcome(rate, 30).0, StatusCode::OK);
        assert_eq!(outcome(rate, 31).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn observed_success_proportion_converges() {
        let rate = SuccessRate::new(50).unwrap();
        let mut rng = rand::thread_rng();
        let successes = (0..10_000)
            .filter(|_| outcome(rate, rng.gen_range(1..=100u8)).0 == StatusCode::OK)
            .count();
        // 50% +/- sampling tolerance.
        assert!(
            (4800..=5200).contains(&successes),
            "successes out of tolerance: {successes}"
        );
    }

    #[tokio::test]
    async fn app_endpoint_succeeds_at_rate_100() {
        let app = app_router(&config(100), &Shutdown::new());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn app_endpoint_fails_at_rate_0() {
        let app = app_router(&config(0), &Shutdown::new());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, FAILURE_BODY);
    }

    #[tokio::test]
    async fn app_endpoint_catches_all_paths_and_methods() {
        let app = app_router(&config(100), &Shutdown::new());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/some/nested/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let app = metrics_router(&config(100), HealthState::new(), &Shutdown::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/liveness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn readiness_tracks_health_state() {
        let health = HealthState::new();
        let app = metrics_router(&config(100), health.clone(), &Shutdown::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/readiness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_string(response).await, "Unhealthy");

        health.set_ready(true);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/readiness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_request_series() {
        // Install the recorder before the request so the series is captured.
        let _ = metrics::prometheus_handle();

        let app = app_router(&config(100), &Shutdown::new());
        let _ = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let metrics_app = metrics_router(&config(100), HealthState::new(), &Shutdown::new());
        let response = metrics_app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let exposition = body_string(response).await;
        assert!(exposition.contains(metrics::METRIC_REQUESTS_TOTAL));
        assert!(exposition.contains(metrics::METRIC_REQUEST_DURATION));
    }

    #[tokio::test]
    async fn responses_carry_connection_close_once_draining() {
        let shutdown = Shutdown::new();
        let app = app_router(&config(100), &shutdown);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get(header::CONNECTION).is_none());

        shutdown.trigger();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "close"
        );
    }

    #[tokio::test]
    async fn health_endpoints_carry_connection_close_once_draining() {
        let shutdown = Shutdown::new();
        let app = metrics_router(&config(100), HealthState::new(), &shutdown);
        shutdown.trigger();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/liveness")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "close"
        );
    }
}
