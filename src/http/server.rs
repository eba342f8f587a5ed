//! Router construction for both listeners.

use std::time::Duration;

use axum::middleware;
use axum::routing::{any, get};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, SuccessRate};
use crate::health::HealthState;
use crate::http::handlers;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// State injected into the application handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Share of requests that succeed.
    pub success_rate: SuccessRate,
}

/// State injected into the metrics/health handlers.
#[derive(Clone)]
pub struct MetricsState {
    /// Readiness flag behind `/readiness`.
    pub health: HealthState,
    /// Handle rendering the Prometheus exposition for `/metrics`.
    pub prometheus: PrometheusHandle,
}

/// Build the application router: every method and path hits the
/// probabilistic responder, mirroring a catch-all demo workload.
///
/// Layer order matters: request tracking wraps the timeout layer so timeout
/// rejections are recorded with the status actually written, and the
/// connection-close steering wraps everything so every response carries it
/// once draining begins.
pub fn app_router(config: &Config, shutdown: &Shutdown) -> Router {
    let state = AppState {
        success_rate: config.success_rate,
    };

    Router::new()
        .route("/", any(handlers::simulate))
        .route("/{*path}", any(handlers::simulate))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(middleware::from_fn(handlers::track_requests))
        .layer(middleware::from_fn_with_state(
            shutdown.clone(),
            handlers::connection_close_on_drain,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Build the metrics/health router. Not instrumented with request metrics;
/// it steers reconnects during its own drain like the application router.
pub fn metrics_router(config: &Config, health: HealthState, shutdown: &Shutdown) -> Router {
    let state = MetricsState {
        health,
        prometheus: metrics::prometheus_handle(),
    };

    Router::new()
        .route("/metrics", get(handlers::metrics_exposition))
        .route("/liveness", get(handlers::liveness))
        .route("/readiness", get(handlers::readiness))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(middleware::from_fn_with_state(
            shutdown.clone(),
            handlers::connection_close_on_drain,
        ))
        .layer(TraceLayer::new_for_http())
}
