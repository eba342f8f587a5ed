//! HTTP surface: the two routers and their handlers.
//!
//! # Responsibilities
//! - Build the application router (catch-all probabilistic responder)
//! - Build the metrics router (/metrics, /liveness, /readiness)
//! - Wire up middleware (request timeout, trace layer)

pub mod handlers;
pub mod server;

pub use server::{app_router, metrics_router, AppState, MetricsState};
