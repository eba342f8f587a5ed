//! Flaky HTTP demo server.
//!
//! Simulates a configurable success/failure rate for testing load balancers,
//! readiness/liveness probing, and metrics pipelines in an orchestrated
//! environment.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌──────────────────────────────────────────────────┐
//!                │                  FLAKY SERVER                    │
//!                │                                                  │
//!   GET /  ──────┼─▶ app listener ──▶ probabilistic responder       │
//!                │       │              200 "Hello World!" / 500    │
//!                │       │                                          │
//!   /metrics ────┼─▶ metrics listener ──▶ Prometheus exposition     │
//!   /liveness    │       │                liveness / readiness      │
//!   /readiness   │       │                                          │
//!                │  ┌────┴─────────────────────────────────────┐    │
//!                │  │            lifecycle supervisor          │    │
//!                │  │  Starting → Serving → Draining →         │    │
//!                │  │  ShuttingDown → Stopped   (or Crashed)   │    │
//!                │  │                                          │    │
//!                │  │  SIGTERM/SIGINT ─▶ stop broadcast        │    │
//!                │  │  drain: mark unready, settle, shut down  │    │
//!                │  └──────────────────────────────────────────┘    │
//!                └──────────────────────────────────────────────────┘
//! ```
//!
//! Both listeners run the same supervision state machine and share a
//! single-shot stop broadcast. The process exits only once both listeners
//! reach `Stopped`.

// Core subsystems
pub mod config;
pub mod http;

// Traffic management
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::{Config, SuccessRate};
pub use health::state::HealthState;
pub use lifecycle::shutdown::Shutdown;
pub use lifecycle::startup::{launch, Running};
pub use lifecycle::supervisor::{ListenerState, ServeError, ServerHandle};
