//! Readiness state shared between the lifecycle manager and the probe
//! handlers.
//!
//! # Data Flow
//! ```text
//! startup (both listeners confirmed serving)
//!     → HealthState::set_ready(true)
//!
//! stop signal observed by the application listener
//!     → HealthState::set_ready(false)   (before the settle delay starts)
//!
//! GET /readiness
//!     → HealthState::is_ready()  →  200 "OK" | 502 "Unhealthy"
//! ```

pub mod state;

pub use state::HealthState;
