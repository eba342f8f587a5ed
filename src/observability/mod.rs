//! Observability subsystem.
//!
//! Logging is `tracing` throughout (initialized in `main`); this module owns
//! the Prometheus metrics the demo exists to exercise.
//!
//! # Design Decisions
//! - One counter and one histogram, both labeled by status code
//! - Histogram buckets span 1ms upward by a factor of 10 across 5 buckets,
//!   wide enough to catch both the artificial handler delay and drain stalls
//! - Metric updates are cheap atomic operations on the hot path

pub mod metrics;
