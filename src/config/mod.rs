//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags + SUCCESS_RATE env var
//!     → clap (parse, defaults, fatal on bad input)
//!     → Config (validated, immutable)
//!     → shared with the lifecycle and http subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built; there is no reload path
//! - Every knob has a default except the success rate, which is required
//! - Range validation for the success rate lives in the `SuccessRate` type,
//!   so an invalid value cannot be represented

pub mod schema;

pub use schema::{Config, ListenerConfig, ShutdownConfig, SuccessRate, TimeoutConfig};
