//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build routers → spawn both supervisors → both confirmed serving
//!     → mark ready
//!
//! Shutdown (shutdown.rs + supervisor.rs):
//!     Stop broadcast → mark unready → settle delay → graceful drain
//!     (bounded) → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger the stop broadcast
//! ```
//!
//! # Design Decisions
//! - One stop broadcast shared by both listeners, fired exactly once
//! - Readiness flips unready strictly before the settle delay begins,
//!   which completes strictly before the drain is attempted
//! - Drain timeout is recoverable; bind failure and unexpected listener
//!   exit are fatal to the whole process

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::{Shutdown, StopListener};
pub use startup::{launch, Running};
pub use supervisor::{spawn_server, ListenerState, ServeError, ServerHandle, ServerSpec};
