//! Process-wide readiness flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the readiness flag consumed by the readiness probe.
///
/// Starts out unready; the lifecycle manager flips it true once both
/// listeners are confirmed serving and back to false the instant a stop
/// signal is observed. Reads and writes are lock-free and idempotent.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    ready: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new flag, initially unready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the process ready or unready.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Whether the process is currently ready to serve.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
