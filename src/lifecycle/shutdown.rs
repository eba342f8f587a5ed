//! Single-shot stop broadcast consumed by every listener supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Coordinator for the stop signal.
///
/// Wraps a broadcast channel plus a latched flag so that delivery is
/// guaranteed regardless of when a listener registers: subscribers that
/// existed before the trigger receive the broadcast, and anyone who
/// subscribes afterwards observes the latch. The signal is never re-armed.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a new, untriggered stop signal.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a listener for the stop signal.
    pub fn subscribe(&self) -> StopListener {
        StopListener {
            rx: self.tx.subscribe(),
            triggered: Arc::clone(&self.triggered),
        }
    }

    /// Fire the stop signal. Idempotent; later calls are no-ops.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        // Send fails only when no receiver is currently registered; the
        // latch covers that case.
        let _ = self.tx.send(());
    }

    /// Whether the signal has already fired.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the stop signal, one per supervised listener.
#[derive(Debug)]
pub struct StopListener {
    rx: broadcast::Receiver<()>,
    triggered: Arc<AtomicBool>,
}

impl StopListener {
    /// Wait until the stop signal fires.
    ///
    /// Resolves immediately when the signal already fired. A closed channel
    /// (every `Shutdown` handle dropped) counts as a stop rather than a
    /// hang.
    pub async fn wait(&mut self) {
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }
        // Any outcome means the signal fired or the coordinator is gone;
        // a lagged receiver still implies at least one send.
        let _ = self.rx.recv().await;
    }
}
