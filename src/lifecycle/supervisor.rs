//! Per-listener supervision state machine.
//!
//! Each listener runs independently through
//! `Starting → Serving → Draining → ShuttingDown → Stopped`, with a terminal
//! `Crashed` for bind failures and unexpected accept-loop exits. Both
//! listeners share one stop broadcast; neither blocks the other's progress.
//!
//! The ordering the rest of the system depends on: readiness is cleared
//! before the settle delay starts, and the settle delay completes before the
//! drain is attempted.

use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::config::ShutdownConfig;
use crate::health::HealthState;
use crate::lifecycle::shutdown::{Shutdown, StopListener};

/// Lifecycle states of a supervised listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Binding the socket.
    Starting,
    /// Accepting connections.
    Serving,
    /// Stop signal observed; unready, still accepting during the settle
    /// window.
    Draining,
    /// Graceful drain in progress, bounded by the stop timeout.
    ShuttingDown,
    /// Terminal: drained (or drain abandoned after timeout).
    Stopped,
    /// Terminal: failed to bind or exited while serving. Fatal.
    Crashed,
}

/// Immutable description of one listener.
///
/// The application listener carries the shared [`HealthState`] so that
/// readiness is cleared the instant its drain begins; the metrics listener
/// carries none.
pub struct ServerSpec {
    /// Listener name for logs and errors.
    pub name: &'static str,
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
    /// Request handler tree, including middleware.
    pub router: Router,
    /// Readiness flag to clear when draining, if this listener owns one.
    pub health: Option<HealthState>,
}

/// Error type for listener supervision.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The socket could not be bound. Fatal at startup.
    #[error("{name}: failed to bind {addr}: {source}")]
    Bind {
        name: &'static str,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The accept loop returned an error while serving. Fatal.
    #[error("{name}: listener failed: {source}")]
    Serve {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// The accept loop returned cleanly without being asked to stop. Fatal.
    #[error("{name}: listener exited unexpectedly")]
    UnexpectedExit { name: &'static str },

    /// The supervisor task itself panicked or was aborted. Fatal.
    #[error("{name}: supervisor task failed: {source}")]
    Supervisor {
        name: &'static str,
        #[source]
        source: JoinError,
    },
}

/// Handle to a supervised listener.
///
/// Exposes the state machine through a watch channel and the final outcome
/// through [`ServerHandle::join`].
pub struct ServerHandle {
    name: &'static str,
    state: watch::Receiver<ListenerState>,
    task: JoinHandle<Result<(), ServeError>>,
}

impl ServerHandle {
    /// Listener name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ListenerState> {
        self.state.clone()
    }

    /// Wait until the listener is accepting connections.
    ///
    /// Returns `false` if it reached a terminal state first; the underlying
    /// error is then available from [`ServerHandle::join`].
    pub async fn wait_until_serving(&mut self) -> bool {
        loop {
            match *self.state.borrow_and_update() {
                ListenerState::Serving
                | ListenerState::Draining
                | ListenerState::ShuttingDown => return true,
                ListenerState::Stopped | ListenerState::Crashed => return false,
                ListenerState::Starting => {}
            }
            if self.state.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Wait for the listener to reach a terminal state.
    pub async fn join(self) -> Result<(), ServeError> {
        match self.task.await {
            Ok(result) => result,
            Err(source) => Err(ServeError::Supervisor {
                name: self.name,
                source,
            }),
        }
    }
}

/// Spawn a listener under supervision.
///
/// The supervisor binds, serves in a separate task, and waits on the stop
/// signal; it never blocks the caller.
pub fn spawn_server(spec: ServerSpec, shutdown: &Shutdown, timing: ShutdownConfig) -> ServerHandle {
    let name = spec.name;
    let stop = shutdown.subscribe();
    let (state_tx, state_rx) = watch::channel(ListenerState::Starting);

    let task = tokio::spawn(supervise(spec, stop, timing, state_tx));

    ServerHandle {
        name,
        state: state_rx,
        task,
    }
}

async fn supervise(
    spec: ServerSpec,
    mut stop: StopListener,
    timing: ShutdownConfig,
    state: watch::Sender<ListenerState>,
) -> Result<(), ServeError> {
    let ServerSpec {
        name,
        bind_address,
        router,
        health,
    } = spec;

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(source) => {
            state.send_replace(ListenerState::Crashed);
            return Err(ServeError::Bind {
                name,
                addr: bind_address,
                source,
            });
        }
    };
    let local_addr = local_addr_or(&listener, &bind_address);

    tracing::info!(listener = name, address = %local_addr, "Listener serving");
    state.send_replace(ListenerState::Serving);

    // Resolving this future makes hyper stop accepting, close idle
    // keep-alive connections, and wait for in-flight requests.
    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = drain_rx.await;
    });
    let mut accept_loop = tokio::spawn(server.into_future());

    tokio::select! {
        exit = &mut accept_loop => {
            // The accept loop must outlive the stop signal; anything else
            // is an unrecoverable failure of this listener.
            state.send_replace(ListenerState::Crashed);
            return Err(classify_early_exit(name, exit));
        }
        _ = stop.wait() => {}
    }

    state.send_replace(ListenerState::Draining);
    if let Some(health) = &health {
        health.set_ready(false);
    }
    tracing::info!(
        listener = name,
        address = %local_addr,
        settle_delay = ?timing.settle_delay,
        "Stop signal received, draining"
    );

    // Keep accepting while external routers converge on the unready status.
    tokio::time::sleep(timing.settle_delay).await;

    state.send_replace(ListenerState::ShuttingDown);
    tracing::info!(
        listener = name,
        address = %local_addr,
        timeout = ?timing.stop_timeout,
        "Shutting down"
    );
    let _ = drain_tx.send(());

    match tokio::time::timeout(timing.stop_timeout, &mut accept_loop).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!(listener = name, address = %local_addr, "Listener stopped");
        }
        Ok(Ok(Err(error))) => {
            tracing::warn!(listener = name, %error, "Listener errored during drain");
        }
        Ok(Err(join_error)) => {
            tracing::warn!(listener = name, error = %join_error, "Accept loop task failed during drain");
        }
        Err(_) => {
            // In-flight requests are not severed; we merely stop waiting.
            tracing::warn!(
                listener = name,
                timeout = ?timing.stop_timeout,
                "Graceful shutdown timed out, abandoning drain"
            );
        }
    }

    state.send_replace(ListenerState::Stopped);
    Ok(())
}

fn classify_early_exit(
    name: &'static str,
    exit: Result<io::Result<()>, JoinError>,
) -> ServeError {
    match exit {
        Ok(Ok(())) => ServeError::UnexpectedExit { name },
        Ok(Err(source)) => ServeError::Serve { name, source },
        Err(source) => ServeError::Supervisor { name, source },
    }
}

fn local_addr_or(listener: &TcpListener, fallback: &str) -> String {
    listener
        .local_addr()
        .map(|addr: SocketAddr| addr.to_string())
        .unwrap_or_else(|_| fallback.to_string())
}
