//! Startup orchestration.
//!
//! Spawns both listeners under supervision and gates readiness on both being
//! confirmed live, so the readiness probe never reports true while the
//! application listener is still binding.

use crate::config::Config;
use crate::health::HealthState;
use crate::http::server::{app_router, metrics_router};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::supervisor::{spawn_server, ServeError, ServerHandle, ServerSpec};

/// A launched pair of listeners plus the shared coordination handles.
pub struct Running {
    /// The application listener (flaky endpoint).
    pub app: ServerHandle,
    /// The metrics/health listener.
    pub metrics: ServerHandle,
    /// Stop broadcast; trigger to begin the coordinated drain.
    pub shutdown: Shutdown,
    /// Readiness flag consumed by the readiness probe.
    pub health: HealthState,
}

impl Running {
    /// Wait for both listeners to reach a terminal state.
    ///
    /// Returns the first fatal error if either listener crashed; drain
    /// timeouts are not errors. Completes only once both listeners are done,
    /// even when one finishes draining before the other.
    pub async fn join(self) -> Result<(), ServeError> {
        tokio::try_join!(self.app.join(), self.metrics.join())?;
        Ok(())
    }
}

/// Start both listeners concurrently under the lifecycle supervisor.
///
/// Bind failures are not surfaced here; they arrive through
/// [`Running::join`] after the affected handle reports `Crashed`, so the
/// caller always gets handles to wait on.
pub async fn launch(config: Config) -> Running {
    let health = HealthState::new();
    let shutdown = Shutdown::new();

    let app = spawn_server(
        ServerSpec {
            name: "server",
            bind_address: config.server.bind_address.clone(),
            router: app_router(&config, &shutdown),
            health: Some(health.clone()),
        },
        &shutdown,
        config.shutdown,
    );

    let metrics = spawn_server(
        ServerSpec {
            name: "metrics",
            bind_address: config.metrics.bind_address.clone(),
            router: metrics_router(&config, health.clone(), &shutdown),
            health: None,
        },
        &shutdown,
        config.shutdown,
    );

    let mut running = Running {
        app,
        metrics,
        shutdown,
        health,
    };

    // Readiness reports true only once both listeners are confirmed live.
    if running.app.wait_until_serving().await && running.metrics.wait_until_serving().await {
        running.health.set_ready(true);
        tracing::info!("All listeners serving, readiness enabled");
    }

    running
}
