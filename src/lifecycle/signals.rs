//! OS signal handling.
//!
//! Translates the conventional termination signals into a single resolved
//! future; the entrypoint turns that into a stop broadcast. Signal handler
//! installation failures are unrecoverable this early in startup.

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
pub async fn terminate() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm => {},
    }
}
