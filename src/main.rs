//! Flaky demo server entry point.
//!
//! Wires configuration, starts the application and metrics listeners under
//! the lifecycle supervisor, and drains both on SIGTERM/SIGINT.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flaky_server::config::{Config, SuccessRate};
use flaky_server::lifecycle::{launch, signals};

/// HTTP service simulating a configurable success/failure rate.
#[derive(Parser, Debug)]
#[command(name = "flaky-server", version)]
#[command(about = "Demo HTTP service with a configurable success rate and graceful drain")]
struct Args {
    /// Port to listen on for http requests.
    #[arg(long, default_value_t = 8080)]
    server_port: u16,

    /// Port to listen on for metrics and health probes.
    #[arg(long, default_value_t = 8000)]
    metrics_port: u16,

    /// Graceful shutdown timeout, in seconds.
    #[arg(long, default_value_t = 10)]
    stop_timeout: u64,

    /// Wait between marking unready and draining, in seconds. Gives external
    /// load balancers time to observe the unhealthy status.
    #[arg(long, default_value_t = 5)]
    settle_delay: u64,

    /// Percentage of requests that succeed (0-100). Required.
    #[arg(long, env = "SUCCESS_RATE")]
    success_rate: SuccessRate,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.success_rate);
        config.server.bind_address = format!("0.0.0.0:{}", self.server_port);
        config.metrics.bind_address = format!("0.0.0.0:{}", self.metrics_port);
        config.shutdown.stop_timeout = Duration::from_secs(self.stop_timeout);
        config.shutdown.settle_delay = Duration::from_secs(self.settle_delay);
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing or unparseable success rate aborts here, before any
    // listener starts.
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flaky_server=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.into_config();
    tracing::info!(
        server_address = %config.server.bind_address,
        metrics_address = %config.metrics.bind_address,
        success_rate = %config.success_rate,
        settle_delay = ?config.shutdown.settle_delay,
        stop_timeout = ?config.shutdown.stop_timeout,
        "Configuration loaded"
    );

    let running = launch(config).await;

    // Translate the termination signal into the stop broadcast.
    let shutdown = running.shutdown.clone();
    tokio::spawn(async move {
        signals::terminate().await;
        tracing::info!("Termination signal received, beginning drain");
        shutdown.trigger();
    });

    // Blocks until both listeners reach Stopped; the first fatal listener
    // error aborts the process with a non-zero exit status.
    running.join().await?;

    tracing::info!("All listeners stopped");
    Ok(())
}
