//! reachwatch - Channel Reach Monitor
//!
//! Polls a fixed set of channels for new posts, announces every post whose
//! view count crossed the configured threshold to a set of chats, and
//! remembers what it has announced so nothing is ever sent twice.

use anyhow::Result;
use clap::Parser;
use reachwatch::{
    app::App,
    cli::Cli,
    config::Config,
    metrics::{describe_metrics, LoggingRecorder},
};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet; this has to go to stderr directly.
            eprintln!("reachwatch: failed to load configuration: {err:#}");
            std::process::exit(1);
        }
    };

    // Initialize logging; RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("reachwatch starting up...");

    // Log the loaded configuration settings for visibility. Tokens are
    // deliberately left out.
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Reach Threshold: {} views", config.threshold);
    info!("Poll Interval: {}s", config.poll.interval_seconds);
    info!("Fetch Window: {} posts", config.poll.window_size);
    info!("Feed Gateway: {}", config.feed.gateway_url);
    info!("Channels: {}", config.feed.channels.join(", "));
    info!("Destination Chats: {}", config.notify.chat_ids.len());
    info!("State File: {}", config.state.path.display());
    info!(
        "Retained Ids Per Channel: {}",
        config.state.retain_per_channel
    );
    info!("Log Metrics: {}", config.metrics.log_metrics);
    if config.metrics.log_metrics {
        info!(
            "Log Aggregation Interval: {}s",
            config.metrics.log_aggregation_seconds
        );
    }
    info!("-------------------------------------------------------");

    // =========================================================================
    // Create Shutdown Channel
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // =========================================================================
    // Initialize Metrics Recorder if enabled
    // =========================================================================
    let mut metrics_task: Option<JoinHandle<()>> = None;
    if config.metrics.log_metrics {
        let (recorder, handle) = LoggingRecorder::new(
            Duration::from_secs(config.metrics.log_aggregation_seconds),
            shutdown_rx.clone(),
        );
        metrics::set_global_recorder(recorder).expect("Failed to install logging recorder");
        metrics_task = Some(handle);
    }
    describe_metrics();

    // =========================================================================
    // Build and Start the Monitor
    // =========================================================================
    let app = match App::builder(config).build(shutdown_rx).await {
        Ok(app) => app,
        Err(err) => {
            error!("Failed to start the monitor: {err:#}");
            std::process::exit(1);
        }
    };

    info!("reachwatch initialized successfully. Monitoring channels...");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    // Send shutdown signal to all tasks
    shutdown_tx.send(true).expect("Failed to send shutdown signal");

    app.run().await?;

    if let Some(handle) = metrics_task {
        if let Err(e) = handle.await {
            error!("Metrics task panicked: {:?}", e);
        }
    }

    info!("All tasks shut down. Exiting.");

    Ok(())
}
