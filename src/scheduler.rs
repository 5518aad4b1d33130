//! The round loop driving all channel pollers.

use crate::core::{ChannelFeed, MonitoredChannel};
use crate::poller::ChannelPoller;
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Runs one polling round over all channels on a fixed interval until the
/// shutdown signal arrives.
///
/// Rounds never overlap: the next one starts only after every poller of the
/// previous round has finished and the full interval has elapsed. Within a
/// round, all channels are polled concurrently.
pub struct Scheduler {
    feed: Arc<dyn ChannelFeed>,
    poller: ChannelPoller,
    channels: Vec<MonitoredChannel>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        feed: Arc<dyn ChannelFeed>,
        poller: ChannelPoller,
        channels: Vec<MonitoredChannel>,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            poller,
            channels,
            interval,
        }
    }

    /// Resolves every configured channel name, once.
    ///
    /// Resolution happens only at startup. A name that cannot be resolved
    /// is logged and monitored by nobody for the process lifetime; only
    /// when not a single name resolves is this an error, since the monitor
    /// would have nothing to do.
    pub async fn resolve_channels(
        feed: &Arc<dyn ChannelFeed>,
        names: &[String],
    ) -> Result<Vec<MonitoredChannel>> {
        let mut channels = Vec::with_capacity(names.len());
        for name in names {
            let handle = match feed.resolve(name).await {
                Ok(Some(handle)) => {
                    info!(channel = %name, title = %handle.title, "Resolved channel");
                    Some(handle)
                }
                Ok(None) => {
                    warn!(channel = %name, "No channel with this name, it will not be monitored");
                    None
                }
                Err(e) => {
                    error!(
                        channel = %name,
                        error = %e,
                        "Failed to resolve channel, it will not be monitored"
                    );
                    None
                }
            };
            channels.push(MonitoredChannel {
                name: name.clone(),
                handle,
            });
        }

        if channels.iter().all(|c| c.handle.is_none()) {
            anyhow::bail!("none of the configured channels could be resolved, nothing to monitor");
        }
        Ok(channels)
    }

    /// Runs rounds until `shutdown_rx` fires, then closes the feed session.
    ///
    /// The signal is honored both mid-round (in-flight pollers are dropped
    /// at their next await point) and during the sleep between rounds.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            channels = self.channels.len(),
            interval_seconds = self.interval.as_secs(),
            "Monitor loop started"
        );

        loop {
            let round_start = Instant::now();
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Shutdown signal received mid-round, stopping");
                    break;
                }
                _ = self.run_round() => {}
            }

            metrics::counter!("rounds_completed_total").increment(1);
            let elapsed = round_start.elapsed();
            if elapsed > self.interval {
                warn!(
                    round_seconds = elapsed.as_secs(),
                    interval_seconds = self.interval.as_secs(),
                    "Round took longer than the polling interval, schedule is drifting"
                );
            }
            info!(
                seconds = self.interval.as_secs(),
                "Round complete, waiting for the next one"
            );

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping");
                    break;
                }
                _ = sleep(self.interval) => {}
            }
        }

        if let Err(e) = self.feed.close().await {
            warn!(error = %e, "Failed to close the feed session");
        }
        info!("Monitor loop stopped");
    }

    /// Polls every channel concurrently and waits for all of them.
    async fn run_round(&self) {
        debug!("Starting polling round");
        join_all(
            self.channels
                .iter()
                .map(|channel| self.poller.poll(channel)),
        )
        .await;
    }
}
