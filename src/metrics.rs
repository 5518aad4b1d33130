//! A metrics recorder that periodically logs all captured metrics.
//!
//! reachwatch exposes no scrape endpoint; when enabled, the recorder dumps
//! every counter and gauge to the log on a fixed interval instead.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Registers descriptions for every metric the monitor emits.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "rounds_completed_total",
        Unit::Count,
        "Total number of completed polling rounds."
    );
    metrics::describe_counter!(
        "posts_fetched_total",
        Unit::Count,
        "Total number of posts fetched across all channels."
    );
    metrics::describe_counter!(
        "posts_recorded_total",
        Unit::Count,
        "Total number of posts recorded as notified."
    );
    metrics::describe_counter!(
        "notifications_sent_total",
        Unit::Count,
        "Total number of successful destination sends."
    );
    metrics::describe_counter!(
        "notifications_failed_total",
        Unit::Count,
        "Total number of failed destination sends."
    );
    metrics::describe_counter!(
        "feed_errors_total",
        Unit::Count,
        "Total number of per-channel fetch failures."
    );
    metrics::describe_counter!(
        "snapshot_failures_total",
        Unit::Count,
        "Total number of failed notified-posts snapshot writes."
    );
}

/// A metrics recorder that periodically logs all captured metrics.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and the background task that logs a
    /// snapshot every `interval` until the shutdown signal arrives.
    pub fn new(interval: Duration, mut shutdown_rx: watch::Receiver<bool>) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately and would log an empty snapshot.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        for (key, counter) in registry.get_counter_handles() {
                            let value = counter.load(Ordering::Relaxed);
                            info!(metric = %key, value, "[Counter]");
                        }
                        for (key, gauge) in registry.get_gauge_handles() {
                            let value = f64::from_bits(gauge.load(Ordering::Relaxed));
                            info!(metric = %key, value, "[Gauge]");
                        }
                        // Note: Histograms are not logged in this simple implementation
                    }
                }
            }
        });

        (recorder, handle)
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
        // Not implemented for this simple recorder
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry
            .get_or_create_counter(key, |c| c.clone())
            .into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry
            .get_or_create_histogram(key, |h| h.clone())
            .into()
    }
}
