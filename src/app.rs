//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{ChannelFeed, Notifier},
    feed::HttpFeedClient,
    notify::{Dispatcher, TelegramNotifier},
    poller::ChannelPoller,
    scheduler::Scheduler,
    store::NotifiedStore,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

/// A handle to the running monitor.
pub struct App {
    monitor_handle: JoinHandle<()>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Waits for the monitor loop to finish.
    ///
    /// The loop ends after the shutdown signal passed to
    /// [`AppBuilder::build`] has fired and the feed session was closed.
    pub async fn run(self) -> Result<()> {
        if let Err(e) = self.monitor_handle.await {
            error!(error = %e, "Monitor task failed");
            return Err(e.into());
        }
        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// This pattern allows for a clean separation of concerns between
/// constructing the application's components and running the application.
/// It also provides a convenient way to override components for testing.
pub struct AppBuilder {
    config: Config,
    feed_override: Option<Arc<dyn ChannelFeed>>,
    notifier_override: Option<Arc<dyn Notifier>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            feed_override: None,
            notifier_override: None,
        }
    }

    /// Overrides the channel feed for testing.
    pub fn feed_override(mut self, feed: Arc<dyn ChannelFeed>) -> Self {
        self.feed_override = Some(feed);
        self
    }

    /// Overrides the notifier for testing.
    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    /// Builds and initializes all application components, resolves the
    /// configured channels, and spawns the monitor loop.
    ///
    /// Fails when not a single channel resolves; a monitor without channels
    /// has nothing to do and the caller is expected to exit.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;

        // =====================================================================
        // 1. Durable State
        // =====================================================================
        let store = Arc::new(
            NotifiedStore::load(
                &config.state.path,
                &config.feed.channels,
                config.state.retain_per_channel,
            )
            .await,
        );

        // =====================================================================
        // 2. External Services
        // =====================================================================
        let feed: Arc<dyn ChannelFeed> = match self.feed_override {
            Some(feed) => feed,
            None => Arc::new(HttpFeedClient::new(
                config.feed.gateway_url.clone(),
                config.feed.api_token.clone(),
            )?),
        };

        let notifier: Arc<dyn Notifier> = match self.notifier_override {
            Some(notifier) => notifier,
            None => Arc::new(TelegramNotifier::new(
                &config.notify.api_url,
                &config.notify.bot_token,
            )?),
        };

        // =====================================================================
        // 3. Channel Resolution (once, at startup)
        // =====================================================================
        let channels = Scheduler::resolve_channels(&feed, &config.feed.channels).await?;
        let resolved = channels.iter().filter(|c| c.handle.is_some()).count();
        info!(
            resolved,
            configured = channels.len(),
            "Channel resolution complete"
        );

        // =====================================================================
        // 4. Pipeline: poller -> dispatcher -> store
        // =====================================================================
        let dispatcher = Arc::new(Dispatcher::new(notifier, config.notify.chat_ids.clone()));
        let poller = ChannelPoller::new(
            feed.clone(),
            dispatcher,
            store,
            config.threshold,
            config.poll.window_size,
        );
        let scheduler = Scheduler::new(
            feed,
            poller,
            channels,
            Duration::from_secs(config.poll.interval_seconds),
        );

        let monitor_handle = tokio::spawn(scheduler.run(shutdown_rx));

        Ok(App { monitor_handle })
    }
}
