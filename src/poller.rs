//! Per-channel polling: fetch, evaluate, dispatch, record.

use crate::core::{ChannelFeed, MonitoredChannel, NotificationEvent};
use crate::evaluator;
use crate::feed::FeedError;
use crate::notify::Dispatcher;
use crate::store::NotifiedStore;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Polls one channel per round and drives every qualifying post through the
/// dispatcher and the dedup store.
pub struct ChannelPoller {
    feed: Arc<dyn ChannelFeed>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<NotifiedStore>,
    threshold: u64,
    window_size: usize,
}

impl ChannelPoller {
    pub fn new(
        feed: Arc<dyn ChannelFeed>,
        dispatcher: Arc<Dispatcher>,
        store: Arc<NotifiedStore>,
        threshold: u64,
        window_size: usize,
    ) -> Self {
        Self {
            feed,
            dispatcher,
            store,
            threshold,
            window_size,
        }
    }

    /// Runs one polling cycle for `channel`.
    ///
    /// Every failure is absorbed here: a channel that cannot be fetched
    /// contributes zero posts this round and the next round retries from
    /// scratch. Only the dedup ledger and its snapshot file are mutated.
    pub async fn poll(&self, channel: &MonitoredChannel) {
        let Some(handle) = &channel.handle else {
            debug!(channel = %channel.name, "Channel was never resolved, skipping");
            return;
        };

        let posts = match self.feed.fetch_recent(handle, self.window_size).await {
            Ok(posts) => posts,
            Err(FeedError::AccessDenied) => {
                error!(channel = %channel.name, "Access to the channel is denied");
                metrics::counter!("feed_errors_total").increment(1);
                return;
            }
            Err(e) => {
                error!(channel = %channel.name, error = %e, "Failed to fetch channel posts");
                metrics::counter!("feed_errors_total").increment(1);
                return;
            }
        };

        trace!(channel = %channel.name, posts = posts.len(), "Fetched posts");
        metrics::counter!("posts_fetched_total").increment(posts.len() as u64);

        for post in evaluator::qualifying(&self.store, &channel.name, self.threshold, &posts) {
            let Some(views) = post.views else { continue };
            let event = NotificationEvent {
                channel_title: handle.title.clone(),
                post_id: post.id,
                text: post.text.clone(),
                views,
            };

            // Every destination attempt finishes before the post is
            // recorded; per-chat failures do not cause a retry.
            self.dispatcher.dispatch(&event).await;

            self.store.record(&channel.name, post.id);
            metrics::counter!("posts_recorded_total").increment(1);
            if let Err(e) = self.store.persist().await {
                warn!(
                    error = %e,
                    "Failed to write notified-posts snapshot, continuing with in-memory state"
                );
                metrics::counter!("snapshot_failures_total").increment(1);
            }
        }
    }
}
