//! Fan-out of one notification to every configured chat.

use crate::core::{ChatId, NotificationEvent, Notifier};
use crate::formatting;
use crate::notify::NotifyError;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

/// Result of one destination send within a dispatch round.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub chat_id: ChatId,
    pub result: Result<(), NotifyError>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Broadcasts notifications to a fixed set of chats.
///
/// Destinations are independent: a dispatch round waits for every send to
/// finish, and a failing chat never blocks, cancels, or retries the others.
/// The caller records the post as notified once the round returns,
/// regardless of per-chat failures.
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    chat_ids: Vec<ChatId>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, chat_ids: Vec<ChatId>) -> Self {
        Self { notifier, chat_ids }
    }

    /// Renders `event` once and sends the identical text to every chat
    /// concurrently. Returns one outcome per chat, in configuration order.
    pub async fn dispatch(&self, event: &NotificationEvent) -> Vec<DispatchOutcome> {
        let text = formatting::format_notification(event);

        let sends = self.chat_ids.iter().map(|&chat_id| {
            let notifier = self.notifier.clone();
            let text = &text;
            async move {
                DispatchOutcome {
                    chat_id,
                    result: notifier.send(chat_id, text).await,
                }
            }
        });
        let outcomes = join_all(sends).await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => info!(
                    notifier = self.notifier.name(),
                    chat_id = outcome.chat_id,
                    channel = %event.channel_title,
                    post_id = event.post_id,
                    views = event.views,
                    "Notification delivered"
                ),
                Err(e) => error!(
                    notifier = self.notifier.name(),
                    chat_id = outcome.chat_id,
                    channel = %event.channel_title,
                    post_id = event.post_id,
                    error = %e,
                    "Notification failed"
                ),
            }
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        metrics::counter!("notifications_sent_total").increment((outcomes.len() - failed) as u64);
        if failed > 0 {
            metrics::counter!("notifications_failed_total").increment(failed as u64);
        }

        outcomes
    }
}
