//! Core domain types and service traits for reachwatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use crate::feed::FeedError;
use crate::notify::NotifyError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Identifier of a destination chat that receives notifications.
pub type ChatId = i64;

/// Identifier of a post, unique within its channel.
pub type PostId = i64;

/// A resolved reference to a channel, obtained once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    /// Feed-side id used to fetch the channel's posts.
    pub id: i64,
    /// Human-readable title, shown in notification text.
    pub title: String,
}

/// One post fetched from a channel feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Post id, unique within its channel.
    pub id: PostId,
    /// Post body. Empty for media-only posts.
    pub text: String,
    /// View count as reported by the feed. `None` when the feed carries no
    /// counter for the post; such posts are never eligible for notification.
    pub views: Option<u64>,
    /// Publication time, when the feed reports one.
    pub date: Option<DateTime<Utc>>,
}

/// A configured channel together with the outcome of its startup resolution.
///
/// `handle` stays `None` for the lifetime of the process when resolution
/// failed; such channels are skipped every polling round.
#[derive(Debug, Clone)]
pub struct MonitoredChannel {
    pub name: String,
    pub handle: Option<ChannelHandle>,
}

/// A post that crossed the reach threshold, paired with the display title of
/// its channel. Exists only between evaluation and dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub channel_title: String,
    pub post_id: PostId,
    pub text: String,
    pub views: u64,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Read access to channels behind the feed gateway.
#[async_trait]
pub trait ChannelFeed: Send + Sync {
    /// Resolves a configured channel name to a feed handle.
    ///
    /// # Returns
    /// * `Ok(Some(handle))` when the channel exists and is readable
    /// * `Ok(None)` when no channel by that name is known
    /// * `Err` for access or transport failures
    async fn resolve(&self, name: &str) -> Result<Option<ChannelHandle>, FeedError>;

    /// Fetches the most recent `limit` posts of a channel, newest first.
    async fn fetch_recent(
        &self,
        handle: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<Post>, FeedError>;

    /// Releases the feed session. Called once during shutdown.
    async fn close(&self) -> Result<(), FeedError>;
}

/// Delivers one rendered notification to one chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Sends `text` to `chat_id`. A failure is scoped to this one chat and
    /// never affects deliveries to other chats.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError>;
}
