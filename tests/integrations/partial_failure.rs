//! Delivery failures for some chats must not retry, block, or unrecord a
//! post. Once a dispatch round ends, the post is settled.

use anyhow::Result;
use reachwatch::core::{ChannelHandle, MonitoredChannel};
use reachwatch::notify::Dispatcher;
use reachwatch::poller::ChannelPoller;
use reachwatch::store::NotifiedStore;
use std::collections::HashSet;
use std::sync::Arc;

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::mock_feed::{post, MockChannelFeed};
use helpers::mock_notifier::RecordingNotifier;

fn newsx() -> MonitoredChannel {
    MonitoredChannel {
        name: "NewsX".to_string(),
        handle: Some(ChannelHandle {
            id: 7,
            title: "NewsX Daily".to_string(),
        }),
    }
}

fn build(
    dir: &tempfile::TempDir,
    chat_ids: Vec<i64>,
) -> (Arc<MockChannelFeed>, Arc<RecordingNotifier>, Arc<NotifiedStore>, ChannelPoller) {
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = Arc::new(Dispatcher::new(notifier.clone(), chat_ids));
    let poller = ChannelPoller::new(feed.clone(), dispatcher, store.clone(), 300, 100);
    (feed, notifier, store, poller)
}

#[tokio::test]
async fn test_one_failing_chat_does_not_stop_the_rest() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (feed, notifier, store, poller) = build(&dir, vec![100, 200, 300]);
    feed.set_posts(7, vec![post(42, Some(500), "hello")]);
    notifier.fail_chat(200);

    poller.poll(&newsx()).await;

    assert_eq!(notifier.attempt_count(), 3);
    let delivered: HashSet<i64> = notifier.sent().iter().map(|(chat, _)| *chat).collect();
    assert_eq!(delivered, HashSet::from([100, 300]));
    assert!(store.has("NewsX", 42));
    Ok(())
}

#[tokio::test]
async fn test_failed_chats_are_not_retried_on_the_next_round() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (feed, notifier, store, poller) = build(&dir, vec![100, 200]);
    feed.set_posts(7, vec![post(42, Some(500), "hello")]);
    notifier.fail_chat(200);

    poller.poll(&newsx()).await;
    assert_eq!(notifier.attempt_count(), 2);
    assert!(store.has("NewsX", 42));

    // The post is recorded, so the failed chat never hears about it again.
    poller.poll(&newsx()).await;
    assert_eq!(notifier.attempt_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_post_is_recorded_even_when_every_chat_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (feed, notifier, store, poller) = build(&dir, vec![100, 200]);
    feed.set_posts(7, vec![post(42, Some(500), "hello")]);
    notifier.fail_chat(100);
    notifier.fail_chat(200);

    poller.poll(&newsx()).await;

    assert_eq!(notifier.attempt_count(), 2);
    assert!(notifier.sent().is_empty());
    assert!(store.has("NewsX", 42));
    Ok(())
}
