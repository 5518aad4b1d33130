//! Integration tests for the full polling cycle: fetch, evaluate,
//! dispatch, record.

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

fn channel(name: &str, id: i64, title: &str) -> MonitoredChannel {
    MonitoredChannel {
        name: name.to_string(),
        handle: Some(ChannelHandle {
            id,
            title: title.to_string(),
        }),
    }
}

fn poller_with(
    feed: &Arc<MockChannelFeed>,
    notifier: &Arc<RecordingNotifier>,
    store: &Arc<NotifiedStore>,
    chat_ids: Vec<i64>,
) -> ChannelPoller {
    let dispatcher = Arc::new(Dispatcher::new(notifier.clone(), chat_ids));
    ChannelPoller::new(feed.clone(), dispatcher, store.clone(), 300, 100)
}

#[tokio::test]
async fn test_post_crossing_threshold_notifies_every_chat_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    // 120 ASCII characters, so the preview must stop at 100.
    let text = format!("Breaking update {}", "x".repeat(104));
    feed.set_posts(7, vec![post(42, Some(500), &text)]);

    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100, 200]);

    poller.poll(&channel("NewsX", 7, "NewsX Daily")).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    let chats: HashSet<i64> = sent.iter().map(|(chat, _)| *chat).collect();
    assert_eq!(chats, HashSet::from([100, 200]));

    let body = &sent[0].1;
    assert!(body.contains("**Channel:** NewsX Daily"));
    assert!(body.contains(&format!("**Post:** {}...", &text[..100])));
    assert!(body.contains("**Views:** 500"));
    assert!(sent.iter().all(|(_, b)| b == body));

    assert!(store.has("NewsX", 42));
    Ok(())
}

#[tokio::test]
async fn test_already_notified_post_is_never_sent_again() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    feed.set_posts(7, vec![post(42, Some(500), "hello")]);

    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100, 200]);
    let newsx = channel("NewsX", 7, "NewsX Daily");

    poller.poll(&newsx).await;
    assert_eq!(notifier.attempt_count(), 2);

    // Views keep growing between rounds; the post must stay silenced.
    feed.set_posts(7, vec![post(42, Some(9_000), "hello")]);
    poller.poll(&newsx).await;
    assert_eq!(notifier.attempt_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_below_threshold_and_viewless_posts_stay_silent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    feed.set_posts(7, vec![post(1, Some(299), "close"), post(2, None, "no counter")]);

    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100]);
    let newsx = channel("NewsX", 7, "NewsX Daily");

    poller.poll(&newsx).await;
    assert_eq!(notifier.attempt_count(), 0);
    assert!(!store.has("NewsX", 1));
    assert!(!store.has("NewsX", 2));

    // Reaching the threshold exactly qualifies.
    feed.set_posts(7, vec![post(3, Some(300), "on the line")]);
    poller.poll(&newsx).await;
    assert_eq!(notifier.attempt_count(), 1);
    assert!(store.has("NewsX", 3));
    Ok(())
}

#[tokio::test]
async fn test_every_qualifying_post_of_a_round_is_announced() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    feed.set_posts(
        7,
        vec![
            post(1, Some(301), "one"),
            post(2, Some(302), "two"),
            post(3, Some(100), "three"),
        ],
    );

    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100]);

    poller.poll(&channel("NewsX", 7, "NewsX Daily")).await;

    assert_eq!(notifier.sent().len(), 2);
    assert!(store.has("NewsX", 1));
    assert!(store.has("NewsX", 2));
    assert!(!store.has("NewsX", 3));
    Ok(())
}

#[tokio::test]
async fn test_unresolved_channel_is_skipped_without_a_fetch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["ghost".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100]);

    let unresolved = MonitoredChannel {
        name: "ghost".to_string(),
        handle: None,
    };
    poller.poll(&unresolved).await;

    assert_eq!(feed.fetch_count(), 0);
    assert_eq!(notifier.attempt_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_failing_channel_does_not_affect_the_healthy_one() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(NotifiedStore::new(
        dir.path().join("notified_posts.json"),
        &["NewsX".to_string(), "TechTalk".to_string()],
        500,
    ));
    let feed = Arc::new(MockChannelFeed::new());
    feed.add_channel("NewsX", 7, "NewsX Daily");
    feed.add_channel("TechTalk", 8, "Tech Talk");
    feed.deny_access(7);
    feed.set_posts(8, vec![post(1, Some(400), "works")]);

    let notifier = Arc::new(RecordingNotifier::new());
    let poller = poller_with(&feed, &notifier, &store, vec![100]);

    poller.poll(&channel("NewsX", 7, "NewsX Daily")).await;
    poller.poll(&channel("TechTalk", 8, "Tech Talk")).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("**Channel:** Tech Talk"));
    assert!(store.has("TechTalk", 1));
    Ok(())
}
