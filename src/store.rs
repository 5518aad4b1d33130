//! Persistent ledger of already-notified posts.
//!
//! One `NotifiedStore` owns the channel-to-notified-ids mapping; pollers
//! check and record through it and nothing else mutates it. The ledger
//! survives restarts through a JSON snapshot file (`{"channel": [ids]}`)
//! that is rewritten in full after every recorded notification.

use crate::core::PostId;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Ordered, bounded set of notified post ids for one channel.
///
/// Ids older than the fetch window can never be fetched again, so evicting
/// the oldest entries once the bound is exceeded cannot cause a duplicate
/// notification.
#[derive(Debug, Default)]
struct ChannelLedger {
    order: VecDeque<PostId>,
    ids: HashSet<PostId>,
}

impl ChannelLedger {
    fn from_ids(ids: Vec<PostId>, retain: usize) -> Self {
        let mut ledger = Self::default();
        for id in ids {
            ledger.insert(id, retain);
        }
        ledger
    }

    /// Returns whether `id` was newly added.
    fn insert(&mut self, id: PostId, retain: usize) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > retain {
            if let Some(evicted) = self.order.pop_front() {
                self.ids.remove(&evicted);
            }
        }
        true
    }
}

/// The dedup store: the single writer of the notified-posts state.
#[derive(Debug)]
pub struct NotifiedStore {
    ledgers: Mutex<HashMap<String, ChannelLedger>>,
    path: PathBuf,
    retain_per_channel: usize,
    /// Serializes snapshot writes so concurrent pollers cannot interleave
    /// temp-file writes or publish an older state over a newer one.
    write_lock: tokio::sync::Mutex<()>,
}

impl NotifiedStore {
    /// Creates an empty store with a ledger per known channel.
    pub fn new(path: impl Into<PathBuf>, channels: &[String], retain_per_channel: usize) -> Self {
        let ledgers = channels
            .iter()
            .map(|name| (name.clone(), ChannelLedger::default()))
            .collect();
        Self {
            ledgers: Mutex::new(ledgers),
            path: path.into(),
            retain_per_channel,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Loads the store from a previous snapshot.
    ///
    /// A missing, unreadable, or malformed snapshot is not an error: the
    /// store starts fresh with an empty ledger per known channel and the
    /// condition is logged. Losing the snapshot can repeat a notification
    /// only for posts still inside the fetch window.
    pub async fn load(
        path: impl Into<PathBuf>,
        channels: &[String],
        retain_per_channel: usize,
    ) -> Self {
        let path = path.into();
        let store = Self::new(path.clone(), channels, retain_per_channel);

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, Vec<PostId>>>(&bytes) {
                Ok(persisted) => {
                    let total: usize = persisted.values().map(Vec::len).sum();
                    {
                        let mut ledgers = store.ledgers.lock().unwrap();
                        for (channel, ids) in persisted {
                            ledgers
                                .insert(channel, ChannelLedger::from_ids(ids, retain_per_channel));
                        }
                    }
                    info!(
                        path = %path.display(),
                        posts = total,
                        "Loaded notified-posts snapshot"
                    );
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Snapshot is malformed, starting with empty ledgers"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No snapshot found, starting with empty ledgers");
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Snapshot is unreadable, starting with empty ledgers"
                );
            }
        }

        store
    }

    /// True when `id` has already been notified for `channel`.
    pub fn has(&self, channel: &str, id: PostId) -> bool {
        self.ledgers
            .lock()
            .unwrap()
            .get(channel)
            .map_or(false, |ledger| ledger.ids.contains(&id))
    }

    /// Records `id` as notified for `channel`. Recording the same id twice
    /// is a no-op. Returns whether the id was newly added.
    pub fn record(&self, channel: &str, id: PostId) -> bool {
        let mut ledgers = self.ledgers.lock().unwrap();
        let ledger = ledgers.entry(channel.to_string()).or_default();
        ledger.insert(id, self.retain_per_channel)
    }

    /// The current state, channels sorted for a stable file layout, ids in
    /// notification order.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<PostId>> {
        self.ledgers
            .lock()
            .unwrap()
            .iter()
            .map(|(channel, ledger)| (channel.clone(), ledger.order.iter().copied().collect()))
            .collect()
    }

    /// Writes the current state to the snapshot file.
    ///
    /// The snapshot goes to a temp file first and is renamed over the
    /// previous one, so a failed write never corrupts durable state.
    /// Callers treat an `Err` as log-and-continue; the in-memory state
    /// stays authoritative either way.
    pub async fn persist(&self) -> anyhow::Result<()> {
        // Snapshot under the write lock: a persist that acquires the lock
        // later must never publish an older state.
        let _guard = self.write_lock.lock().await;
        let snapshot = self.snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = {
            let mut os = self.path.clone().into_os_string();
            os.push(".tmp");
            PathBuf::from(os)
        };
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            channels = snapshot.len(),
            "Wrote notified-posts snapshot"
        );
        Ok(())
    }
}
