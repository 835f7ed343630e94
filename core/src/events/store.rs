//! Bounded, per-key history of state events.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::EventStoreConfig;
use crate::state::types::{bucket_key, StateEvent, StateType};

#[derive(Default)]
struct Buckets {
    by_key: HashMap<String, VecDeque<Arc<StateEvent>>>,
    by_id: HashMap<String, Arc<StateEvent>>,
}

impl Buckets {
    fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// In-memory event history keyed by `{type}:{id}`.
///
/// Each bucket keeps at most `max_events_per_key` events, oldest first.
pub struct StateEventStore {
    buckets: RwLock<Buckets>,
    config: EventStoreConfig,
    cleanup: CancellationToken,
}

impl StateEventStore {
    /// Store without a cleanup task. Retention only applies through
    /// [`StateEventStore::purge_older_than`].
    pub fn new(config: EventStoreConfig) -> Self {
        Self {
            buckets: RwLock::new(Buckets::default()),
            config,
            cleanup: CancellationToken::new(),
        }
    }

    /// Store plus a periodic retention task. Requires a Tokio runtime.
    pub fn start(config: EventStoreConfig) -> Arc<Self> {
        let store = Arc::new(Self::new(config));
        spawn_cleanup(Arc::downgrade(&store), store.cleanup.clone(), &store.config);
        store
    }

    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    pub async fn append(&self, event: StateEvent) -> Arc<StateEvent> {
        let event = Arc::new(event);
        let key = event.bucket_key();
        let max = self.config.max_events_per_key.max(1);

        let mut guard = self.buckets.write().await;
        let inner = &mut *guard;
        inner.by_id.insert(event.id.clone(), event.clone());
        let bucket = inner.by_key.entry(key).or_default();
        bucket.push_back(event.clone());
        while bucket.len() > max {
            if let Some(evicted) = bucket.pop_front() {
                inner.by_id.remove(&evicted.id);
            }
        }
        event
    }

    /// Most recent `limit` events for one state, oldest first. `0` returns all.
    pub async fn get_events(&self, state_type: StateType, state_id: &str, limit: usize) -> Vec<Arc<StateEvent>> {
        let guard = self.buckets.read().await;
        let Some(bucket) = guard.by_key.get(&bucket_key(state_type, state_id)) else {
            return Vec::new();
        };
        let skip = if limit == 0 {
            0
        } else {
            bucket.len().saturating_sub(limit)
        };
        bucket.iter().skip(skip).cloned().collect()
    }

    pub async fn get_event_by_id(&self, event_id: &str) -> Option<Arc<StateEvent>> {
        self.buckets.read().await.by_id.get(event_id).cloned()
    }

    /// All events with `timestamp >= since`, across every bucket.
    pub async fn get_events_since(&self, since: DateTime<Utc>) -> Vec<Arc<StateEvent>> {
        let guard = self.buckets.read().await;
        let mut events: Vec<_> = guard
            .by_key
            .values()
            .flatten()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect();
        sort_chronological(&mut events);
        events
    }

    /// Oldest `limit` events of one state type. `0` returns all.
    pub async fn get_events_by_type(&self, state_type: StateType, limit: usize) -> Vec<Arc<StateEvent>> {
        let guard = self.buckets.read().await;
        let mut events: Vec<_> = guard
            .by_key
            .values()
            .flatten()
            .filter(|e| e.state_type == state_type)
            .cloned()
            .collect();
        sort_chronological(&mut events);
        if limit > 0 {
            events.truncate(limit);
        }
        events
    }

    /// Drops events older than `age` and removes emptied buckets.
    pub async fn purge_older_than(&self, age: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(age) {
            Ok(age) => Utc::now() - age,
            Err(_) => return 0,
        };

        let mut guard = self.buckets.write().await;
        let inner = &mut *guard;
        let mut purged = 0;
        for bucket in inner.by_key.values_mut() {
            // Buckets are append-ordered, so expired events sit at the front.
            while bucket.front().is_some_and(|e| e.timestamp < cutoff) {
                if let Some(evicted) = bucket.pop_front() {
                    inner.by_id.remove(&evicted.id);
                    purged += 1;
                }
            }
        }
        inner.by_key.retain(|_, bucket| !bucket.is_empty());
        purged
    }

    pub async fn len(&self) -> usize {
        self.buckets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn bucket_count(&self) -> usize {
        self.buckets.read().await.by_key.len()
    }

    /// Stops the cleanup task. Stored events stay readable.
    pub fn shutdown(&self) {
        self.cleanup.cancel();
    }
}

impl Drop for StateEventStore {
    fn drop(&mut self) {
        self.cleanup.cancel();
    }
}

fn sort_chronological(events: &mut [Arc<StateEvent>]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.sequence.cmp(&b.sequence))
    });
}

fn spawn_cleanup(store: Weak<StateEventStore>, cancel: CancellationToken, config: &EventStoreConfig) {
    let period = Duration::from_secs(config.cleanup_interval_secs.max(1));
    let retention = Duration::from_secs(config.retention_secs);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(store) = store.upgrade() else { break };
                    let purged = store.purge_older_than(retention).await;
                    if purged > 0 {
                        let remaining = store.len().await;
                        tracing::debug!(purged, remaining, "event store cleanup");
                    }
                }
            }
        }
        tracing::debug!("event store cleanup task stopped");
    });
}
