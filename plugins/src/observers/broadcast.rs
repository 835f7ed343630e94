use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use unistate_core::api::{StateEvent, StateObserver};

/// Republishes events on a broadcast channel for in-process subscribers.
///
/// Slow subscribers lag and lose the oldest events; the observer itself never
/// waits on them.
pub struct BroadcastObserver {
    id: String,
    tx: broadcast::Sender<Arc<StateEvent>>,
}

impl BroadcastObserver {
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { id: id.into(), tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StateEvent>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl StateObserver for BroadcastObserver {
    fn id(&self) -> &str {
        &self.id
    }

    async fn on_state_change(&self, event: &StateEvent) -> anyhow::Result<()> {
        // No subscribers is not an error.
        let _ = self.tx.send(Arc::new(event.clone()));
        Ok(())
    }
}
