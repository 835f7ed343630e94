use async_trait::async_trait;
use unistate_core::api::{StateEvent, StateObserver};

/// Logs every state event at debug level.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    id: String,
}

impl TracingObserver {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("tracing")
    }
}

#[async_trait]
impl StateObserver for TracingObserver {
    fn id(&self) -> &str {
        &self.id
    }

    async fn on_state_change(&self, event: &StateEvent) -> anyhow::Result<()> {
        tracing::debug!(
            target: "unistate.events",
            event_id = %event.id,
            sequence = event.sequence,
            event_type = ?event.event_type,
            state_type = %event.state_type,
            state_id = %event.state_id,
            "state event"
        );
        Ok(())
    }
}
