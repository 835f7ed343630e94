#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use unistate_core::api::{
    InMemoryStateProvider, StateConfig, StateEvent, StateObserver, StateRegistry, StateType,
    StateValidator, StateValue, UnifiedStateManager, ValidationError,
};

/// Manager with in-memory providers for every state type.
pub fn in_memory_manager() -> UnifiedStateManager {
    in_memory_manager_with(StateConfig::default())
}

pub fn in_memory_manager_with(config: StateConfig) -> UnifiedStateManager {
    let registry = StateType::ALL.into_iter().fold(StateRegistry::new(), |reg, ty| {
        reg.provider(ty, Arc::new(InMemoryStateProvider::new(ty)))
    });
    UnifiedStateManager::with_registry(config, registry)
}

/// Records every event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub id: String,
    pub events: Mutex<Vec<StateEvent>>,
}

impl RecordingObserver {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            events: Mutex::new(Vec::new()),
        })
    }

    pub async fn count(&self) -> usize {
        self.events.lock().await.len()
    }

    /// Waits up to two seconds for at least `n` events.
    pub async fn wait_for(&self, n: usize) -> bool {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.count().await < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl StateObserver for RecordingObserver {
    fn id(&self) -> &str {
        &self.id
    }

    async fn on_state_change(&self, event: &StateEvent) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

pub struct PanickingObserver;

#[async_trait]
impl StateObserver for PanickingObserver {
    fn id(&self) -> &str {
        "panicking"
    }

    async fn on_state_change(&self, _event: &StateEvent) -> anyhow::Result<()> {
        panic!("observer blew up");
    }
}

/// Rejects Global values whose `progress` is outside 0-100.
pub struct ProgressValidator;

impl StateValidator for ProgressValidator {
    fn name(&self) -> &str {
        "progress"
    }

    fn validate(&self, _: StateType, value: &StateValue) -> Result<(), ValidationError> {
        let progress = value
            .as_json()
            .and_then(|v| v.get("progress"))
            .and_then(|v| v.as_f64())
            .ok_or(ValidationError::MissingField("progress"))?;
        if !(0.0..=100.0).contains(&progress) {
            return Err(ValidationError::OutOfRange {
                field: "progress",
                value: progress,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}
