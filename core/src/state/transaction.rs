use super::manager::UnifiedStateManager;
use super::types::StateType;
use super::value::StateValue;
use crate::error::StateResult;

#[derive(Debug, Clone)]
enum Operation {
    Set {
        state_type: StateType,
        id: String,
        value: StateValue,
    },
    Delete {
        state_type: StateType,
        id: String,
    },
}

/// Queue of writes applied together on [`commit`](StateTransaction::commit).
///
/// Not atomic: commit applies operations in order and stops at the first
/// failure, leaving earlier operations applied.
pub struct StateTransaction {
    manager: UnifiedStateManager,
    operations: Vec<Operation>,
}

impl StateTransaction {
    pub(crate) fn new(manager: UnifiedStateManager) -> Self {
        Self {
            manager,
            operations: Vec::new(),
        }
    }

    pub fn set(&mut self, state_type: StateType, id: impl Into<String>, value: StateValue) -> &mut Self {
        self.operations.push(Operation::Set {
            state_type,
            id: id.into(),
            value,
        });
        self
    }

    pub fn delete(&mut self, state_type: StateType, id: impl Into<String>) -> &mut Self {
        self.operations.push(Operation::Delete {
            state_type,
            id: id.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Applies queued operations in FIFO order. Returns how many were applied.
    pub async fn commit(self) -> StateResult<usize> {
        let total = self.operations.len();
        for (applied, op) in self.operations.into_iter().enumerate() {
            let result = match op {
                Operation::Set {
                    state_type,
                    id,
                    value,
                } => self.manager.set_state(state_type, &id, value).await,
                Operation::Delete { state_type, id } => {
                    self.manager.delete_state(state_type, &id).await
                }
            };
            if let Err(e) = result {
                tracing::warn!(applied, total, error = %e, "transaction stopped at first failure");
                return Err(e);
            }
        }
        tracing::debug!(total, "transaction committed");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateConfig;
    use crate::state::memory::InMemoryStateProvider;
    use crate::state::registry::StateRegistry;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_commit_applies_in_order() {
        let registry = StateRegistry::new()
            .provider(StateType::Global, Arc::new(InMemoryStateProvider::new(StateType::Global)));
        let manager = UnifiedStateManager::with_registry(StateConfig::default(), registry);

        let mut tx = manager.create_state_transaction();
        tx.set(StateType::Global, "a", StateValue::Global(json!(1)))
            .set(StateType::Global, "b", StateValue::Global(json!(2)))
            .delete(StateType::Global, "a");
        assert_eq!(tx.len(), 3);

        assert_eq!(tx.commit().await.unwrap(), 3);
        assert_eq!(manager.list_states(StateType::Global).await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_empty_commit() {
        let manager = UnifiedStateManager::new(StateConfig::default());
        let tx = manager.create_state_transaction();
        assert!(tx.is_empty());
        assert_eq!(tx.commit().await.unwrap(), 0);
    }
}
