//! Map-backed provider for in-process domains.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::StateProvider;
use super::types::StateType;
use super::value::StateValue;
use crate::error::{StateError, StateResult};

pub struct InMemoryStateProvider {
    state_type: StateType,
    states: RwLock<HashMap<String, StateValue>>,
}

impl InMemoryStateProvider {
    pub fn new(state_type: StateType) -> Self {
        Self {
            state_type,
            states: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[async_trait]
impl StateProvider for InMemoryStateProvider {
    fn state_type(&self) -> StateType {
        self.state_type
    }

    async fn get_state(&self, id: &str) -> StateResult<StateValue> {
        self.states
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StateError::not_found(self.state_type, id))
    }

    async fn set_state(&self, id: &str, value: StateValue) -> StateResult<()> {
        self.states.write().await.insert(id.to_string(), value);
        Ok(())
    }

    async fn delete_state(&self, id: &str) -> StateResult<()> {
        self.states.write().await.remove(id);
        Ok(())
    }

    async fn list_states(&self) -> StateResult<Vec<String>> {
        let mut ids: Vec<String> = self.states.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_crud_and_sorted_listing() {
        let provider = InMemoryStateProvider::new(StateType::Tool);
        provider.set_state("b", StateValue::Tool(json!(2))).await.unwrap();
        provider.set_state("a", StateValue::Tool(json!(1))).await.unwrap();

        assert_eq!(provider.list_states().await.unwrap(), vec!["a", "b"]);
        assert_eq!(provider.get_state("a").await.unwrap(), StateValue::Tool(json!(1)));

        provider.delete_state("a").await.unwrap();
        let err = provider.get_state("a").await.unwrap_err();
        assert!(err.is_not_found());
        // Deleting a missing id is not an error.
        provider.delete_state("a").await.unwrap();
        assert_eq!(provider.len().await, 1);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let provider = InMemoryStateProvider::new(StateType::Global);
        tokio_test::block_on(async {
            provider.set_state("k", StateValue::Global(json!(1))).await.unwrap();
            provider.set_state("k", StateValue::Global(json!(2))).await.unwrap();
            assert_eq!(provider.len().await, 1);
            assert_eq!(provider.get_state("k").await.unwrap(), StateValue::Global(json!(2)));
        });
    }
}
