use std::collections::HashMap;
use std::sync::Arc;

use super::traits::{StateMigrator, StateObserver, StateProvider, StateValidator};
use super::types::StateType;
use crate::error::{StateError, StateResult};

/// Capability tables owned by a manager.
///
/// Also used as a builder to seed [`UnifiedStateManager::with_registry`](super::UnifiedStateManager::with_registry).
/// Registering a type twice replaces the earlier entry.
#[derive(Clone, Default)]
pub struct StateRegistry {
    pub(crate) providers: HashMap<StateType, Arc<dyn StateProvider>>,
    pub(crate) validators: HashMap<StateType, Arc<dyn StateValidator>>,
    pub(crate) migrators: HashMap<StateType, Arc<dyn StateMigrator>>,
    pub(crate) observers: Vec<Arc<dyn StateObserver>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, state_type: StateType, provider: Arc<dyn StateProvider>) -> Self {
        self.providers.insert(state_type, provider);
        self
    }

    pub fn validator(mut self, state_type: StateType, validator: Arc<dyn StateValidator>) -> Self {
        self.validators.insert(state_type, validator);
        self
    }

    pub fn migrator(mut self, state_type: StateType, migrator: Arc<dyn StateMigrator>) -> Self {
        self.migrators.insert(state_type, migrator);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn has_provider(&self, state_type: StateType) -> bool {
        self.providers.contains_key(&state_type)
    }

    /// Types with a provider, in [`StateType::ALL`] order.
    pub fn provider_types(&self) -> Vec<StateType> {
        StateType::ALL
            .into_iter()
            .filter(|ty| self.providers.contains_key(ty))
            .collect()
    }

    pub(crate) fn get_provider(&self, state_type: StateType) -> StateResult<Arc<dyn StateProvider>> {
        self.providers
            .get(&state_type)
            .cloned()
            .ok_or(StateError::NoProviderRegistered(state_type))
    }

    pub(crate) fn get_migrator(&self, state_type: StateType) -> StateResult<Arc<dyn StateMigrator>> {
        self.migrators
            .get(&state_type)
            .cloned()
            .ok_or(StateError::NoMigratorRegistered(state_type))
    }

    pub(crate) fn get_validator(&self, state_type: StateType) -> Option<Arc<dyn StateValidator>> {
        self.validators.get(&state_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::InMemoryStateProvider;

    #[test]
    fn test_last_registration_wins() {
        let first: Arc<dyn StateProvider> = Arc::new(InMemoryStateProvider::new(StateType::Tool));
        let second: Arc<dyn StateProvider> = Arc::new(InMemoryStateProvider::new(StateType::Tool));
        let registry = StateRegistry::new()
            .provider(StateType::Tool, first)
            .provider(StateType::Tool, second.clone());

        let resolved = registry.get_provider(StateType::Tool).unwrap();
        assert!(Arc::ptr_eq(&resolved, &second));
        assert_eq!(registry.provider_types(), vec![StateType::Tool]);
        assert!(matches!(
            registry.get_provider(StateType::Global),
            Err(StateError::NoProviderRegistered(StateType::Global))
        ));
    }
}
