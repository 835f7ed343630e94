//! 统一状态管理器

use std::sync::Arc;

use tokio::sync::RwLock;

use super::registry::StateRegistry;
use super::session::SessionState;
use super::traits::{StateMigrator, StateObserver, StateProvider, StateValidator};
use super::transaction::StateTransaction;
use super::types::{StateEvent, StateEventType, StateType};
use super::validation::ValidationReport;
use super::value::StateValue;
use crate::config::StateConfig;
use crate::error::{StateError, StateResult};
use crate::events::StateEventStore;
use crate::observer::ObserverDispatch;

/// Single entry point for reading, writing and observing state across domains.
///
/// Cheap to clone. Construction spawns the event-store cleanup task and the
/// observer dispatcher, so it must happen inside a Tokio runtime.
#[derive(Clone)]
pub struct UnifiedStateManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: StateConfig,
    /// Held only to look up capabilities, never across a provider call.
    registry: RwLock<StateRegistry>,
    events: Arc<StateEventStore>,
    dispatch: ObserverDispatch,
}

impl UnifiedStateManager {
    /// 创建空的状态管理器
    pub fn new(config: StateConfig) -> Self {
        Self::with_registry(config, StateRegistry::default())
    }

    pub fn with_registry(config: StateConfig, registry: StateRegistry) -> Self {
        let events = StateEventStore::start(config.event_store.clone());
        let dispatch = ObserverDispatch::start(&config.observers);

        tracing::debug!(
            providers = registry.providers.len(),
            observers = registry.observers.len(),
            "state manager started"
        );

        Self {
            inner: Arc::new(ManagerInner {
                config,
                registry: RwLock::new(registry),
                events,
                dispatch,
            }),
        }
    }

    pub fn config(&self) -> &StateConfig {
        &self.inner.config
    }

    pub fn event_store(&self) -> &Arc<StateEventStore> {
        &self.inner.events
    }

    /// Notifications discarded because the observer queue was full.
    pub fn dropped_notifications(&self) -> u64 {
        self.inner.dispatch.dropped_count()
    }

    pub async fn register_state_provider(&self, state_type: StateType, provider: Arc<dyn StateProvider>) {
        self.inner
            .registry
            .write()
            .await
            .providers
            .insert(state_type, provider);
        tracing::debug!(state_type = %state_type, "provider registered");
    }

    pub async fn register_validator(&self, state_type: StateType, validator: Arc<dyn StateValidator>) {
        let name = validator.name().to_string();
        self.inner
            .registry
            .write()
            .await
            .validators
            .insert(state_type, validator);
        tracing::debug!(state_type = %state_type, validator = %name, "validator registered");
    }

    pub async fn register_migrator(&self, state_type: StateType, migrator: Arc<dyn StateMigrator>) {
        self.inner
            .registry
            .write()
            .await
            .migrators
            .insert(state_type, migrator);
        tracing::debug!(state_type = %state_type, "migrator registered");
    }

    pub async fn register_observer(&self, observer: Arc<dyn StateObserver>) {
        let id = observer.id().to_string();
        self.inner.registry.write().await.observers.push(observer);
        tracing::debug!(observer = %id, "observer registered");
    }

    /// Types that currently have a provider.
    pub async fn registered_types(&self) -> Vec<StateType> {
        self.inner.registry.read().await.provider_types()
    }

    async fn provider(&self, state_type: StateType) -> StateResult<Arc<dyn StateProvider>> {
        self.inner.registry.read().await.get_provider(state_type)
    }

    pub async fn get_state(&self, state_type: StateType, id: &str) -> StateResult<StateValue> {
        self.provider(state_type).await?.get_state(id).await
    }

    /// 写入状态：校验 -> 持久化 -> 记录事件 -> 通知观察者
    ///
    /// The event is [`StateEventType::Created`] when the provider had no
    /// prior value for `id` and [`StateEventType::Updated`] otherwise.
    /// Consumers that want every write must match both variants; the
    /// first write of an id is never reported as `Updated`.
    pub async fn set_state(&self, state_type: StateType, id: &str, value: StateValue) -> StateResult<()> {
        let (provider, validator) = {
            let registry = self.inner.registry.read().await;
            (registry.get_provider(state_type)?, registry.get_validator(state_type))
        };

        if let Some(validator) = validator {
            validator
                .validate(state_type, &value)
                .map_err(|source| StateError::ValidationFailed { state_type, source })?;
        }

        let old_value = provider.get_state(id).await.ok();
        provider
            .set_state(id, value.clone())
            .await
            .map_err(|e| persist_failed(state_type, id, e))?;

        let event_type = if old_value.is_some() {
            StateEventType::Updated
        } else {
            StateEventType::Created
        };
        tracing::debug!(state_type = %state_type, id, ?event_type, "state written");

        let event = StateEvent::new(event_type, state_type, id)
            .with_old_value(old_value)
            .with_new_value(Some(value));
        self.publish_event(event).await;
        Ok(())
    }

    /// Full validation report for `value` without writing it.
    ///
    /// Domains without a validator get an empty, valid report.
    pub async fn validate_state(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let validator = self.inner.registry.read().await.get_validator(state_type);
        match validator {
            Some(validator) => validator.report(state_type, value),
            None => ValidationReport::new("none", state_type),
        }
    }

    /// Validation report for the currently stored value of `id`.
    pub async fn inspect_state(&self, state_type: StateType, id: &str) -> StateResult<ValidationReport> {
        let value = self.get_state(state_type, id).await?;
        let report = self.validate_state(state_type, &value).await;
        if !report.warnings.is_empty() {
            tracing::debug!(
                state_type = %state_type,
                id,
                warnings = report.warnings.len(),
                score = report.score(),
                "stored state has validation warnings"
            );
        }
        Ok(report)
    }

    pub async fn delete_state(&self, state_type: StateType, id: &str) -> StateResult<()> {
        let provider = self.provider(state_type).await?;

        let old_value = provider.get_state(id).await.ok();
        provider
            .delete_state(id)
            .await
            .map_err(|e| persist_failed(state_type, id, e))?;
        tracing::debug!(state_type = %state_type, id, "state deleted");

        let event = StateEvent::new(StateEventType::Deleted, state_type, id).with_old_value(old_value);
        self.publish_event(event).await;
        Ok(())
    }

    /// Migrates the stored value between schema versions.
    ///
    /// The migrated value is validated before it is written; on any failure
    /// the stored value is left as it was.
    pub async fn migrate_state(
        &self,
        state_type: StateType,
        id: &str,
        from_version: &str,
        to_version: &str,
    ) -> StateResult<()> {
        let (provider, migrator, validator) = {
            let registry = self.inner.registry.read().await;
            (
                registry.get_provider(state_type)?,
                registry.get_migrator(state_type)?,
                registry.get_validator(state_type),
            )
        };

        let current = provider.get_state(id).await?;
        let migrated = migrator
            .migrate_state(from_version, to_version, current.clone())
            .await?;

        if let Some(validator) = validator {
            validator
                .validate(state_type, &migrated)
                .map_err(|source| StateError::ValidationFailed { state_type, source })?;
        }

        provider
            .set_state(id, migrated.clone())
            .await
            .map_err(|e| persist_failed(state_type, id, e))?;
        tracing::debug!(state_type = %state_type, id, from_version, to_version, "state migrated");

        let event = StateEvent::new(StateEventType::Migrated, state_type, id)
            .with_old_value(Some(current))
            .with_new_value(Some(migrated))
            .with_metadata("from", from_version)
            .with_metadata("to", to_version);
        self.publish_event(event).await;
        Ok(())
    }

    pub async fn list_states(&self, state_type: StateType) -> StateResult<Vec<String>> {
        let mut ids = self.provider(state_type).await?.list_states().await?;
        ids.sort();
        Ok(ids)
    }

    /// Most recent `limit` events for one state, oldest first. `0` returns all.
    pub async fn get_state_history(&self, state_type: StateType, id: &str, limit: usize) -> Vec<Arc<StateEvent>> {
        self.inner.events.get_events(state_type, id, limit).await
    }

    pub async fn get_session_state(&self, session_id: &str) -> StateResult<SessionState> {
        match self.get_state(StateType::Session, session_id).await? {
            StateValue::Session(session) => Ok(session),
            other => Err(StateError::UnexpectedPayload {
                expected: StateType::Session,
                actual: other.kind(),
            }),
        }
    }

    /// Records an event and queues it for observers.
    pub async fn publish_event(&self, event: StateEvent) -> Arc<StateEvent> {
        let event = self.inner.events.append(event).await;
        let observers = self.inner.registry.read().await.observers.clone();
        self.inner.dispatch.notify(event.clone(), observers).await;
        event
    }

    pub fn create_state_transaction(&self) -> StateTransaction {
        StateTransaction::new(self.clone())
    }

    /// Replication hook. Accepts the target and does nothing else yet.
    pub async fn enable_state_replication(&self, target: &str) -> StateResult<()> {
        tracing::info!(
            target_node = target,
            configured = self.inner.config.replication.enabled,
            peers = self.inner.config.replication.peers.len(),
            "state replication requested; not implemented in this build"
        );
        Ok(())
    }

    /// Stops background maintenance. Reads and writes keep working.
    pub fn shutdown(&self) {
        self.inner.events.shutdown();
        tracing::debug!("state manager shut down");
    }
}

fn persist_failed(state_type: StateType, id: &str, source: StateError) -> StateError {
    StateError::PersistFailed {
        state_type,
        id: id.to_string(),
        source: Box::new(source),
    }
}
