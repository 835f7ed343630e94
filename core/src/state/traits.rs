//! Capability interfaces implemented per state domain.

use async_trait::async_trait;

use super::session::SessionState;
use super::types::{StateEvent, StateType};
use super::validation::{Severity, ValidationReport};
use super::value::{StateValue, WorkflowState};
use crate::error::{StateError, StateResult, ValidationError};

/// Backing store for one [`StateType`].
///
/// Providers own their locking; the manager adds no per-id serialization.
#[async_trait]
pub trait StateProvider: Send + Sync {
    fn state_type(&self) -> StateType;
    async fn get_state(&self, id: &str) -> StateResult<StateValue>;
    async fn set_state(&self, id: &str, value: StateValue) -> StateResult<()>;
    async fn delete_state(&self, id: &str) -> StateResult<()>;
    async fn list_states(&self) -> StateResult<Vec<String>>;
}

pub trait StateValidator: Send + Sync {
    fn name(&self) -> &str;

    /// Fail-fast check applied on every write.
    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError>;

    /// All findings for `value`, including warnings.
    ///
    /// The default wraps [`validate`](Self::validate) and reports at most one
    /// error. Validators that override this usually implement `validate` as
    /// `self.report(..).into_result()`.
    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        if let Err(e) = self.validate(state_type, value) {
            report.error(Severity::High, e);
        }
        report
    }
}

#[async_trait]
pub trait StateMigrator: Send + Sync {
    async fn migrate_state(
        &self,
        from_version: &str,
        to_version: &str,
        value: StateValue,
    ) -> StateResult<StateValue>;
}

/// Pure transform from a source domain value to a target domain value.
pub trait StateMapping: Send + Sync {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue>;

    fn supports_reverse(&self) -> bool {
        false
    }

    fn reverse_map(&self, _target: StateValue) -> StateResult<StateValue> {
        Err(StateError::MappingNotReversible)
    }
}

#[async_trait]
pub trait StateObserver: Send + Sync {
    fn id(&self) -> &str;

    fn is_active(&self) -> bool {
        true
    }

    async fn on_state_change(&self, event: &StateEvent) -> anyhow::Result<()>;
}

/// Filter for [`SessionManager::list_sessions`].
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub label: Option<String>,
    pub include_expired: bool,
}

impl SessionFilter {
    pub fn all() -> Self {
        Self {
            label: None,
            include_expired: true,
        }
    }

    pub fn matches(&self, session: &SessionState) -> bool {
        if !self.include_expired && session.is_expired() {
            return false;
        }
        match &self.label {
            Some(label) => session.labels.iter().any(|l| l == label),
            None => true,
        }
    }
}

pub type SessionMutator = Box<dyn FnOnce(&mut SessionState) + Send>;

/// External session store. The session provider delegates to it entirely.
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn get_session(&self, session_id: &str) -> anyhow::Result<Option<SessionState>>;
    async fn update_session(&self, session_id: &str, mutator: SessionMutator) -> anyhow::Result<()>;
    async fn delete_session(&self, session_id: &str) -> anyhow::Result<()>;
    async fn list_sessions(&self, filter: &SessionFilter) -> anyhow::Result<Vec<SessionState>>;
}

/// Persists workflow snapshots whenever the workflow provider writes.
#[async_trait]
pub trait CheckpointManager: Send + Sync {
    async fn save_checkpoint(&self, workflow_id: &str, state: &WorkflowState) -> anyhow::Result<()>;
}
