use std::sync::Arc;

use anyhow::Result;
use unistate_core::api::{
    CheckpointManager, IdentityMapping, InMemoryStateProvider, SessionManager, StateConfig,
    StateMapping, StateRegistry, StateType, UnifiedStateManager, VersionedMigrator,
};

use crate::collaborators::{InMemoryCheckpointManager, InMemorySessionManager};
use crate::mappings::{ToolToGlobalMapping, WorkflowSummaryMapping};
use crate::migrations::session_schema_migrator;
use crate::observers::TracingObserver;
use crate::providers::{SessionStateProvider, WorkflowStateProvider};
use crate::validators::{
    ConversationStateValidator, GlobalStateValidator, SessionStateValidator, ToolStateValidator,
    WorkflowStateValidator,
};

/// External systems the default providers delegate to.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionManager>,
    pub checkpoints: Option<Arc<dyn CheckpointManager>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionManager::new()),
            checkpoints: Some(Arc::new(InMemoryCheckpointManager::new())),
        }
    }
}

/// Default provider, validator and migrator set for every state type.
pub fn build_registry(cfg: &StateConfig, collaborators: Collaborators) -> StateRegistry {
    let mut registry = StateRegistry::new()
        .provider(
            StateType::Session,
            Arc::new(SessionStateProvider::new(collaborators.sessions)),
        )
        .provider(
            StateType::Workflow,
            Arc::new(WorkflowStateProvider::new(collaborators.checkpoints)),
        )
        .provider(
            StateType::Conversation,
            Arc::new(InMemoryStateProvider::new(StateType::Conversation)),
        )
        .provider(StateType::Tool, Arc::new(InMemoryStateProvider::new(StateType::Tool)))
        .provider(StateType::Global, Arc::new(InMemoryStateProvider::new(StateType::Global)))
        .validator(
            StateType::Session,
            Arc::new(SessionStateValidator::from_config(&cfg.validation)),
        )
        .validator(StateType::Workflow, Arc::new(WorkflowStateValidator))
        .validator(StateType::Conversation, Arc::new(ConversationStateValidator))
        .validator(StateType::Tool, Arc::new(ToolStateValidator::new()))
        .validator(StateType::Global, Arc::new(GlobalStateValidator))
        .migrator(StateType::Session, Arc::new(session_schema_migrator()));

    // Domains without schema history only accept same-version migrations.
    for ty in [StateType::Workflow, StateType::Conversation, StateType::Tool, StateType::Global] {
        registry = registry.migrator(ty, Arc::new(VersionedMigrator::new()));
    }

    if cfg.observers.log_events {
        registry = registry.observer(Arc::new(TracingObserver::default()));
    }
    registry
}

pub fn build_manager(cfg: &StateConfig, collaborators: Collaborators) -> UnifiedStateManager {
    UnifiedStateManager::with_registry(cfg.clone(), build_registry(cfg, collaborators))
}

/// Resolves a mapping by its CLI name.
pub fn build_mapping(name: &str) -> Result<Arc<dyn StateMapping>> {
    match name {
        "identity" => Ok(Arc::new(IdentityMapping)),
        "tool-to-global" => Ok(Arc::new(ToolToGlobalMapping)),
        "workflow-summary" => Ok(Arc::new(WorkflowSummaryMapping)),
        other => anyhow::bail!("unknown mapping: {other}"),
    }
}
