use thiserror::Error;

use super::validation::ValidationError;
use crate::state::types::StateType;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("no provider registered for state type: {0}")]
    NoProviderRegistered(StateType),

    #[error("state not found: {state_type}:{id}")]
    NotFound { state_type: StateType, id: String },

    #[error("validation failed for {state_type}: {source}")]
    ValidationFailed {
        state_type: StateType,
        #[source]
        source: ValidationError,
    },

    #[error("failed to persist {state_type}:{id}: {source}")]
    PersistFailed {
        state_type: StateType,
        id: String,
        #[source]
        source: Box<StateError>,
    },

    #[error("no migrator registered for state type: {0}")]
    NoMigratorRegistered(StateType),

    #[error("no migration path from version '{from}' to '{to}'")]
    NoMigrationPath { from: String, to: String },

    #[error("migration {from} -> {to} failed: {reason}")]
    MigrationFailed {
        from: String,
        to: String,
        reason: String,
    },

    #[error("mapping failed: {0}")]
    MappingFailed(String),

    #[error("mapping does not support reverse")]
    MappingNotReversible,

    #[error("sync session {session_id}: {failed} of {total} states failed to sync")]
    SyncPartialFailure {
        session_id: String,
        failed: usize,
        total: usize,
    },

    #[error("continuous sync already active: {0}")]
    DuplicateActiveSync(String),

    #[error("sync session not found: {0}")]
    SyncSessionNotFound(String),

    #[error("unexpected payload: expected {expected}, got {actual}")]
    UnexpectedPayload {
        expected: StateType,
        actual: StateType,
    },

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StateError {
    pub fn not_found(state_type: StateType, id: impl Into<String>) -> Self {
        Self::NotFound {
            state_type,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Stable snake_case code, used in sync error records and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoProviderRegistered(_) => "no_provider_registered",
            Self::NotFound { .. } => "not_found",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::PersistFailed { .. } => "persist_failed",
            Self::NoMigratorRegistered(_) => "no_migrator_registered",
            Self::NoMigrationPath { .. } => "no_migration_path",
            Self::MigrationFailed { .. } => "migration_failed",
            Self::MappingFailed(_) => "mapping_failed",
            Self::MappingNotReversible => "mapping_not_reversible",
            Self::SyncPartialFailure { .. } => "sync_partial_failure",
            Self::DuplicateActiveSync(_) => "duplicate_active_sync",
            Self::SyncSessionNotFound(_) => "sync_session_not_found",
            Self::UnexpectedPayload { .. } => "unexpected_payload",
            Self::Backend(_) => "backend",
        }
    }
}
