//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `unistate_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, EventStoreConfig, LoggingConfig, ObserverConfig,
    ReplicationConfig, StateConfig, SyncConfig, ValidationConfig,
};
pub use crate::error::{StateError, StateResult, ValidationError};
pub use crate::events::StateEventStore;
pub use crate::migration::{VersionGraph, VersionedMigrator};
pub use crate::state::{
    CheckpointManager, CompositeValidator, ConversationMessage, ConversationStage,
    ConversationState, InMemoryStateProvider, RiskLevel, SessionFilter, SessionManager,
    SessionMutator, SessionState, Severity, StateEvent, StateEventType, StateMapping,
    StateMigrator, StateObserver, StateProvider, StateRegistry, StateTransaction, StateType,
    StateValidator, StateValue, UnifiedStateManager, ValidationIssue, ValidationReport,
    WorkflowState, WorkflowStatus, SESSION_SCHEMA_VERSION,
};
pub use crate::sync::{
    CompositeMapping, FnMapping, IdentityMapping, StateSyncCoordinator, SyncErrorRecord,
    SyncOptions, SyncReport, SyncSessionSnapshot, SyncStrategy,
};
