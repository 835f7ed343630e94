//! # 状态管理模块
//!
//! 各状态域（会话、工作流、对话、工具、全局）通过统一的管理器读写，
//! 每次变更记录事件并异步通知观察者。

pub mod manager;
pub mod memory;
pub mod registry;
pub mod session;
pub mod traits;
pub mod transaction;
pub mod types;
pub mod validation;
pub mod value;

pub use manager::UnifiedStateManager;
pub use memory::InMemoryStateProvider;
pub use registry::StateRegistry;
pub use session::{SessionState, SESSION_SCHEMA_VERSION};
pub use traits::{
    CheckpointManager, SessionFilter, SessionManager, SessionMutator, StateMapping, StateMigrator,
    StateObserver, StateProvider, StateValidator,
};
pub use transaction::StateTransaction;
pub use types::{StateEvent, StateEventType, StateType};
pub use validation::{CompositeValidator, RiskLevel, Severity, ValidationIssue, ValidationReport};
pub use value::{
    ConversationMessage, ConversationStage, ConversationState, StateValue, WorkflowState,
    WorkflowStatus,
};
