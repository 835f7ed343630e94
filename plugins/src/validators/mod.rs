mod conversation;
mod global;
mod session;
mod tool;
mod workflow;

pub use conversation::ConversationStateValidator;
pub use global::GlobalStateValidator;
pub use session::SessionStateValidator;
pub use tool::{FieldCheck, ToolStateValidator};
pub use workflow::WorkflowStateValidator;
