mod session;
mod workflow;

pub use session::SessionStateProvider;
pub use workflow::WorkflowStateProvider;
