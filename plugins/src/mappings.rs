//! Cross-domain mappings between built-in state types.

use serde_json::json;
use unistate_core::api::{StateError, StateMapping, StateResult, StateValue};

/// Retags tool JSON as global JSON, and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolToGlobalMapping;

impl StateMapping for ToolToGlobalMapping {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue> {
        match source {
            StateValue::Tool(body) => Ok(StateValue::Global(body)),
            other => Err(StateError::MappingFailed(format!(
                "expected tool state, got {}",
                other.kind()
            ))),
        }
    }

    fn supports_reverse(&self) -> bool {
        true
    }

    fn reverse_map(&self, target: StateValue) -> StateResult<StateValue> {
        match target {
            StateValue::Global(body) => Ok(StateValue::Tool(body)),
            other => Err(StateError::MappingFailed(format!(
                "expected global state, got {}",
                other.kind()
            ))),
        }
    }
}

/// Projects a workflow onto a small global summary document. One way only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowSummaryMapping;

impl StateMapping for WorkflowSummaryMapping {
    fn map_state(&self, source: StateValue) -> StateResult<StateValue> {
        let StateValue::Workflow(wf) = source else {
            return Err(StateError::MappingFailed(format!(
                "expected workflow state, got {}",
                source.kind()
            )));
        };
        Ok(StateValue::Global(json!({
            "workflow_id": wf.workflow_id,
            "session_id": wf.session_id,
            "name": wf.workflow_name,
            "stage": wf.current_stage,
            "status": wf.status,
            "progress": wf.progress,
            "updated_at": wf.updated_at,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unistate_core::api::{WorkflowState, WorkflowStatus};

    #[test]
    fn test_tool_to_global_round_trip() {
        let tool = StateValue::Tool(json!({"exit_code": 0}));
        let mapping = ToolToGlobalMapping;
        let global = mapping.map_state(tool.clone()).unwrap();
        assert_eq!(global, StateValue::Global(json!({"exit_code": 0})));
        assert_eq!(mapping.reverse_map(global).unwrap(), tool);
        assert!(mapping.map_state(StateValue::Global(json!(1))).is_err());
    }

    #[test]
    fn test_workflow_summary() {
        let wf = WorkflowState::new("wf-1", "s-1", "deploy")
            .with_progress(75.0)
            .with_status(WorkflowStatus::Running);
        let summary = WorkflowSummaryMapping.map_state(StateValue::Workflow(wf)).unwrap();
        let body = summary.as_json().unwrap();

        assert_eq!(body["workflow_id"], json!("wf-1"));
        assert_eq!(body["stage"], json!("deploy"));
        assert_eq!(body["status"], json!("running"));
        assert_eq!(body["progress"], json!(75.0));
        assert!(!WorkflowSummaryMapping.supports_reverse());
        assert!(matches!(
            WorkflowSummaryMapping.reverse_map(summary),
            Err(StateError::MappingNotReversible)
        ));
    }
}
