use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use unistate_core::api::{
    CheckpointManager, StateError, StateProvider, StateResult, StateType, StateValue, WorkflowState,
};

/// In-memory workflow store that checkpoints every successful write.
pub struct WorkflowStateProvider {
    workflows: RwLock<HashMap<String, WorkflowState>>,
    checkpoints: Option<Arc<dyn CheckpointManager>>,
}

impl WorkflowStateProvider {
    pub fn new(checkpoints: Option<Arc<dyn CheckpointManager>>) -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            checkpoints,
        }
    }
}

#[async_trait]
impl StateProvider for WorkflowStateProvider {
    fn state_type(&self) -> StateType {
        StateType::Workflow
    }

    async fn get_state(&self, id: &str) -> StateResult<StateValue> {
        self.workflows
            .read()
            .await
            .get(id)
            .cloned()
            .map(StateValue::Workflow)
            .ok_or_else(|| StateError::not_found(StateType::Workflow, id))
    }

    async fn set_state(&self, id: &str, value: StateValue) -> StateResult<()> {
        let StateValue::Workflow(workflow) = value else {
            return Err(StateError::UnexpectedPayload {
                expected: StateType::Workflow,
                actual: value.kind(),
            });
        };

        self.workflows
            .write()
            .await
            .insert(id.to_string(), workflow.clone());

        // 检查点失败不影响写入
        if let Some(checkpoints) = &self.checkpoints {
            if let Err(e) = checkpoints.save_checkpoint(id, &workflow).await {
                tracing::warn!(workflow_id = %id, error = %e, "workflow checkpoint failed");
            }
        }
        Ok(())
    }

    async fn delete_state(&self, id: &str) -> StateResult<()> {
        self.workflows.write().await.remove(id);
        Ok(())
    }

    async fn list_states(&self) -> StateResult<Vec<String>> {
        let mut ids: Vec<String> = self.workflows.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
