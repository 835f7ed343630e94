//! In-process session and checkpoint stores.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use unistate_core::api::{
    CheckpointManager, SessionFilter, SessionManager, SessionMutator, SessionState, WorkflowState,
};

/// Map-backed [`SessionManager`].
///
/// `update_session` on an unknown id starts from a fresh session, so it
/// doubles as an upsert.
#[derive(Default)]
pub struct InMemorySessionManager {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: SessionState) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }
}

#[async_trait]
impl SessionManager for InMemorySessionManager {
    async fn get_session(&self, session_id: &str) -> anyhow::Result<Option<SessionState>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn update_session(&self, session_id: &str, mutator: SessionMutator) -> anyhow::Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(session_id));
        mutator(session);
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> anyhow::Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> anyhow::Result<Vec<SessionState>> {
        let mut sessions: Vec<SessionState> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(sessions)
    }
}

/// Keeps every checkpoint in memory, oldest first.
#[derive(Default)]
pub struct InMemoryCheckpointManager {
    checkpoints: Mutex<HashMap<String, Vec<WorkflowState>>>,
}

impl InMemoryCheckpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn checkpoints(&self, workflow_id: &str) -> Vec<WorkflowState> {
        self.checkpoints
            .lock()
            .await
            .get(workflow_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn latest(&self, workflow_id: &str) -> Option<WorkflowState> {
        self.checkpoints
            .lock()
            .await
            .get(workflow_id)
            .and_then(|c| c.last().cloned())
    }
}

#[async_trait]
impl CheckpointManager for InMemoryCheckpointManager {
    async fn save_checkpoint(&self, workflow_id: &str, state: &WorkflowState) -> anyhow::Result<()> {
        self.checkpoints
            .lock()
            .await
            .entry(workflow_id.to_string())
            .or_default()
            .push(state.clone());
        Ok(())
    }
}
