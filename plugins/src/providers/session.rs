use std::sync::Arc;

use async_trait::async_trait;
use unistate_core::api::{
    SessionFilter, SessionManager, StateError, StateProvider, StateResult, StateType, StateValue,
};

/// Session domain backed by an external [`SessionManager`].
pub struct SessionStateProvider {
    sessions: Arc<dyn SessionManager>,
}

impl SessionStateProvider {
    pub fn new(sessions: Arc<dyn SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl StateProvider for SessionStateProvider {
    fn state_type(&self) -> StateType {
        StateType::Session
    }

    async fn get_state(&self, id: &str) -> StateResult<StateValue> {
        self.sessions
            .get_session(id)
            .await?
            .map(StateValue::Session)
            .ok_or_else(|| StateError::not_found(StateType::Session, id))
    }

    async fn set_state(&self, id: &str, value: StateValue) -> StateResult<()> {
        let StateValue::Session(session) = value else {
            return Err(StateError::UnexpectedPayload {
                expected: StateType::Session,
                actual: value.kind(),
            });
        };
        self.sessions
            .update_session(id, Box::new(move |current| *current = session))
            .await?;
        Ok(())
    }

    async fn delete_state(&self, id: &str) -> StateResult<()> {
        self.sessions.delete_session(id).await?;
        Ok(())
    }

    async fn list_states(&self) -> StateResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .sessions
            .list_sessions(&SessionFilter::all())
            .await?
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
