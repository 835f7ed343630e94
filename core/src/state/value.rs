//! Typed state payloads, one variant per [`StateType`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::session::SessionState;
use super::types::StateType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Session(SessionState),
    Workflow(WorkflowState),
    Conversation(ConversationState),
    Tool(Value),
    Global(Value),
}

impl StateValue {
    pub fn kind(&self) -> StateType {
        match self {
            Self::Session(_) => StateType::Session,
            Self::Workflow(_) => StateType::Workflow,
            Self::Conversation(_) => StateType::Conversation,
            Self::Tool(_) => StateType::Tool,
            Self::Global(_) => StateType::Global,
        }
    }

    /// Payload as plain JSON, without the type tag.
    pub fn to_json(&self) -> Value {
        let encoded = match self {
            Self::Session(s) => serde_json::to_value(s),
            Self::Workflow(w) => serde_json::to_value(w),
            Self::Conversation(c) => serde_json::to_value(c),
            Self::Tool(v) | Self::Global(v) => Ok(v.clone()),
        };
        encoded.unwrap_or(Value::Null)
    }

    /// Decode plain JSON into the payload variant for `state_type`.
    pub fn from_json(state_type: StateType, value: Value) -> serde_json::Result<Self> {
        Ok(match state_type {
            StateType::Session => Self::Session(serde_json::from_value(value)?),
            StateType::Workflow => Self::Workflow(serde_json::from_value(value)?),
            StateType::Conversation => Self::Conversation(serde_json::from_value(value)?),
            StateType::Tool => Self::Tool(value),
            StateType::Global => Self::Global(value),
        })
    }

    pub fn as_session(&self) -> Option<&SessionState> {
        match self {
            Self::Session(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_workflow(&self) -> Option<&WorkflowState> {
        match self {
            Self::Workflow(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_conversation(&self) -> Option<&ConversationState> {
        match self {
            Self::Conversation(c) => Some(c),
            _ => None,
        }
    }

    /// JSON body of a `Tool` or `Global` payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Tool(v) | Self::Global(v) => Some(v),
            _ => None,
        }
    }
}

/// 工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: String,
    pub session_id: String,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub current_stage: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    /// Percent complete, 0-100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub variables: Map<String, Value>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(
        workflow_id: impl Into<String>,
        session_id: impl Into<String>,
        current_stage: impl Into<String>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            session_id: session_id.into(),
            workflow_name: String::new(),
            current_stage: current_stage.into(),
            status: WorkflowStatus::Pending,
            progress: 0.0,
            variables: Map::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.status = status;
        self
    }
}

/// Conversation stages accepted by the conversation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Planning,
    Building,
    Deploying,
    Monitoring,
    Optimizing,
}

impl ConversationStage {
    pub fn parse(stage: &str) -> Option<Self> {
        match stage {
            "planning" => Some(Self::Planning),
            "building" => Some(Self::Building),
            "deploying" => Some(Self::Deploying),
            "monitoring" => Some(Self::Monitoring),
            "optimizing" => Some(Self::Optimizing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub conversation_id: String,
    /// Raw stage name; checked against [`ConversationStage`] by validators.
    #[serde(default)]
    pub current_stage: String,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default)]
    pub variables: Map<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            conversation_id: conversation_id.into(),
            current_stage: String::new(),
            messages: Vec::new(),
            variables: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.current_stage = stage.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_serialization() {
        let value = StateValue::Tool(json!({"x": 1}));
        let encoded = serde_json::to_value(&value).unwrap();
        assert_eq!(encoded, json!({"type": "tool", "value": {"x": 1}}));
        let decoded: StateValue = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_from_json_dispatches_on_type() {
        let raw = json!({"workflow_id": "w1", "session_id": "s1", "progress": 42.0});
        let value = StateValue::from_json(StateType::Workflow, raw).unwrap();
        assert_eq!(value.kind(), StateType::Workflow);
        assert_eq!(value.as_workflow().unwrap().progress, 42.0);

        assert!(StateValue::from_json(StateType::Session, json!({"nope": true})).is_err());
    }

    #[test]
    fn test_conversation_stage_parse() {
        assert_eq!(ConversationStage::parse("deploying"), Some(ConversationStage::Deploying));
        assert_eq!(ConversationStage::parse("shipping"), None);
    }
}
