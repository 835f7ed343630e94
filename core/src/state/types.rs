//! State domain and event type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::value::StateValue;
use crate::util::event_id_at;

/// 状态域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Session,
    Workflow,
    Conversation,
    Tool,
    Global,
}

impl StateType {
    pub const ALL: [StateType; 5] = [
        StateType::Session,
        StateType::Workflow,
        StateType::Conversation,
        StateType::Tool,
        StateType::Global,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Workflow => "workflow",
            Self::Conversation => "conversation",
            Self::Tool => "tool",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "workflow" => Ok(Self::Workflow),
            "conversation" => Ok(Self::Conversation),
            "tool" => Ok(Self::Tool),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown state type: {other}")),
        }
    }
}

/// 状态事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateEventType {
    Created,
    Updated,
    Deleted,
    Migrated,
    Synced,
    Validated,
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Immutable record of a single state mutation.
///
/// `sequence` is process-wide and monotonic; it orders events whose
/// timestamps collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEvent {
    pub id: String,
    pub sequence: u64,
    pub event_type: StateEventType,
    pub state_type: StateType,
    pub state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<StateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<StateValue>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl StateEvent {
    pub fn new(event_type: StateEventType, state_type: StateType, state_id: impl Into<String>) -> Self {
        let timestamp = Utc::now();
        Self {
            id: event_id_at(timestamp),
            sequence: EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            event_type,
            state_type,
            state_id: state_id.into(),
            old_value: None,
            new_value: None,
            metadata: serde_json::Map::new(),
            timestamp,
        }
    }

    pub fn with_old_value(mut self, value: Option<StateValue>) -> Self {
        self.old_value = value;
        self
    }

    pub fn with_new_value(mut self, value: Option<StateValue>) -> Self {
        self.new_value = value;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Event store bucket key: `{type}:{id}`.
    pub fn bucket_key(&self) -> String {
        bucket_key(self.state_type, &self.state_id)
    }
}

pub(crate) fn bucket_key(state_type: StateType, state_id: &str) -> String {
    format!("{}:{}", state_type, state_id)
}
