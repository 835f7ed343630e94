//! 会话状态载荷

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current schema version of [`SessionState`].
pub const SESSION_SCHEMA_VERSION: &str = "3";

/// Session payload as owned by the external session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    #[serde(default = "default_session_version")]
    pub version: String,
    #[serde(default)]
    pub workspace_dir: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_accessed: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// 已用磁盘（字节）
    #[serde(default)]
    pub disk_usage: i64,
    /// 磁盘上限（字节），0 表示使用全局配置
    #[serde(default)]
    pub max_disk_usage: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_session_version() -> String {
    SESSION_SCHEMA_VERSION.to_string()
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            version: default_session_version(),
            workspace_dir: String::new(),
            created_at: now,
            last_accessed: now,
            expires_at: None,
            disk_usage: 0,
            max_disk_usage: 0,
            labels: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// 更新访问时间
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }

    /// An out-of-range `ttl` leaves the session without an expiry.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = self.created_at.checked_add_signed(ttl);
        self
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
        self.touch();
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| t <= Utc::now()).unwrap_or(false)
    }

    /// A zero (epoch) creation time means the field was never set.
    pub fn has_creation_time(&self) -> bool {
        self.created_at.timestamp() != 0 || self.created_at.timestamp_subsec_nanos() != 0
    }
}
