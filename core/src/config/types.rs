use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub event_store: EventStoreConfig,

    #[serde(default)]
    pub observers: ObserverConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl StateConfig {
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "unistate_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStoreConfig {
    #[serde(default = "default_max_events_per_key")]
    pub max_events_per_key: usize,

    /// Events older than this are purged by the cleanup task.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_max_events_per_key() -> usize {
    1000
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    60 * 60
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            max_events_per_key: default_max_events_per_key(),
            retention_secs: default_retention_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound on deliveries running at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Drop notifications instead of waiting when the queue is full.
    #[serde(default = "default_drop_when_full")]
    pub drop_when_full: bool,

    /// Register a tracing observer that logs every event.
    #[serde(default)]
    pub log_events: bool,
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_concurrency() -> usize {
    16
}

fn default_drop_when_full() -> bool {
    true
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_concurrency: default_max_concurrency(),
            drop_when_full: default_drop_when_full(),
            log_events: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_interval_ms")]
    pub interval_ms: u64,

    /// "full" or "incremental".
    #[serde(default = "default_sync_strategy")]
    pub strategy: String,
}

fn default_sync_interval_ms() -> u64 {
    30_000
}

fn default_sync_strategy() -> String {
    "full".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sync_interval_ms(),
            strategy: default_sync_strategy(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Global session disk limit in bytes; 0 disables the check.
    #[serde(default)]
    pub max_disk_usage_bytes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub peers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: StateConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, StateConfig::default());
        assert_eq!(cfg.event_store.max_events_per_key, 1000);
        assert_eq!(cfg.event_store.retention_secs, 86_400);
        assert_eq!(cfg.observers.queue_capacity, 1024);
        assert_eq!(cfg.sync.strategy, "full");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg: StateConfig = toml::from_str(
            r#"
            [event_store]
            max_events_per_key = 5

            [observers]
            log_events = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.event_store.max_events_per_key, 5);
        assert_eq!(cfg.event_store.cleanup_interval_secs, 3600);
        assert!(cfg.observers.log_events);
        assert!(cfg.observers.drop_when_full);
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut cfg = StateConfig::default();
        cfg.replication.peers.push("node-b".into());
        let rendered = cfg.to_toml().unwrap();
        let parsed: StateConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, cfg);
    }
}
