use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::state::types::StateType;

const MAX_ERROR_RECORDS: usize = 100;

/// 同步策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Resync every id on every pass.
    #[default]
    Full,
    /// Skip ids whose source value is unchanged since the last pass.
    Incremental,
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        })
    }
}

impl FromStr for SyncStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            other => Err(format!("unknown sync strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub interval: Duration,
    pub strategy: SyncStrategy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            strategy: SyncStrategy::Full,
        }
    }
}

impl SyncOptions {
    pub fn from_config(cfg: &SyncConfig) -> anyhow::Result<Self> {
        Ok(Self {
            interval: Duration::from_millis(cfg.interval_ms),
            strategy: cfg.strategy.parse().map_err(anyhow::Error::msg)?,
        })
    }
}

/// Deterministic id for the ordered pair `source -> target`.
pub fn sync_session_id(source: StateType, target: StateType) -> String {
    format!("sync_{}_{}", source, target)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncErrorRecord {
    pub state_id: String,
    pub code: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct SyncProgress {
    pub(crate) last_sync: Option<DateTime<Utc>>,
    pub(crate) sync_count: u64,
    pub(crate) errors: Vec<SyncErrorRecord>,
    /// Fingerprint of the last source value synced, per id.
    pub(crate) cursors: HashMap<String, u64>,
}

impl SyncProgress {
    pub(crate) fn record_error(&mut self, record: SyncErrorRecord) {
        if self.errors.len() >= MAX_ERROR_RECORDS {
            self.errors.remove(0);
        }
        self.errors.push(record);
    }
}

/// A registered source -> target synchronization.
#[derive(Debug)]
pub struct SyncSession {
    pub id: String,
    pub source_type: StateType,
    pub target_type: StateType,
    pub strategy: SyncStrategy,
    pub start_time: DateTime<Utc>,
    pub continuous: bool,
    active: AtomicBool,
    pub(crate) progress: Mutex<SyncProgress>,
    pub(crate) cancel: CancellationToken,
}

impl SyncSession {
    pub(crate) fn new(
        source_type: StateType,
        target_type: StateType,
        strategy: SyncStrategy,
        continuous: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: sync_session_id(source_type, target_type),
            source_type,
            target_type,
            strategy,
            start_time: Utc::now(),
            continuous,
            active: AtomicBool::new(true),
            progress: Mutex::new(SyncProgress::default()),
            cancel,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Marks inactive and cancels the session token.
    pub(crate) fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    pub async fn snapshot(&self) -> SyncSessionSnapshot {
        let progress = self.progress.lock().await;
        SyncSessionSnapshot {
            id: self.id.clone(),
            source_type: self.source_type,
            target_type: self.target_type,
            strategy: self.strategy,
            start_time: self.start_time,
            continuous: self.continuous,
            active: self.is_active(),
            last_sync: progress.last_sync,
            sync_count: progress.sync_count,
            error_count: progress.errors.len(),
            errors: progress.errors.clone(),
        }
    }
}

/// Point-in-time copy of a [`SyncSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSessionSnapshot {
    pub id: String,
    pub source_type: StateType,
    pub target_type: StateType,
    pub strategy: SyncStrategy,
    pub start_time: DateTime<Utc>,
    pub continuous: bool,
    pub active: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_count: u64,
    pub error_count: usize,
    pub errors: Vec<SyncErrorRecord>,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub session_id: String,
    pub total: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
}
