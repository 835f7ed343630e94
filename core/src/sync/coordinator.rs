//! 跨状态域同步协调器

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::session::{sync_session_id, SyncErrorRecord, SyncOptions, SyncReport, SyncSession, SyncSessionSnapshot, SyncStrategy};
use crate::error::{StateError, StateResult};
use crate::state::manager::UnifiedStateManager;
use crate::state::traits::StateMapping;
use crate::state::types::{StateEvent, StateEventType, StateType};
use crate::util::fingerprint;

enum Outcome {
    Synced,
    Skipped,
}

/// Copies state from one domain into another through a [`StateMapping`].
///
/// The registry lock only guards session lookup and registration; passes run
/// outside it, serialized per session by the session's own mutex.
#[derive(Clone, Default)]
pub struct StateSyncCoordinator {
    sessions: Arc<RwLock<HashMap<String, Arc<SyncSession>>>>,
}

impl StateSyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One full reconciliation pass from `source` to `target`.
    pub async fn sync_states(
        &self,
        manager: &UnifiedStateManager,
        source: StateType,
        target: StateType,
        mapping: Arc<dyn StateMapping>,
    ) -> StateResult<SyncReport> {
        self.sync_states_with(manager, source, target, mapping, SyncStrategy::Full)
            .await
    }

    pub async fn sync_states_with(
        &self,
        manager: &UnifiedStateManager,
        source: StateType,
        target: StateType,
        mapping: Arc<dyn StateMapping>,
        strategy: SyncStrategy,
    ) -> StateResult<SyncReport> {
        let session = {
            let mut sessions = self.sessions.write().await;
            let id = sync_session_id(source, target);
            sessions
                .entry(id)
                .or_insert_with(|| {
                    Arc::new(SyncSession::new(
                        source,
                        target,
                        strategy,
                        false,
                        CancellationToken::new(),
                    ))
                })
                .clone()
        };

        let result = run_pass(manager, &session, mapping.as_ref(), strategy).await;

        if !session.continuous {
            session.stop();
            self.remove_if_current(&session).await;
        }
        result
    }

    /// Spawns a task that runs one pass per `options.interval`.
    ///
    /// The first pass starts immediately. The task stops when `parent` is
    /// cancelled or [`stop_continuous_sync`](Self::stop_continuous_sync) is
    /// called; an in-flight pass is allowed to finish.
    pub async fn start_continuous_sync(
        &self,
        manager: &UnifiedStateManager,
        source: StateType,
        target: StateType,
        mapping: Arc<dyn StateMapping>,
        options: SyncOptions,
        parent: Option<&CancellationToken>,
    ) -> StateResult<String> {
        let token = parent.map(CancellationToken::child_token).unwrap_or_default();
        let session = Arc::new(SyncSession::new(
            source,
            target,
            options.strategy,
            true,
            token.clone(),
        ));
        let id = session.id.clone();

        {
            let mut sessions = self.sessions.write().await;
            if let Some(existing) = sessions.get(&id) {
                if existing.continuous && existing.is_active() {
                    return Err(StateError::DuplicateActiveSync(id));
                }
            }
            sessions.insert(id.clone(), session.clone());
        }

        tracing::info!(
            session_id = %id,
            interval_ms = options.interval.as_millis() as u64,
            strategy = %options.strategy,
            "continuous sync started"
        );

        let coordinator = self.clone();
        let manager = manager.clone();
        tokio::spawn(async move {
            let period = options.interval.max(Duration::from_millis(1));
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if !session.is_active() {
                    break;
                }
                match run_pass(&manager, &session, mapping.as_ref(), options.strategy).await {
                    Ok(report) => tracing::debug!(
                        session_id = %session.id,
                        synced = report.synced,
                        skipped = report.skipped,
                        "sync pass complete"
                    ),
                    Err(e) => tracing::error!(session_id = %session.id, error = %e, "sync pass failed"),
                }
            }

            session.stop();
            coordinator.remove_if_current(&session).await;
            tracing::info!(session_id = %session.id, "continuous sync stopped");
        });

        Ok(id)
    }

    pub async fn stop_continuous_sync(&self, session_id: &str) -> StateResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| StateError::SyncSessionNotFound(session_id.to_string()))?;
        session.stop();
        tracing::info!(session_id, "continuous sync stop requested");
        Ok(())
    }

    pub async fn get_active_syncs(&self) -> Vec<SyncSessionSnapshot> {
        let sessions: Vec<Arc<SyncSession>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect();

        let mut snapshots = Vec::with_capacity(sessions.len());
        for session in sessions {
            snapshots.push(session.snapshot().await);
        }
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    pub async fn get_sync_session(&self, session_id: &str) -> StateResult<SyncSessionSnapshot> {
        let session = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StateError::SyncSessionNotFound(session_id.to_string()))?;
        Ok(session.snapshot().await)
    }

    async fn remove_if_current(&self, session: &Arc<SyncSession>) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&session.id)
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            sessions.remove(&session.id);
        }
    }
}

/// Syncs every source id once, continuing past per-id failures.
async fn run_pass(
    manager: &UnifiedStateManager,
    session: &SyncSession,
    mapping: &dyn StateMapping,
    strategy: SyncStrategy,
) -> StateResult<SyncReport> {
    let ids = manager.list_states(session.source_type).await?;
    let mut report = SyncReport {
        session_id: session.id.clone(),
        total: ids.len(),
        ..SyncReport::default()
    };

    for id in &ids {
        match sync_one(manager, session, mapping, strategy, id).await {
            Ok(Outcome::Synced) => report.synced += 1,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(session_id = %session.id, state_id = %id, error = %e, "state sync failed");
                session.progress.lock().await.record_error(SyncErrorRecord {
                    state_id: id.clone(),
                    code: e.code().to_string(),
                    message: e.to_string(),
                    at: Utc::now(),
                });
            }
        }
    }

    {
        let mut progress = session.progress.lock().await;
        progress.last_sync = Some(Utc::now());
        progress.sync_count += 1;
    }

    if report.failed > 0 {
        return Err(StateError::SyncPartialFailure {
            session_id: report.session_id,
            failed: report.failed,
            total: report.total,
        });
    }
    Ok(report)
}

async fn sync_one(
    manager: &UnifiedStateManager,
    session: &SyncSession,
    mapping: &dyn StateMapping,
    strategy: SyncStrategy,
    id: &str,
) -> StateResult<Outcome> {
    let value = manager.get_state(session.source_type, id).await?;

    let fp = fingerprint(&serde_json::to_value(&value).map_err(anyhow::Error::from)?);
    if strategy == SyncStrategy::Incremental
        && session.progress.lock().await.cursors.get(id) == Some(&fp)
    {
        return Ok(Outcome::Skipped);
    }

    let mapped = mapping.map_state(value)?;
    manager
        .set_state(session.target_type, id, mapped.clone())
        .await?;

    let event = StateEvent::new(StateEventType::Synced, session.target_type, id)
        .with_new_value(Some(mapped))
        .with_metadata("sync_session", session.id.as_str())
        .with_metadata("source_type", session.source_type.as_str())
        .with_metadata("source_id", id);
    manager.publish_event(event).await;

    session
        .progress
        .lock()
        .await
        .cursors
        .insert(id.to_string(), fp);
    Ok(Outcome::Synced)
}
