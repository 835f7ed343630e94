mod common;

use std::sync::Arc;
use std::time::Duration;

use common::in_memory_manager;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use unistate_core::api::{
    IdentityMapping, StateError, StateEventType, StateSyncCoordinator, StateType, StateValue,
    SyncOptions, SyncStrategy, UnifiedStateManager,
};

async fn seed_tools(manager: &UnifiedStateManager, n: usize) {
    for i in 0..n {
        manager
            .set_state(StateType::Tool, &format!("tool-{i}"), StateValue::Tool(json!({"i": i})))
            .await
            .unwrap();
    }
}

async fn synced_event_count(manager: &UnifiedStateManager, ty: StateType) -> usize {
    manager
        .event_store()
        .get_events_by_type(ty, 0)
        .await
        .iter()
        .filter(|e| e.event_type == StateEventType::Synced)
        .count()
}

async fn domain(manager: &UnifiedStateManager, ty: StateType) -> Vec<(String, StateValue)> {
    let mut out = Vec::new();
    for id in manager.list_states(ty).await.unwrap() {
        let value = manager.get_state(ty, &id).await.unwrap();
        out.push((id, value));
    }
    out
}

#[tokio::test]
async fn identity_sync_copies_every_entry() {
    let manager = in_memory_manager();
    seed_tools(&manager, 3).await;

    let coordinator = StateSyncCoordinator::new();
    let report = coordinator
        .sync_states(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping))
        .await
        .unwrap();

    assert_eq!((report.total, report.synced, report.failed), (3, 3, 0));
    assert_eq!(manager.list_states(StateType::Global).await.unwrap().len(), 3);
    assert_eq!(synced_event_count(&manager, StateType::Global).await, 3);

    let synced = manager.event_store().get_events_by_type(StateType::Global, 0).await;
    let event = synced
        .iter()
        .find(|e| e.event_type == StateEventType::Synced)
        .unwrap();
    assert_eq!(event.metadata["sync_session"], json!("sync_tool_global"));
    assert_eq!(event.metadata["source_type"], json!("tool"));
    assert_eq!(event.metadata["source_id"], json!(event.state_id));
}

#[tokio::test]
async fn repeated_sync_is_idempotent() {
    let manager = in_memory_manager();
    seed_tools(&manager, 4).await;
    let coordinator = StateSyncCoordinator::new();

    coordinator
        .sync_states(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping))
        .await
        .unwrap();
    let first = domain(&manager, StateType::Global).await;

    coordinator
        .sync_states(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping))
        .await
        .unwrap();
    assert_eq!(domain(&manager, StateType::Global).await, first);
}

#[tokio::test]
async fn per_id_failures_are_aggregated() {
    use unistate_core::api::FnMapping;

    let manager = in_memory_manager();
    seed_tools(&manager, 3).await;

    let picky = FnMapping::new(|value| {
        if value.as_json().and_then(|v| v.get("i")) == Some(&json!(1)) {
            return Err(StateError::MappingFailed("odd one out".into()));
        }
        Ok(value)
    });

    let err = StateSyncCoordinator::new()
        .sync_states(&manager, StateType::Tool, StateType::Global, Arc::new(picky))
        .await
        .unwrap_err();
    match err {
        StateError::SyncPartialFailure { session_id, failed, total } => {
            assert_eq!(session_id, "sync_tool_global");
            assert_eq!((failed, total), (1, 3));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The other two were applied anyway.
    assert_eq!(
        manager.list_states(StateType::Global).await.unwrap(),
        vec!["tool-0", "tool-2"]
    );
}

#[tokio::test]
async fn duplicate_continuous_sync_is_rejected_and_stop_halts_passes() {
    let manager = in_memory_manager();
    seed_tools(&manager, 2).await;
    let coordinator = StateSyncCoordinator::new();
    let options = SyncOptions {
        interval: Duration::from_millis(20),
        strategy: SyncStrategy::Full,
    };

    let id = coordinator
        .start_continuous_sync(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping), options, None)
        .await
        .unwrap();
    let err = coordinator
        .start_continuous_sync(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping), options, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::DuplicateActiveSync(ref dup) if *dup == id));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let running = coordinator.get_sync_session(&id).await.unwrap();
    assert!(running.active);
    assert!(running.sync_count >= 2);

    coordinator.stop_continuous_sync(&id).await.unwrap();
    // Let an in-flight pass finish before sampling.
    tokio::time::sleep(Duration::from_millis(40)).await;
    let after_stop = synced_event_count(&manager, StateType::Global).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(synced_event_count(&manager, StateType::Global).await, after_stop);
    assert!(coordinator.get_active_syncs().await.is_empty());

    // The pair is free again.
    let again = coordinator
        .start_continuous_sync(&manager, StateType::Tool, StateType::Global, Arc::new(IdentityMapping), options, None)
        .await
        .unwrap();
    coordinator.stop_continuous_sync(&again).await.unwrap();
}

#[tokio::test]
async fn parent_token_cancels_continuous_sync() {
    let manager = in_memory_manager();
    seed_tools(&manager, 1).await;
    let coordinator = StateSyncCoordinator::new();
    let parent = CancellationToken::new();

    let id = coordinator
        .start_continuous_sync(
            &manager,
            StateType::Tool,
            StateType::Global,
            Arc::new(IdentityMapping),
            SyncOptions {
                interval: Duration::from_millis(10),
                strategy: SyncStrategy::Incremental,
            },
            Some(&parent),
        )
        .await
        .unwrap();

    parent.cancel();
    let gone = tokio::time::timeout(Duration::from_secs(2), async {
        while coordinator.get_sync_session(&id).await.is_ok() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(gone.is_ok(), "session should deregister after parent cancel");
    assert!(matches!(
        coordinator.stop_continuous_sync(&id).await,
        Err(StateError::SyncSessionNotFound(_))
    ));
}

#[tokio::test]
async fn sync_pass_can_be_bounded_by_caller() {
    let manager = in_memory_manager();
    seed_tools(&manager, 5).await;
    let coordinator = StateSyncCoordinator::new();

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator.sync_states(&manager, StateType::Tool, StateType::Conversation, Arc::new(IdentityMapping)),
    )
    .await
    .expect("pass should finish well within the timeout")
    .unwrap();
    assert_eq!(report.synced, 5);
}
