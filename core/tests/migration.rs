mod common;

use std::sync::Arc;

use common::in_memory_manager;
use pretty_assertions::assert_eq;
use serde_json::json;
use unistate_core::api::{StateError, StateEventType, StateType, StateValue, VersionedMigrator};

fn set_field(key: &'static str, val: serde_json::Value) -> impl Fn(StateValue) -> anyhow::Result<StateValue> + Send + Sync {
    move |value| {
        let mut body = value.to_json();
        body[key] = val.clone();
        Ok(StateValue::Global(body))
    }
}

#[tokio::test]
async fn multi_hop_migration_resolves() {
    let manager = in_memory_manager();
    let migrator = VersionedMigrator::new()
        .register("1", "2", set_field("v2", json!(true)))
        .register("2", "3", set_field("v3", json!(true)))
        .register("3", "4", set_field("version", json!("4")));
    manager
        .register_migrator(StateType::Global, Arc::new(migrator))
        .await;

    manager
        .set_state(StateType::Global, "cfg", StateValue::Global(json!({"version": "1"})))
        .await
        .unwrap();
    manager
        .migrate_state(StateType::Global, "cfg", "1", "4")
        .await
        .unwrap();

    assert_eq!(
        manager.get_state(StateType::Global, "cfg").await.unwrap(),
        StateValue::Global(json!({"version": "4", "v2": true, "v3": true}))
    );

    let last = manager.get_state_history(StateType::Global, "cfg", 1).await;
    assert_eq!(last[0].event_type, StateEventType::Migrated);
    assert_eq!(last[0].metadata["from"], json!("1"));
    assert_eq!(last[0].metadata["to"], json!("4"));
}

#[tokio::test]
async fn unknown_version_pair_leaves_value_untouched() {
    let manager = in_memory_manager();
    manager
        .register_migrator(
            StateType::Global,
            Arc::new(VersionedMigrator::new().register("1", "2", set_field("v2", json!(true)))),
        )
        .await;

    let original = StateValue::Global(json!({"version": "1"}));
    manager
        .set_state(StateType::Global, "cfg", original.clone())
        .await
        .unwrap();

    let err = manager
        .migrate_state(StateType::Global, "cfg", "1", "9")
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::NoMigrationPath { .. }));
    assert_eq!(manager.get_state(StateType::Global, "cfg").await.unwrap(), original);
    assert_eq!(manager.get_state_history(StateType::Global, "cfg", 0).await.len(), 1);
}

#[tokio::test]
async fn migrating_missing_state_reports_not_found() {
    let manager = in_memory_manager();
    manager
        .register_migrator(StateType::Global, Arc::new(VersionedMigrator::new()))
        .await;
    let err = manager
        .migrate_state(StateType::Global, "nope", "1", "2")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
