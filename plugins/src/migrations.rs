//! Schema migrations shipped for built-in domains.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use unistate_core::api::{StateType, StateValue, VersionedMigrator};

/// Session payload steps `1 -> 2 -> 3`.
///
/// - `1 -> 2`: legacy `metadata.disk_quota` becomes `max_disk_usage`.
/// - `2 -> 3`: legacy `metadata.ttl_secs` becomes `expires_at`.
///
/// Steps accept a session payload or raw legacy JSON and always produce a
/// session payload.
pub fn session_schema_migrator() -> VersionedMigrator {
    VersionedMigrator::new()
        .register("1", "2", |value| {
            let mut body = session_body(value)?;
            if let Some(quota) = take_metadata(&mut body, "disk_quota").and_then(|v| v.as_i64()) {
                let current = body.get("max_disk_usage").and_then(Value::as_i64).unwrap_or(0);
                if current == 0 {
                    body.insert("max_disk_usage".into(), quota.into());
                }
            }
            finish(body, "2")
        })
        .register("2", "3", |value| {
            let mut body = session_body(value)?;
            if let Some(ttl) = take_metadata(&mut body, "ttl_secs").and_then(|v| v.as_i64()) {
                let created = body
                    .get("created_at")
                    .cloned()
                    .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v).ok())
                    .unwrap_or_else(Utc::now);
                let expires = Duration::try_seconds(ttl)
                    .and_then(|ttl| created.checked_add_signed(ttl))
                    .ok_or_else(|| anyhow::anyhow!("ttl_secs {ttl} is out of range"))?;
                body.insert("expires_at".into(), serde_json::to_value(expires)?);
            }
            finish(body, "3")
        })
}

fn session_body(value: StateValue) -> anyhow::Result<Map<String, Value>> {
    match value.to_json() {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("session payload must be an object, got {other}"),
    }
}

fn take_metadata(body: &mut Map<String, Value>, key: &str) -> Option<Value> {
    body.get_mut("metadata")
        .and_then(Value::as_object_mut)
        .and_then(|m| m.remove(key))
}

fn finish(mut body: Map<String, Value>, version: &str) -> anyhow::Result<StateValue> {
    body.insert("version".into(), Value::String(version.to_string()));
    Ok(StateValue::from_json(StateType::Session, Value::Object(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{build_manager, Collaborators};
    use serde_json::json;
    use unistate_core::api::{SessionState, StateConfig, StateError, StateMigrator};

    #[tokio::test]
    async fn test_legacy_session_upgrades_to_current() {
        let legacy = StateValue::Global(json!({
            "session_id": "s-1",
            "version": "1",
            "created_at": "2026-01-01T00:00:00Z",
            "metadata": {"disk_quota": 4096, "ttl_secs": 60, "owner": "ci"}
        }));

        let migrated = session_schema_migrator()
            .migrate_state("1", "3", legacy)
            .await
            .unwrap();
        let session = migrated.as_session().unwrap();

        assert_eq!(session.version, "3");
        assert_eq!(session.max_disk_usage, 4096);
        assert_eq!(
            session.expires_at.unwrap().to_rfc3339(),
            "2026-01-01T00:01:00+00:00"
        );
        assert_eq!(session.metadata.get("owner"), Some(&json!("ci")));
        assert!(session.metadata.get("disk_quota").is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_fails_the_hop() {
        for ttl in [i64::MAX, 9_000_000_000_000_000] {
            let legacy = StateValue::Global(json!({
                "session_id": "s-3",
                "version": "2",
                "created_at": "2026-01-01T00:00:00Z",
                "metadata": {"ttl_secs": ttl}
            }));
            let err = session_schema_migrator()
                .migrate_state("2", "3", legacy)
                .await
                .unwrap_err();
            match err {
                StateError::MigrationFailed { from, to, reason } => {
                    assert_eq!((from.as_str(), to.as_str()), ("2", "3"));
                    assert!(reason.contains("out of range"), "{reason}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_session_migration_keeps_stored_value() {
        let manager = build_manager(&StateConfig::default(), Collaborators::default());
        let mut session = SessionState::new("s-4");
        session.version = "2".into();
        session.set_metadata("ttl_secs", i64::MAX);
        manager
            .set_state(StateType::Session, "s-4", StateValue::Session(session.clone()))
            .await
            .unwrap();

        let err = manager
            .migrate_state(StateType::Session, "s-4", "2", "3")
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::MigrationFailed { .. }));

        let stored = manager.get_state(StateType::Session, "s-4").await.unwrap();
        assert_eq!(stored, StateValue::Session(session));
        manager.shutdown();
    }

    #[tokio::test]
    async fn test_explicit_limit_is_kept() {
        let mut session = SessionState::new("s-2");
        session.version = "1".into();
        session.max_disk_usage = 10;
        session.set_metadata("disk_quota", 99);

        let migrated = session_schema_migrator()
            .migrate_state("1", "2", StateValue::Session(session))
            .await
            .unwrap();
        let session = migrated.as_session().unwrap();
        assert_eq!(session.max_disk_usage, 10);
        assert_eq!(session.version, "2");
    }
}
