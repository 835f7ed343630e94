use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use unistate_core::api::{
    StateConfig, StateError, StateSyncCoordinator, StateType, StateValue, SyncOptions,
    SyncSessionSnapshot, SyncStrategy, UnifiedStateManager,
};
use unistate_plugins::factory::{build_manager, build_mapping, Collaborators};

use super::cli::SimulateArgs;
use crate::error::CliError;

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub states: Vec<SeedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SeedEntry {
    pub state_type: StateType,
    pub id: String,
    pub value: StateValue,
}

pub fn load_seed(path: &Path) -> Result<SeedFile, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CliError::Seed(format!("{}: {e}", path.display())))
}

fn parse_type(raw: &str) -> Result<StateType, CliError> {
    raw.parse()
        .map_err(|e: String| CliError::Anyhow(anyhow::Error::msg(e)))
}

pub async fn run_simulate(
    args: SimulateArgs,
    cfg: &StateConfig,
    cancel: &CancellationToken,
    out: &mut impl Write,
) -> Result<i32, CliError> {
    let source = parse_type(&args.from)?;
    let target = parse_type(&args.to)?;
    let strategy: SyncStrategy = args
        .strategy
        .as_deref()
        .unwrap_or(&cfg.sync.strategy)
        .parse()
        .map_err(CliError::Config)?;
    let mapping = build_mapping(args.mapping.as_str())?;
    let seed = load_seed(&args.seed)?;

    let manager = build_manager(cfg, Collaborators::default());
    for entry in seed.states {
        manager
            .set_state(entry.state_type, &entry.id, entry.value)
            .await?;
    }
    tracing::info!(
        source = %source,
        target = %target,
        mapping = args.mapping.as_str(),
        "seed loaded"
    );

    let coordinator = StateSyncCoordinator::new();
    let outcome = if args.rounds <= 1 {
        coordinator
            .sync_states_with(&manager, source, target, mapping, strategy)
            .await
            .map(|report| {
                tracing::info!(
                    synced = report.synced,
                    skipped = report.skipped,
                    "sync pass complete"
                );
            })
    } else {
        let interval = Duration::from_millis(args.interval_ms.unwrap_or(cfg.sync.interval_ms));
        let options = SyncOptions { interval, strategy };
        let session_id = coordinator
            .start_continuous_sync(&manager, source, target, mapping, options, Some(cancel))
            .await?;

        let mut poll = tokio::time::interval(
            interval.clamp(Duration::from_millis(1), Duration::from_millis(100)),
        );
        let snapshot = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break None,
                _ = poll.tick() => {}
            }
            match coordinator.get_sync_session(&session_id).await {
                Ok(s) if s.sync_count >= args.rounds => break Some(s),
                Ok(_) => {}
                // The loop already exited and deregistered itself.
                Err(StateError::SyncSessionNotFound(_)) => break None,
                Err(e) => return Err(e.into()),
            }
        };
        match coordinator.stop_continuous_sync(&session_id).await {
            Ok(()) | Err(StateError::SyncSessionNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        match snapshot {
            Some(s) => {
                let total = manager.list_states(source).await?.len();
                partial_failure(&s, total).map_or(Ok(()), Err)
            }
            None => Ok(()),
        }
    };

    write_domain(&manager, target, out).await?;
    if args.events {
        write_events(&manager, target, out).await?;
    }
    manager.shutdown();

    outcome?;
    Ok(0)
}

/// Errors accumulate across rounds, so an id that failed in several rounds
/// counts once against the size of the source domain.
fn partial_failure(snapshot: &SyncSessionSnapshot, total: usize) -> Option<StateError> {
    let failed: BTreeSet<&str> = snapshot.errors.iter().map(|e| e.state_id.as_str()).collect();
    if failed.is_empty() {
        return None;
    }
    Some(StateError::SyncPartialFailure {
        session_id: snapshot.id.clone(),
        failed: failed.len(),
        total: total.max(failed.len()),
    })
}

async fn write_domain(
    manager: &UnifiedStateManager,
    state_type: StateType,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut states = BTreeMap::new();
    for id in manager.list_states(state_type).await? {
        let value = manager.get_state(state_type, &id).await?;
        states.insert(id, value);
    }
    let doc = serde_json::json!({
        "state_type": state_type,
        "states": states,
    });
    let text = serde_json::to_string_pretty(&doc).map_err(anyhow::Error::from)?;
    writeln!(out, "{text}")?;
    Ok(())
}

async fn write_events(
    manager: &UnifiedStateManager,
    state_type: StateType,
    out: &mut impl Write,
) -> Result<(), CliError> {
    for event in manager.event_store().get_events_by_type(state_type, 0).await {
        let line = serde_json::to_string(event.as_ref()).map_err(anyhow::Error::from)?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::MappingKind;
    use std::io::Write as _;

    fn seed_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn args(seed: &Path, mapping: MappingKind, rounds: u64) -> SimulateArgs {
        SimulateArgs {
            seed: seed.to_path_buf(),
            from: "tool".into(),
            to: "global".into(),
            mapping,
            strategy: None,
            rounds,
            interval_ms: Some(10),
            events: true,
        }
    }

    const TOOL_SEED: &str = r#"{"states": [
        {"state_type": "tool", "id": "a", "value": {"type": "tool", "value": {"n": 1}}},
        {"state_type": "tool", "id": "b", "value": {"type": "tool", "value": {"n": 2}}}
    ]}"#;

    #[tokio::test]
    async fn test_single_pass_prints_target_domain() {
        let seed = seed_file(TOOL_SEED);
        let mut out = Vec::new();
        let code = run_simulate(
            args(seed.path(), MappingKind::ToolToGlobal, 1),
            &StateConfig::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(code, 0);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"state_type\": \"global\""));
        assert!(text.contains("\"synced\""));
        let synced_lines = text.lines().filter(|l| l.contains("\"synced\"")).count();
        assert_eq!(synced_lines, 2);
    }

    #[tokio::test]
    async fn test_identity_into_global_is_partial_failure() {
        let seed = seed_file(TOOL_SEED);
        let mut out = Vec::new();
        let err = run_simulate(
            args(seed.path(), MappingKind::Identity, 1),
            &StateConfig::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 30);
    }

    #[tokio::test]
    async fn test_continuous_rounds() {
        let seed = seed_file(TOOL_SEED);
        let mut out = Vec::new();
        let code = run_simulate(
            args(seed.path(), MappingKind::ToolToGlobal, 3),
            &StateConfig::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        let synced_lines = text.lines().filter(|l| l.contains("\"synced\"")).count();
        assert!(synced_lines >= 6);
    }

    #[tokio::test]
    async fn test_continuous_failures_count_each_id_once() {
        let seed = seed_file(TOOL_SEED);
        let mut out = Vec::new();
        let err = run_simulate(
            args(seed.path(), MappingKind::Identity, 3),
            &StateConfig::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 30);
        match err {
            CliError::State(StateError::SyncPartialFailure { failed, total, .. }) => {
                assert_eq!((failed, total), (2, 2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_seed_is_io_class_error() {
        let seed = seed_file("{\"states\": [");
        let mut out = Vec::new();
        let err = run_simulate(
            args(seed.path(), MappingKind::Identity, 1),
            &StateConfig::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Seed(_)));
        assert_eq!(err.exit_code(), 20);
    }
}
