use std::path::{Path, PathBuf};

use super::types::StateConfig;

/// Default data directory: ~/.unistate
pub fn get_unistate_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".unistate"))
}

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<StateConfig> {
    let s = std::fs::read_to_string(path.as_ref())?;
    Ok(toml::from_str::<StateConfig>(&s)?)
}

pub fn load_default() -> anyhow::Result<StateConfig> {
    // Priority 1: ~/.unistate/config.toml (highest)
    let data_dir = get_unistate_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./unistate.toml (current directory)
    let local_config = Path::new("unistate.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        StateConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest).
pub(crate) fn apply_env_overrides(
    cfg: &mut StateConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("UNISTATE_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = get("UNISTATE_MAX_EVENTS_PER_KEY") {
        cfg.event_store.max_events_per_key = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("UNISTATE_MAX_EVENTS_PER_KEY: {e}"))?;
    }
    if let Some(v) = get("UNISTATE_EVENT_RETENTION_SECS") {
        cfg.event_store.retention_secs = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("UNISTATE_EVENT_RETENTION_SECS: {e}"))?;
    }
    if let Some(v) = get("UNISTATE_SYNC_INTERVAL_MS") {
        cfg.sync.interval_ms = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("UNISTATE_SYNC_INTERVAL_MS: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\ninterval_ms = 250\nstrategy = \"incremental\"").unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.sync.interval_ms, 250);
        assert_eq!(cfg.sync.strategy, "incremental");
    }

    #[test]
    fn test_load_from_path_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync\ninterval_ms = ").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("UNISTATE_LOG_LEVEL", "debug"),
            ("UNISTATE_MAX_EVENTS_PER_KEY", "12"),
            ("UNISTATE_EVENT_RETENTION_SECS", " "),
        ]
        .into_iter()
        .collect();

        let mut cfg = StateConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.event_store.max_events_per_key, 12);
        // Blank values are ignored.
        assert_eq!(cfg.event_store.retention_secs, 86_400);

        let bad = |k: &str| (k == "UNISTATE_SYNC_INTERVAL_MS").then(|| "soon".to_string());
        assert!(apply_env_overrides(&mut cfg, bad).is_err());
    }
}
