use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::graph::VersionGraph;
use crate::error::{StateError, StateResult};
use crate::state::traits::StateMigrator;
use crate::state::value::StateValue;

/// One migration step.
pub type Transformer = Arc<dyn Fn(StateValue) -> anyhow::Result<StateValue> + Send + Sync>;

/// Migrator built from single-step transformers keyed `{from}_to_{to}`.
///
/// Requests without a direct step are resolved through the shortest chain
/// of registered steps.
#[derive(Clone, Default)]
pub struct VersionedMigrator {
    graph: VersionGraph,
    transformers: HashMap<String, Transformer>,
}

pub fn step_key(from: &str, to: &str) -> String {
    format!("{from}_to_{to}")
}

impl VersionedMigrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the step `from -> to`.
    pub fn register<F>(mut self, from: &str, to: &str, transform: F) -> Self
    where
        F: Fn(StateValue) -> anyhow::Result<StateValue> + Send + Sync + 'static,
    {
        self.graph.add_edge(from, to);
        self.transformers.insert(step_key(from, to), Arc::new(transform));
        self
    }

    pub fn has_step(&self, from: &str, to: &str) -> bool {
        self.transformers.contains_key(&step_key(from, to))
    }

    pub fn step_count(&self) -> usize {
        self.transformers.len()
    }
}

#[async_trait]
impl StateMigrator for VersionedMigrator {
    async fn migrate_state(&self, from_version: &str, to_version: &str, value: StateValue) -> StateResult<StateValue> {
        let path = self
            .graph
            .shortest_path(from_version, to_version)
            .ok_or_else(|| StateError::NoMigrationPath {
                from: from_version.to_string(),
                to: to_version.to_string(),
            })?;

        let mut current = value;
        for (hop_from, hop_to) in path {
            let key = step_key(&hop_from, &hop_to);
            let transform = self
                .transformers
                .get(&key)
                .ok_or_else(|| StateError::NoMigrationPath {
                    from: hop_from.clone(),
                    to: hop_to.clone(),
                })?;
            current = transform(current).map_err(|e| StateError::MigrationFailed {
                from: hop_from.clone(),
                to: hop_to.clone(),
                reason: e.to_string(),
            })?;
            tracing::debug!(step = %key, "migration step applied");
        }
        Ok(current)
    }
}
