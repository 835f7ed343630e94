mod graph;
mod versioned;

pub use graph::VersionGraph;
pub use versioned::{step_key, Transformer, VersionedMigrator};
