use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "unistate", version, about = "Inspect and exercise unified state synchronization")]
pub struct Args {
    /// Load configuration from this file instead of the default locations.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as TOML
    Config,
    /// Seed states and run a sync between two domains
    Simulate(SimulateArgs),
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Identity,
    ToolToGlobal,
    WorkflowSummary,
}

impl MappingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MappingKind::Identity => "identity",
            MappingKind::ToolToGlobal => "tool-to-global",
            MappingKind::WorkflowSummary => "workflow-summary",
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SimulateArgs {
    /// JSON file: {"states": [{"state_type", "id", "value"}]}
    #[arg(long)]
    pub seed: PathBuf,

    /// Source state type (session, workflow, conversation, tool, global)
    #[arg(long)]
    pub from: String,

    /// Target state type
    #[arg(long)]
    pub to: String,

    #[arg(long, value_enum, default_value_t = MappingKind::Identity)]
    pub mapping: MappingKind,

    /// full | incremental. Defaults to the configured strategy.
    #[arg(long)]
    pub strategy: Option<String>,

    /// Run a continuous sync for this many passes instead of a single pass.
    #[arg(long, default_value_t = 1)]
    pub rounds: u64,

    /// Interval between continuous passes. Defaults to the configured interval.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Also print the target domain's event history as JSON lines.
    #[arg(long)]
    pub events: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let args = Args::try_parse_from([
            "unistate",
            "simulate",
            "--seed",
            "seed.json",
            "--from",
            "tool",
            "--to",
            "global",
            "--mapping",
            "tool-to-global",
            "--rounds",
            "3",
            "--events",
        ])
        .unwrap();

        let Commands::Simulate(sim) = args.command else {
            panic!("expected simulate");
        };
        assert_eq!(sim.mapping, MappingKind::ToolToGlobal);
        assert_eq!(sim.rounds, 3);
        assert!(sim.events);
        assert!(sim.strategy.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let args = Args::try_parse_from(["unistate", "config", "--config", "/tmp/u.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/u.toml")));
        assert!(matches!(args.command, Commands::Config));
    }
}
