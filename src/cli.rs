use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::config::RunConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::harness::{Inputs, Logs, Outputs, RunContext, Wildcards};

#[derive(Parser, Debug)]
#[command(author, version, about = "Damaged-profile dispatch re-solve with load shedding", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Re-solve a network's dispatch under a damaged wind profile
    Solve(SolveArgs),
    /// Write a synthetic hourly damaged wind profile
    SynthProfile(SynthArgs),
}

#[derive(Args, Debug, Default)]
pub struct SolveArgs {
    /// Solved network (JSON) with optimal capacities
    #[arg(long, required_unless_present = "mock")]
    pub network: Option<PathBuf>,

    /// Hourly damaged capacity factors (CSV, one column per bus)
    #[arg(long, required_unless_present = "mock")]
    pub damaged_profile: Option<PathBuf>,

    /// Destination of the solved network (JSON)
    #[arg(long, required_unless_present = "mock")]
    pub output: Option<PathBuf>,

    /// Run configuration (TOML)
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in configuration preset (default, test)
    #[arg(long)]
    pub preset: Option<String>,

    /// Cluster wildcard recorded in the metadata
    #[arg(long, default_value = "")]
    pub clusters: String,

    /// Options wildcard recorded in the metadata
    #[arg(long, default_value = "")]
    pub opts: String,

    /// Append memory samples to this file
    #[arg(long)]
    pub memory_log: Option<PathBuf>,

    /// Mirror the run log to this file
    #[arg(long)]
    pub solver_log: Option<PathBuf>,

    /// Write the per-snapshot dispatch to this CSV
    #[arg(long)]
    pub dispatch_out: Option<PathBuf>,

    /// Use the fixed test scenario and derive all paths from its wildcards
    #[arg(long)]
    pub mock: bool,

    /// Base directory for mock-mode paths
    #[arg(long, default_value = ".", requires = "mock")]
    pub root: PathBuf,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Bus names, comma separated
    #[arg(long, value_delimiter = ',', required_unless_present = "network")]
    pub buses: Vec<String>,

    /// Take the buses of the network's onwind generators instead
    #[arg(long, conflicts_with = "buses")]
    pub network: Option<PathBuf>,

    /// First timestamp, `YYYY-MM-DD HH:MM:SS`
    #[arg(long, default_value = "2013-01-01 00:00:00", value_parser = parse_start)]
    pub start: NaiveDateTime,

    #[arg(long, default_value_t = 8760)]
    pub hours: usize,

    /// Multiplier applied to the undamaged capacity factor
    #[arg(long, default_value_t = 0.6)]
    pub damage_factor: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Destination CSV
    #[arg(long)]
    pub output: PathBuf,
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("invalid timestamp \"{raw}\": {e}"))
}

impl SolveArgs {
    fn load_config(&self) -> DispatchResult<RunConfig> {
        let loaded = match (&self.config, &self.preset) {
            (Some(path), _) => RunConfig::from_toml_file(path),
            (None, Some(name)) => RunConfig::from_preset(name),
            (None, None) if self.mock => Ok(RunConfig::test()),
            (None, None) => Ok(RunConfig::baseline()),
        };
        loaded.map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// Builds the run context from explicit paths, or from the mock
    /// scenario when `--mock` is set. Explicit log and dispatch paths
    /// override the mock defaults.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded or a required path is
    /// missing.
    pub fn into_context(self) -> DispatchResult<RunContext> {
        let config = self.load_config()?;
        if self.mock {
            let mut ctx = RunContext::mock(&self.root, config);
            if self.memory_log.is_some() {
                ctx.logs.memory = self.memory_log;
            }
            if self.solver_log.is_some() {
                ctx.logs.solver = self.solver_log;
            }
            if self.dispatch_out.is_some() {
                ctx.outputs.dispatch = self.dispatch_out;
            }
            return Ok(ctx);
        }

        let missing = |flag: &str| DispatchError::Config(format!("missing required argument {flag}"));
        Ok(RunContext {
            inputs: Inputs {
                network: self.network.ok_or_else(|| missing("--network"))?,
                damaged_profile: self
                    .damaged_profile
                    .ok_or_else(|| missing("--damaged-profile"))?,
            },
            outputs: Outputs {
                network: self.output.ok_or_else(|| missing("--output"))?,
                dispatch: self.dispatch_out,
            },
            logs: Logs {
                solver: self.solver_log,
                memory: self.memory_log,
            },
            wildcards: Wildcards {
                clusters: self.clusters,
                opts: self.opts,
            },
            config,
        })
    }
}
