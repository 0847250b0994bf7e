//! Run context: the inputs, outputs, logs, parameters and wildcards of
//! one damaged dispatch run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::error::{DispatchError, DispatchResult};

/// Scenario labels the run's file names are derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wildcards {
    /// Number of network clusters.
    pub clusters: String,
    /// Extra scenario options, `-` separated.
    pub opts: String,
}

impl Wildcards {
    /// Wildcards of the fixed test scenario.
    pub fn mock() -> Self {
        Self {
            clusters: "5".to_string(),
            opts: String::new(),
        }
    }

    /// File-name stem shared by the run's network files.
    pub fn stem(&self) -> String {
        format!("base_s_{}_elec_{}", self.clusters, self.opts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    /// Network solved with the undamaged profile.
    pub network: PathBuf,
    /// Hourly damaged capacity factors per bus.
    pub damaged_profile: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outputs {
    pub network: PathBuf,
    /// Per-snapshot dispatch table.
    pub dispatch: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Logs {
    pub solver: Option<PathBuf>,
    pub memory: Option<PathBuf>,
}

/// Everything a run needs, assembled from CLI arguments or the mock scenario.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub inputs: Inputs,
    pub outputs: Outputs,
    pub logs: Logs,
    pub wildcards: Wildcards,
    pub config: RunConfig,
}

impl RunContext {
    /// Context of the fixed test scenario, with paths under `root`.
    ///
    /// Layout:
    /// ```text
    /// resources/<run>/profile_<clusters>_onwind_damaged.csv
    /// results/<run>/networks/<stem>.json
    /// results/<run>/networks/<stem>_damaged_op.json
    /// results/<run>/csvs/<stem>_damaged_dispatch.csv
    /// logs/<run>/solve_operations_network_damaged/<stem>_{solver,memory}.log
    /// ```
    pub fn mock(root: &Path, config: RunConfig) -> Self {
        let wildcards = Wildcards::mock();
        let run = config.run.name.clone();
        let stem = wildcards.stem();
        let results = root.join("results").join(&run);
        let logs = root
            .join("logs")
            .join(&run)
            .join("solve_operations_network_damaged");
        Self {
            inputs: Inputs {
                network: results.join("networks").join(format!("{stem}.json")),
                damaged_profile: root
                    .join("resources")
                    .join(&run)
                    .join(format!("profile_{}_onwind_damaged.csv", wildcards.clusters)),
            },
            outputs: Outputs {
                network: results
                    .join("networks")
                    .join(format!("{stem}_damaged_op.json")),
                dispatch: Some(
                    results
                        .join("csvs")
                        .join(format!("{stem}_damaged_dispatch.csv")),
                ),
            },
            logs: Logs {
                solver: Some(logs.join(format!("{stem}_solver.log"))),
                memory: Some(logs.join(format!("{stem}_memory.log"))),
            },
            wildcards,
            config,
        }
    }

    /// Run metadata stored on the exported network: the configuration
    /// with a `wildcards` entry added.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not serialize to a JSON object.
    pub fn meta(&self) -> DispatchResult<serde_json::Value> {
        let mut meta = serde_json::to_value(&self.config)?;
        let object = meta.as_object_mut().ok_or_else(|| {
            DispatchError::Config("configuration did not serialize to an object".to_string())
        })?;
        object.insert("wildcards".to_string(), serde_json::to_value(&self.wildcards)?);
        Ok(meta)
    }
}
