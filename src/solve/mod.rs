//! Dispatch optimization: network preparation, the window LP and the
//! single-shot / rolling-horizon drivers.

pub mod lp;
pub mod prepare;
pub mod rolling;

use std::fmt;

use tracing::info;

use crate::config::SolveOptions;
use crate::error::{DispatchError, DispatchResult};
use crate::network::Network;

pub use lp::{InitialState, WindowSolution, solve_window};
pub use prepare::prepare_network;

/// How the optimization horizon is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// One LP over every snapshot.
    Single,
    /// Consecutive windows of `horizon` snapshots sharing `overlap`.
    RollingHorizon { horizon: usize, overlap: usize },
}

impl SolveMode {
    pub fn from_options(options: &SolveOptions) -> Self {
        if options.rolling_horizon {
            SolveMode::RollingHorizon {
                horizon: options.horizon,
                overlap: options.overlap,
            }
        } else {
            SolveMode::Single
        }
    }
}

impl fmt::Display for SolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMode::Single => write!(f, "single"),
            SolveMode::RollingHorizon { horizon, overlap } => {
                write!(f, "rolling horizon ({horizon} snapshots, overlap {overlap})")
            }
        }
    }
}

/// Result of a completed solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub mode: SolveMode,
    pub windows: usize,
    pub objective: f64,
}

/// Optimizes the dispatch of `network` and writes the results into it.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidNetwork`] for a network without
/// snapshots, a configuration error for invalid rolling-horizon settings,
/// and [`DispatchError::Solver`] when a window cannot be solved.
pub fn solve_network(network: &mut Network, mode: SolveMode) -> DispatchResult<SolveReport> {
    if network.snapshot_count() == 0 {
        return Err(DispatchError::InvalidNetwork(
            "network has no snapshots to optimize".to_string(),
        ));
    }
    info!(%mode, snapshots = network.snapshot_count(), "solving network");

    let (objective, windows) = match mode {
        SolveMode::Single => {
            let initial = InitialState::from_network(network);
            let solution = solve_window(network, 0..network.snapshot_count(), &initial)?;
            solution.write_back(network, false);
            (solution.objective, 1)
        }
        SolveMode::RollingHorizon { horizon, overlap } => {
            rolling::solve_rolling(network, horizon, overlap)?
        }
    };

    network.objective = Some(objective);
    info!(objective, windows, "solve finished");
    Ok(SolveReport {
        mode,
        windows,
        objective,
    })
}
