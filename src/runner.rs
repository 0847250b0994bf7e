//! The damaged dispatch pipeline, from input files to exported results.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::config::RunConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::harness::RunContext;
use crate::io::export::export_dispatch_csv;
use crate::memory::MemoryLogger;
use crate::network::io::{export_network, read_network};
use crate::network::{Network, fix_optimal_capacities};
use crate::profile::{Profile, Resolution, apply_damaged_profile, read_profile_csv, reconcile};
use crate::reporting::DispatchSummary;
use crate::shedding::add_load_shedding;
use crate::solve::{SolveMode, prepare_network, solve_network};

/// What a completed dispatch produced besides the mutated network.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub resolution: Resolution,
    /// Onwind generators whose availability was replaced.
    pub damaged_generators: usize,
    /// Components whose capacity was extendable before fixing.
    pub fixed_components: usize,
    pub shedding_generators: Vec<String>,
    pub summary: DispatchSummary,
}

/// Rejects a configuration with any validation error, listing all of them.
///
/// # Errors
///
/// Returns [`DispatchError::Config`] with every violation, one per line.
pub fn ensure_valid(config: &RunConfig) -> DispatchResult<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    Err(DispatchError::Config(lines.join("\n")))
}

/// Re-solves the dispatch of `network` under the damaged `profile`.
///
/// Steps, in order: reconcile the profile with the snapshots, apply it to
/// the onwind generators, fix all capacities, add load shedding, prepare
/// the network and solve it under the memory monitor.
///
/// # Errors
///
/// Any failing step aborts the run; the network may be partly modified.
pub fn dispatch_damaged(
    network: &mut Network,
    profile: Profile,
    config: &RunConfig,
    memory_log: Option<&Path>,
) -> DispatchResult<DispatchOutcome> {
    ensure_valid(config)?;

    let reconciled = reconcile(profile, &network.snapshots)?;
    let damaged_generators = apply_damaged_profile(network, &reconciled)?;

    let fixed_components = fix_optimal_capacities(network);
    info!(fixed_components, "fixed optimal capacities for dispatch-only optimization");

    let shedding_generators = add_load_shedding(network)?;

    prepare_network(network, &config.scenario, &config.solving.options)?;
    info!("network prepared for solving");

    let mode = SolveMode::from_options(&config.solving.options);
    let interval = Duration::from_secs(config.solving.mem_logging_frequency);
    let guard = MemoryLogger::start(interval, memory_log)?;
    let report = solve_network(network, mode)?;
    let peak = guard.finish();
    info!(peak_mib = peak.mib, "maximum memory usage");

    Ok(DispatchOutcome {
        resolution: reconciled.resolution,
        damaged_generators,
        fixed_components,
        shedding_generators,
        summary: DispatchSummary::from_network(network, &report, Some(peak)),
    })
}

/// Runs the whole pipeline for `ctx`: read inputs, dispatch, attach
/// metadata and write outputs.
///
/// # Errors
///
/// Returns the first error of any step.
pub fn run(ctx: &RunContext) -> DispatchResult<DispatchOutcome> {
    info!(
        network = %ctx.inputs.network.display(),
        profile = %ctx.inputs.damaged_profile.display(),
        "starting damaged dispatch"
    );
    let mut network = read_network(&ctx.inputs.network)?;
    let profile = read_profile_csv(&ctx.inputs.damaged_profile)?;

    let outcome = dispatch_damaged(
        &mut network,
        profile,
        &ctx.config,
        ctx.logs.memory.as_deref(),
    )?;

    network.meta = ctx.meta()?;
    export_network(&network, &ctx.outputs.network)?;
    info!(path = %ctx.outputs.network.display(), "exported solved network");

    if let Some(path) = &ctx.outputs.dispatch {
        export_dispatch_csv(&network, path)?;
        info!(path = %path.display(), "wrote dispatch table");
    }
    Ok(outcome)
}
