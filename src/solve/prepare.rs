//! Network adjustments applied right before solving.

use tracing::{debug, info};

use super::lp::OPERATIONAL_LIMIT;
use crate::config::{ScenarioConfig, SolveOptions};
use crate::error::{DispatchError, DispatchResult};
use crate::network::{GlobalConstraint, Network};

pub const CO2_SEQUESTRATION_LIMIT: &str = "co2_sequestration_limit";
pub const CO2_SEQUESTERED_CARRIER: &str = "co2 sequestered";

/// Sets availability factors at or below `threshold` to zero.
///
/// # Returns
///
/// Number of values clipped.
pub fn clip_p_max_pu(network: &mut Network, threshold: f64) -> usize {
    let mut clipped = 0;
    for series in network.generators_t.p_max_pu.values_mut() {
        for v in series.iter_mut().filter(|v| **v <= threshold && **v != 0.0) {
            *v = 0.0;
            clipped += 1;
        }
    }
    clipped
}

/// Hours in the modelled year that a shortened horizon stands in for.
const HOURS_PER_YEAR: f64 = 8760.0;

/// Restricts the network to its first `nhours` snapshots and reweights
/// each of them by `8760 / nhours` so annual totals keep their scale.
pub fn limit_snapshots(network: &mut Network, nhours: usize) {
    if nhours < network.snapshot_count() {
        info!(nhours, "restricting optimization to the first snapshots");
        network.truncate_snapshots(nhours);
    }
    let weighting = HOURS_PER_YEAR / nhours as f64;
    network.snapshot_weightings.fill(weighting);
}

/// Bounds the total sequestered CO2 by `potential` (Mt) per year.
pub fn add_co2_sequestration_limit(network: &mut Network, potential: f64) {
    let constant = potential * 1e6;
    info!(constant, "adding CO2 sequestration limit");
    network.set_global_constraint(GlobalConstraint {
        name: CO2_SEQUESTRATION_LIMIT.to_string(),
        kind: OPERATIONAL_LIMIT.to_string(),
        carrier_attribute: CO2_SEQUESTERED_CARRIER.to_string(),
        sense: "<=".to_string(),
        constant,
    });
}

/// Applies every pre-solve adjustment.
///
/// # Errors
///
/// Returns [`DispatchError::Config`] for perfect foresight, which needs a
/// multi-period investment model.
pub fn prepare_network(
    network: &mut Network,
    scenario: &ScenarioConfig,
    options: &SolveOptions,
) -> DispatchResult<()> {
    if scenario.foresight == "perfect" {
        return Err(DispatchError::Config(
            "perfect foresight requires multi-period investment, which is not supported"
                .to_string(),
        ));
    }

    let clipped = clip_p_max_pu(network, options.clip_p_max_pu);
    debug!(clipped, threshold = options.clip_p_max_pu, "clipped p_max_pu");

    if let Some(nhours) = options.nhours {
        limit_snapshots(network, nhours);
    }

    if let Some(potential) = scenario.sequestration_potential() {
        add_co2_sequestration_limit(network, potential);
    }
    Ok(())
}
