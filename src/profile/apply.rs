//! Writing a reconciled damaged profile onto the network's wind generators.

use std::collections::HashMap;

use tracing::{info, warn};

use super::ReconciledProfile;
use crate::error::{DispatchError, DispatchResult};
use crate::network::Network;

/// Carrier whose availability is replaced by the damaged profile.
pub const DAMAGED_CARRIER: &str = "onwind";

/// Overwrites `p_max_pu` of every `onwind` generator with the profile
/// column of its bus.
///
/// Rows are matched to snapshots by timestamp. Every snapshot must be
/// covered and every value must be finite; anything else is an error
/// rather than a silently missing availability.
///
/// # Returns
///
/// Number of generators updated.
///
/// # Errors
///
/// Returns [`DispatchError::Profile`] if a bus column is missing, the
/// profile does not cover a snapshot, or a value is not finite.
pub fn apply_damaged_profile(
    network: &mut Network,
    reconciled: &ReconciledProfile,
) -> DispatchResult<usize> {
    let profile = &reconciled.profile;
    let targets: Vec<(String, String)> = network
        .generators
        .iter()
        .filter(|g| g.carrier == DAMAGED_CARRIER)
        .map(|g| (g.name.clone(), g.bus.clone()))
        .collect();

    if targets.is_empty() {
        warn!("network has no {DAMAGED_CARRIER} generators, damaged profile not applied");
        return Ok(0);
    }

    if profile.len() < network.snapshot_count() {
        return Err(DispatchError::Profile(format!(
            "damaged profile has {} rows but the network has {} snapshots",
            profile.len(),
            network.snapshot_count()
        )));
    }

    let row_of: HashMap<_, _> = profile
        .index
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, i))
        .collect();
    let rows = network
        .snapshots
        .iter()
        .map(|snapshot| {
            row_of.get(snapshot).copied().ok_or_else(|| {
                DispatchError::Profile(format!("damaged profile has no row for snapshot {snapshot}"))
            })
        })
        .collect::<DispatchResult<Vec<usize>>>()?;

    for (generator, bus) in &targets {
        let column = profile.column_position(bus).ok_or_else(|| {
            DispatchError::Profile(format!(
                "damaged profile has no column for bus \"{bus}\" (generator \"{generator}\")"
            ))
        })?;
        let series = rows
            .iter()
            .zip(&network.snapshots)
            .map(|(&row, snapshot)| {
                let value = profile.rows[row][column];
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(DispatchError::Profile(format!(
                        "non-finite capacity factor for bus \"{bus}\" at {snapshot}"
                    )))
                }
            })
            .collect::<DispatchResult<Vec<f64>>>()?;
        network
            .generators_t
            .p_max_pu
            .insert(generator.clone(), series);
    }

    info!(
        generators = targets.len(),
        "applied damaged profile to {DAMAGED_CARRIER} generators"
    );
    Ok(targets.len())
}
