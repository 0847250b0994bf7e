//! Temporal resolution reconciliation between an hourly profile and the
//! (possibly time-aggregated) network snapshots.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::info;

use super::Profile;
use crate::error::{DispatchError, DispatchResult};

/// How the reconciled profile relates to the input profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The network is hourly or finer; the profile is used unmodified.
    Native,
    /// The profile was mean-resampled to `step` and re-indexed positionally.
    Aggregated {
        step: Duration,
        /// Number of bins produced by resampling, before truncation.
        resampled_len: usize,
    },
}

/// A damaged profile aligned with the network's snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledProfile {
    pub profile: Profile,
    pub resolution: Resolution,
}

/// Time step of the network, from its first two snapshots.
///
/// A single snapshot (or none) counts as hourly.
///
/// # Errors
///
/// Returns [`DispatchError::Profile`] if the step is not positive.
pub fn snapshot_step(snapshots: &[NaiveDateTime]) -> DispatchResult<Duration> {
    let step = match snapshots {
        [first, second, ..] => *second - *first,
        _ => Duration::hours(1),
    };
    if step <= Duration::zero() {
        return Err(DispatchError::Profile(format!(
            "network snapshots have a non-positive step of {step}"
        )));
    }
    Ok(step)
}

/// Resamples `profile` into bins of width `step`, averaging within each bin.
///
/// Bins are anchored at midnight of the first timestamp's day and cover
/// every bin from the first to the last populated one. NaN inputs are
/// skipped; a bin with no values yields NaN. Labels are bin start times.
///
/// # Errors
///
/// Returns [`DispatchError::Profile`] if `step` is shorter than one second.
pub fn resample_mean(profile: &Profile, step: Duration) -> DispatchResult<Profile> {
    let step_secs = step.num_seconds();
    if step_secs <= 0 {
        return Err(DispatchError::Profile(format!(
            "resample step must be at least one second, got {step}"
        )));
    }
    let Some(first) = profile.index.iter().min() else {
        return Profile::new(Vec::new(), profile.columns.clone(), Vec::new());
    };
    let origin = first.date().and_time(NaiveTime::MIN);
    let width = profile.columns.len();

    let mut bins: BTreeMap<i64, (Vec<f64>, Vec<usize>)> = BTreeMap::new();
    for (time, row) in profile.index.iter().zip(&profile.rows) {
        let bin = (*time - origin).num_seconds().div_euclid(step_secs);
        let (sums, counts) = bins
            .entry(bin)
            .or_insert_with(|| (vec![0.0; width], vec![0; width]));
        for (j, value) in row.iter().enumerate() {
            if !value.is_nan() {
                sums[j] += value;
                counts[j] += 1;
            }
        }
    }

    let (Some(&lo), Some(&hi)) = (bins.keys().next(), bins.keys().next_back()) else {
        return Profile::new(Vec::new(), profile.columns.clone(), Vec::new());
    };

    let mut index = Vec::with_capacity((hi - lo + 1) as usize);
    let mut rows = Vec::with_capacity(index.capacity());
    for bin in lo..=hi {
        index.push(origin + Duration::seconds(bin * step_secs));
        let row = match bins.get(&bin) {
            Some((sums, counts)) => sums
                .iter()
                .zip(counts)
                .map(|(s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
                .collect(),
            None => vec![f64::NAN; width],
        };
        rows.push(row);
    }

    Profile::new(index, profile.columns.clone(), rows)
}

/// Aligns an hourly damaged profile with the network snapshots.
///
/// When the network has fewer snapshots than the profile has rows, the
/// profile is mean-resampled to the network step, truncated to the common
/// length and its index replaced by the network snapshots position by
/// position. This assumes the resampled bins line up with the snapshots
/// from the same origin; no calendar join is attempted. Otherwise the
/// profile is returned unchanged.
///
/// # Errors
///
/// Fails if the snapshot step is not positive.
pub fn reconcile(profile: Profile, snapshots: &[NaiveDateTime]) -> DispatchResult<ReconciledProfile> {
    info!(
        snapshots = snapshots.len(),
        timesteps = profile.len(),
        "reconciling damaged profile with network snapshots"
    );

    if snapshots.len() >= profile.len() {
        info!("using damaged profile at native resolution");
        return Ok(ReconciledProfile {
            profile,
            resolution: Resolution::Native,
        });
    }

    let step = snapshot_step(snapshots)?;
    info!(%step, "network is time-aggregated, resampling damaged profile");

    let mut resampled = resample_mean(&profile, step)?;
    let resampled_len = resampled.len();
    let common = resampled_len.min(snapshots.len());
    resampled.truncate(common);
    resampled.index = snapshots[..common].to_vec();

    info!(rows = common, resampled_len, "aggregated damaged profile");
    Ok(ReconciledProfile {
        profile: resampled,
        resolution: Resolution::Aggregated {
            step,
            resampled_len,
        },
    })
}
