//! Rolling-horizon dispatch: consecutive, possibly overlapping windows.

use std::ops::Range;

use tracing::info;

use super::lp::{InitialState, solve_window};
use crate::error::{DispatchError, DispatchResult};
use crate::network::Network;

/// Snapshot ranges visited by a rolling-horizon solve.
///
/// Windows start every `horizon - overlap` snapshots; the last one is cut
/// at the end of the horizon.
///
/// # Errors
///
/// Returns [`DispatchError::Config`] if `horizon` is zero or `overlap` is
/// not smaller than `horizon`.
pub fn windows(snapshots: usize, horizon: usize, overlap: usize) -> DispatchResult<Vec<Range<usize>>> {
    if horizon == 0 || overlap >= horizon {
        return Err(DispatchError::Config(format!(
            "rolling horizon needs 0 <= overlap < horizon, got horizon {horizon} and overlap {overlap}"
        )));
    }
    let stride = horizon - overlap;
    let mut out = Vec::new();
    let mut start = 0;
    while start < snapshots {
        let end = (start + horizon).min(snapshots);
        out.push(start..end);
        if end == snapshots {
            break;
        }
        start += stride;
    }
    Ok(out)
}

/// Solves the network window by window, carrying storage levels forward.
///
/// Returns the summed window objectives and the number of windows.
pub fn solve_rolling(
    network: &mut Network,
    horizon: usize,
    overlap: usize,
) -> DispatchResult<(f64, usize)> {
    let ranges = windows(network.snapshot_count(), horizon, overlap)?;
    let mut objective = 0.0;
    for (i, range) in ranges.iter().enumerate() {
        let initial = if range.start == 0 {
            InitialState::from_network(network)
        } else {
            InitialState::from_results(network, range.start - 1)
        };
        info!(
            window = i + 1,
            of = ranges.len(),
            start = range.start,
            end = range.end,
            "solving rolling-horizon window"
        );
        let solution = solve_window(network, range.clone(), &initial)?;
        solution.write_back(network, i > 0);
        objective += solution.objective;
    }
    Ok((objective, ranges.len()))
}
