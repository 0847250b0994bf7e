//! End-of-run dispatch summary.

use std::collections::BTreeMap;
use std::fmt;

use crate::memory::MemorySample;
use crate::network::Network;
use crate::profile::apply::DAMAGED_CARRIER;
use crate::shedding::{LOAD_EL_CARRIER, LOAD_HEAT_CARRIER, LOAD_SHEDDING_CARRIER};
use crate::solve::SolveReport;

const SHEDDING_CARRIERS: [&str; 3] = [LOAD_SHEDDING_CARRIER, LOAD_EL_CARRIER, LOAD_HEAT_CARRIER];

/// Headline numbers of a solved damaged dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSummary {
    pub snapshots: usize,
    pub windows: usize,
    pub objective: f64,
    /// Weighted total demand (MWh).
    pub demand_mwh: f64,
    /// Weighted output of the damaged wind generators (MWh).
    pub onwind_mwh: f64,
    /// Unserved energy per shedding carrier (MWh).
    pub shed_mwh: BTreeMap<String, f64>,
    /// Largest total shedding in any snapshot (MW).
    pub peak_shed_mw: f64,
    pub peak_memory: Option<MemorySample>,
}

fn weighted_sum(network: &Network, series: &[f64]) -> f64 {
    series
        .iter()
        .enumerate()
        .map(|(t, v)| v * network.snapshot_weighting(t))
        .sum()
}

impl DispatchSummary {
    /// Collects the summary from a network whose dispatch has been solved.
    ///
    /// # Arguments
    ///
    /// * `network` - Solved network with `generators_t.p` populated
    /// * `report` - Solve outcome (windows and objective)
    /// * `peak_memory` - Peak sample from the memory monitor, if it ran
    pub fn from_network(
        network: &Network,
        report: &SolveReport,
        peak_memory: Option<MemorySample>,
    ) -> Self {
        let n = network.snapshot_count();
        let demand_mwh = network
            .loads
            .iter()
            .map(|l| {
                let series: Vec<f64> = (0..n).map(|t| network.p_set(l, t)).collect();
                weighted_sum(network, &series)
            })
            .sum();

        let mut onwind_mwh = 0.0;
        let mut shed_mwh = BTreeMap::new();
        let mut shed_per_snapshot = vec![0.0; n];
        for g in &network.generators {
            let Some(p) = network.generators_t.p.get(&g.name) else {
                continue;
            };
            if g.carrier == DAMAGED_CARRIER {
                onwind_mwh += weighted_sum(network, p);
            } else if SHEDDING_CARRIERS.contains(&g.carrier.as_str()) {
                *shed_mwh.entry(g.carrier.clone()).or_insert(0.0) += weighted_sum(network, p);
                for (total, v) in shed_per_snapshot.iter_mut().zip(p) {
                    *total += v;
                }
            }
        }
        let peak_shed_mw = shed_per_snapshot.into_iter().fold(0.0, f64::max);

        Self {
            snapshots: n,
            windows: report.windows,
            objective: report.objective,
            demand_mwh,
            onwind_mwh,
            shed_mwh,
            peak_shed_mw,
            peak_memory,
        }
    }

    /// Total unserved energy over all shedding carriers (MWh).
    pub fn total_shed_mwh(&self) -> f64 {
        self.shed_mwh.values().sum()
    }
}

impl fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Damaged Dispatch Summary ---")?;
        writeln!(
            f,
            "Snapshots:             {} ({} window(s))",
            self.snapshots, self.windows
        )?;
        writeln!(f, "Objective:             {:.2}", self.objective)?;
        writeln!(f, "Demand:                {:.2} MWh", self.demand_mwh)?;
        writeln!(f, "Onwind output:         {:.2} MWh", self.onwind_mwh)?;
        for (carrier, mwh) in &self.shed_mwh {
            writeln!(f, "Shed ({carrier}):{:>w$.2} MWh", mwh, w = 21 - carrier.len().min(20))?;
        }
        writeln!(f, "Peak shedding:         {:.2} MW", self.peak_shed_mw)?;
        match self.peak_memory {
            Some(m) => write!(f, "Peak memory:           {:.1} MiB", m.mib),
            None => write!(f, "Peak memory:           n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Bus, Generator, Load};
    use crate::solve::SolveMode;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn hours(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2013, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("date");
        (0..n).map(|h| start + Duration::hours(h as i64)).collect()
    }

    fn solved() -> Network {
        let mut n = Network::new("n", hours(2));
        n.snapshot_weightings = vec![2.0, 2.0];
        n.add_bus(Bus {
            name: "b".into(),
            carrier: "AC".into(),
        })
        .expect("bus");
        n.add_load(Load {
            name: "l".into(),
            bus: "b".into(),
            p_set: 5.0,
        })
        .expect("load");
        for (name, carrier) in [("w", "onwind"), ("b load shedding", "load_shedding")] {
            n.add_generator(Generator {
                name: name.into(),
                bus: "b".into(),
                carrier: carrier.into(),
                ..Generator::default()
            })
            .expect("gen");
        }
        n.generators_t.p.insert("w".into(), vec![4.0, 2.0]);
        n.generators_t.p.insert("b load shedding".into(), vec![1.0, 3.0]);
        n
    }

    fn report() -> SolveReport {
        SolveReport {
            mode: SolveMode::Single,
            windows: 1,
            objective: 8e4,
        }
    }

    #[test]
    fn energies_are_weighted() {
        let s = DispatchSummary::from_network(&solved(), &report(), None);
        assert_eq!(s.demand_mwh, 20.0);
        assert_eq!(s.onwind_mwh, 12.0);
        assert_eq!(s.shed_mwh.get("load_shedding"), Some(&8.0));
        assert_eq!(s.total_shed_mwh(), 8.0);
        assert_eq!(s.peak_shed_mw, 3.0);
    }

    #[test]
    fn display_lists_shedding_and_memory() {
        let peak = MemorySample {
            mib: 512.0,
            timestamp: 1.0,
        };
        let text = DispatchSummary::from_network(&solved(), &report(), Some(peak)).to_string();
        assert!(text.contains("Shed (load_shedding)"));
        assert!(text.contains("512.0 MiB"));
    }
}
