//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use damaged_dispatch::network::{Bus, Generator, Line, Link, Load, Network};
use damaged_dispatch::profile::Profile;

/// Absolute tolerance for solver results.
pub const TOL: f64 = 1e-3;

/// 2013-01-01 00:00.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2013, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// `n` timestamps `step` apart from [`start`].
pub fn timestamps(n: usize, step: Duration) -> Vec<NaiveDateTime> {
    (0..n).map(|i| start() + step * i as i32).collect()
}

pub fn hourly(n: usize) -> Vec<NaiveDateTime> {
    timestamps(n, Duration::hours(1))
}

/// Profile with one column per bus, filled by `value(hour, column)`.
pub fn profile(
    index: Vec<NaiveDateTime>,
    buses: &[&str],
    value: impl Fn(usize, usize) -> f64,
) -> Profile {
    let rows = (0..index.len())
        .map(|t| (0..buses.len()).map(|j| value(t, j)).collect())
        .collect();
    Profile::new(index, buses.iter().map(|b| b.to_string()).collect(), rows)
        .expect("consistent profile")
}

fn add_bus(n: &mut Network, name: &str, carrier: &str) {
    n.add_bus(Bus {
        name: name.into(),
        carrier: carrier.into(),
    })
    .expect("add bus");
}

/// Generator as left by a capacity optimization: extendable, with its
/// optimum in `p_nom_opt`.
pub fn solved_generator(name: &str, bus: &str, carrier: &str, p_nom_opt: f64, cost: f64) -> Generator {
    Generator {
        name: name.into(),
        bus: bus.into(),
        carrier: carrier.into(),
        p_nom_opt,
        p_nom_extendable: true,
        marginal_cost: cost,
        ..Generator::default()
    }
}

/// Electricity-only network with buses `bus1` and `bus2` (carrier `AC`).
///
/// ```text
/// bus1: load 10 MW, onwind 20 MW, gas 4 MW @ 50
/// bus2: load  5 MW, onwind 10 MW
/// line bus1-bus2: 5 MW
/// ```
pub fn two_bus_network(snapshots: Vec<NaiveDateTime>) -> Network {
    let mut n = Network::new("two-bus", snapshots);
    add_bus(&mut n, "bus1", "AC");
    add_bus(&mut n, "bus2", "AC");
    for (bus, p) in [("bus1", 10.0), ("bus2", 5.0)] {
        n.add_load(Load {
            name: format!("{bus} load"),
            bus: bus.into(),
            p_set: p,
        })
        .expect("add load");
    }
    for g in [
        solved_generator("bus1 onwind", "bus1", "onwind", 20.0, 0.0),
        solved_generator("bus2 onwind", "bus2", "onwind", 10.0, 0.0),
        solved_generator("bus1 gas", "bus1", "gas", 4.0, 50.0),
    ] {
        n.add_generator(g).expect("add generator");
    }
    n.add_line(Line {
        name: "bus1-bus2".into(),
        bus0: "bus1".into(),
        bus1: "bus2".into(),
        s_nom_opt: 5.0,
        s_nom_extendable: true,
        ..Line::default()
    })
    .expect("add line");
    n
}

/// Sector-coupled network around one node `DE0 0`.
///
/// ```text
/// DE0 0 (AC): onwind 10 MW
/// DE0 0 low voltage: load 4 MW, fed by a 10 MW distribution link
/// DE0 0 rural heat: load 3 MW, no supply
/// DE0 0 gas (gas): no shedding expected here
/// ```
pub fn sector_network(snapshots: Vec<NaiveDateTime>) -> Network {
    let mut n = Network::new("sector", snapshots);
    add_bus(&mut n, "DE0 0", "AC");
    add_bus(&mut n, "DE0 0 low voltage", "low voltage");
    add_bus(&mut n, "DE0 0 rural heat", "rural heat");
    add_bus(&mut n, "DE0 0 gas", "gas");
    for (bus, p) in [("DE0 0 low voltage", 4.0), ("DE0 0 rural heat", 3.0)] {
        n.add_load(Load {
            name: format!("{bus} load"),
            bus: bus.into(),
            p_set: p,
        })
        .expect("add load");
    }
    n.add_generator(solved_generator("DE0 0 onwind", "DE0 0", "onwind", 10.0, 0.0))
        .expect("add generator");
    n.add_link(Link {
        name: "DE0 0 electricity distribution grid".into(),
        bus0: "DE0 0".into(),
        bus1: "DE0 0 low voltage".into(),
        carrier: "electricity distribution grid".into(),
        p_nom_opt: 10.0,
        p_nom_extendable: true,
        ..Link::default()
    })
    .expect("add link");
    n
}

/// Sum of `generators_t.p` over generators with `carrier` at snapshot `t`.
pub fn carrier_output(network: &Network, carrier: &str, t: usize) -> f64 {
    network
        .generators
        .iter()
        .filter(|g| g.carrier == carrier)
        .filter_map(|g| network.generators_t.p.get(&g.name))
        .map(|p| p[t])
        .sum()
}
