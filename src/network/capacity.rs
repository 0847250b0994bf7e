//! Conversion of an investment-and-dispatch network into a dispatch-only one.

use super::Network;

/// Freezes every previously optimized capacity.
///
/// Extendable generators, links, storage units, stores and lines take their
/// optimal capacity as nominal and stop being extendable; fixed components
/// keep their nominal capacity. Returns the number of components that were
/// extendable before the call.
pub fn fix_optimal_capacities(network: &mut Network) -> usize {
    let mut was_extendable = 0;

    for g in &mut network.generators {
        if g.p_nom_extendable {
            g.p_nom = g.p_nom_opt;
            g.p_nom_extendable = false;
            was_extendable += 1;
        }
    }
    for l in &mut network.links {
        if l.p_nom_extendable {
            l.p_nom = l.p_nom_opt;
            l.p_nom_extendable = false;
            was_extendable += 1;
        }
    }
    for s in &mut network.storage_units {
        if s.p_nom_extendable {
            s.p_nom = s.p_nom_opt;
            s.p_nom_extendable = false;
            was_extendable += 1;
        }
    }
    for s in &mut network.stores {
        if s.e_nom_extendable {
            s.e_nom = s.e_nom_opt;
            s.e_nom_extendable = false;
            was_extendable += 1;
        }
    }
    for l in &mut network.lines {
        if l.s_nom_extendable {
            l.s_nom = l.s_nom_opt;
            l.s_nom_extendable = false;
            was_extendable += 1;
        }
    }

    was_extendable
}

/// Returns `true` if any component still has an extendable capacity.
pub fn has_extendable_capacity(network: &Network) -> bool {
    network.generators.iter().any(|g| g.p_nom_extendable)
        || network.links.iter().any(|l| l.p_nom_extendable)
        || network.storage_units.iter().any(|s| s.p_nom_extendable)
        || network.stores.iter().any(|s| s.e_nom_extendable)
        || network.lines.iter().any(|l| l.s_nom_extendable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Bus, Generator, Line, StorageUnit, Store};

    fn solved_network() -> Network {
        let mut n = Network::new("solved", Vec::new());
        for name in ["a", "b"] {
            n.add_bus(Bus {
                name: name.into(),
                carrier: "AC".into(),
            })
            .expect("bus");
        }
        n.add_generator(Generator {
            name: "a onwind".into(),
            bus: "a".into(),
            carrier: "onwind".into(),
            p_nom: 5.0,
            p_nom_opt: 42.0,
            p_nom_extendable: true,
            ..Generator::default()
        })
        .expect("gen");
        n.add_generator(Generator {
            name: "a nuclear".into(),
            bus: "a".into(),
            p_nom: 7.0,
            ..Generator::default()
        })
        .expect("gen");
        n.add_storage_unit(StorageUnit {
            name: "a battery".into(),
            bus: "a".into(),
            p_nom_opt: 3.0,
            p_nom_extendable: true,
            ..StorageUnit::default()
        })
        .expect("su");
        n.add_store(Store {
            name: "b H2".into(),
            bus: "b".into(),
            e_nom_opt: 100.0,
            e_nom_extendable: true,
            ..Store::default()
        })
        .expect("store");
        n.add_line(Line {
            name: "a-b".into(),
            bus0: "a".into(),
            bus1: "b".into(),
            s_nom: 1.0,
            s_nom_opt: 9.0,
            s_nom_extendable: true,
            ..Line::default()
        })
        .expect("line");
        n
    }

    #[test]
    fn no_extendable_capacity_remains() {
        let mut n = solved_network();
        assert!(has_extendable_capacity(&n));
        let count = fix_optimal_capacities(&mut n);
        assert_eq!(count, 4);
        assert!(!has_extendable_capacity(&n));
    }

    #[test]
    fn nominal_takes_optimal_value() {
        let mut n = solved_network();
        fix_optimal_capacities(&mut n);
        assert_eq!(n.generator("a onwind").map(|g| g.p_nom), Some(42.0));
        assert_eq!(n.generator("a nuclear").map(|g| g.p_nom), Some(7.0));
        assert_eq!(n.storage_units[0].p_nom, 3.0);
        assert_eq!(n.stores[0].e_nom, 100.0);
        assert_eq!(n.lines[0].s_nom, 9.0);
    }

    #[test]
    fn fixed_capacity_ignores_missing_optimum() {
        let mut n = solved_network();
        n.add_generator(Generator {
            name: "b nuclear".into(),
            bus: "b".into(),
            p_nom: 10.0,
            p_nom_opt: 0.0,
            ..Generator::default()
        })
        .expect("gen");
        let count = fix_optimal_capacities(&mut n);
        assert_eq!(count, 4);
        assert_eq!(n.generator("b nuclear").map(|g| g.p_nom), Some(10.0));
    }
}
