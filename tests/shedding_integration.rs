//! Integration tests for load-shedding synthesis on realistic networks.

mod common;

use damaged_dispatch::error::DispatchError;
use damaged_dispatch::network::{Bus, Network, fix_optimal_capacities};
use damaged_dispatch::network::capacity::has_extendable_capacity;
use damaged_dispatch::shedding::{
    LOAD_EL_CARRIER, LOAD_HEAT_CARRIER, LOAD_SHEDDING_CARRIER, SHEDDING_MARGINAL_COST,
    add_load_shedding,
};

#[test]
fn two_bus_network_gets_one_generator_per_bus() {
    let mut n = common::two_bus_network(common::hourly(3));
    let added = add_load_shedding(&mut n).expect("shedding");
    assert_eq!(added, vec!["bus1 load shedding", "bus2 load shedding"]);

    let new_carriers: Vec<_> = n
        .carriers
        .iter()
        .filter(|c| c.name.contains("load"))
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(new_carriers, vec![LOAD_SHEDDING_CARRIER]);

    for name in &added {
        let g = n.generator(name).expect("generator exists");
        assert_eq!(g.carrier, LOAD_SHEDDING_CARRIER);
        assert_eq!(g.marginal_cost, SHEDDING_MARGINAL_COST);
        assert_eq!(g.capital_cost, 0.0);
        assert!(g.p_nom_extendable);
    }
}

#[test]
fn sector_network_sheds_only_on_low_voltage_and_heat() {
    let mut n = common::sector_network(common::hourly(3));
    for (name, carrier) in [
        ("DE0 0 urban central heat", "urban central heat"),
        ("DE0 0 urban decentral heat", "urban decentral heat"),
        ("DE0 0 residential heat", "residential heat"),
    ] {
        n.add_bus(Bus {
            name: name.into(),
            carrier: carrier.into(),
        })
        .expect("bus");
    }

    let added = add_load_shedding(&mut n).expect("shedding");
    assert_eq!(
        added,
        vec![
            "DE0 0 low voltage load shedding",
            "DE0 0 rural heat load shedding",
            "DE0 0 urban central heat load shedding",
            "DE0 0 urban decentral heat load shedding",
        ]
    );
    assert_eq!(
        n.generator("DE0 0 low voltage load shedding")
            .map(|g| g.carrier.as_str()),
        Some(LOAD_EL_CARRIER)
    );
    for name in &added[1..] {
        assert_eq!(
            n.generator(name).map(|g| g.carrier.as_str()),
            Some(LOAD_HEAT_CARRIER)
        );
    }
    assert!(n.generator("DE0 0 load shedding").is_none());
    assert!(n.generator("DE0 0 residential heat load shedding").is_none());
}

#[test]
fn adding_shedding_twice_is_a_naming_conflict() {
    let mut n = common::two_bus_network(common::hourly(1));
    add_load_shedding(&mut n).expect("first");
    let err = add_load_shedding(&mut n).expect_err("second must fail");
    assert!(matches!(err, DispatchError::DuplicateComponent { .. }));
}

#[test]
fn fixed_network_keeps_only_shedding_extendable() {
    let mut n = common::two_bus_network(common::hourly(1));
    let fixed = fix_optimal_capacities(&mut n);
    assert_eq!(fixed, 4);
    assert!(!has_extendable_capacity(&n));
    assert_eq!(n.generator("bus1 onwind").map(|g| g.p_nom), Some(20.0));
    assert_eq!(n.lines[0].s_nom, 5.0);

    add_load_shedding(&mut n).expect("shedding");
    let extendable: Vec<_> = n
        .generators
        .iter()
        .filter(|g| g.p_nom_extendable)
        .map(|g| g.name.as_str())
        .collect();
    assert_eq!(extendable, vec!["bus1 load shedding", "bus2 load shedding"]);
}

#[test]
fn empty_network_gets_no_shedding() {
    let mut n = Network::new("empty", common::hourly(1));
    let added = add_load_shedding(&mut n).expect("shedding");
    assert!(added.is_empty());
}
