//! Synthetic load-shedding generators that keep the dispatch problem feasible.
//!
//! Two strategies exist: [`ElectricityOnly`] puts a shedding generator on
//! every bus, [`SectorCoupled`] only on low-voltage and heat buses. Use
//! [`select_strategy`] to pick the right one for a network.

use tracing::{debug, info};

use crate::error::DispatchResult;
use crate::network::{Generator, Network};

/// Cost of unserved energy (currency/MWh).
pub const SHEDDING_MARGINAL_COST: f64 = 1e4;

/// Carrier used for shedding on electricity-only networks.
pub const LOAD_SHEDDING_CARRIER: &str = "load_shedding";
/// Carrier for electrical shedding on sector-coupled networks.
pub const LOAD_EL_CARRIER: &str = "load_el";
/// Carrier for heat shedding on sector-coupled networks.
pub const LOAD_HEAT_CARRIER: &str = "load_heat";

const LOW_VOLTAGE: &str = "low voltage";
const HEAT_BUS_CARRIERS: [&str; 3] = ["rural heat", "urban central heat", "urban decentral heat"];

/// Name of the shedding generator attached to `bus`.
pub fn shedding_generator_name(bus: &str) -> String {
    format!("{bus} load shedding")
}

/// Builds one shedding generator: very expensive, free to build, unbounded.
pub fn shedding_generator(bus: &str, carrier: &str) -> Generator {
    Generator {
        name: shedding_generator_name(bus),
        bus: bus.to_string(),
        carrier: carrier.to_string(),
        marginal_cost: SHEDDING_MARGINAL_COST,
        capital_cost: 0.0,
        p_nom_extendable: true,
        ..Generator::default()
    }
}

/// A way of relaxing unmet demand in a network.
pub trait SheddingStrategy {
    /// Short label for logs.
    fn label(&self) -> &'static str;

    /// Adds shedding carriers and generators to `network`.
    ///
    /// # Returns
    ///
    /// Names of the generators added, in insertion order.
    ///
    /// # Errors
    ///
    /// Fails if a carrier or generator name already exists.
    fn synthesize(&self, network: &mut Network) -> DispatchResult<Vec<String>>;
}

/// Shedding on every bus, one shared carrier.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElectricityOnly;

impl SheddingStrategy for ElectricityOnly {
    fn label(&self) -> &'static str {
        "electricity-only"
    }

    fn synthesize(&self, network: &mut Network) -> DispatchResult<Vec<String>> {
        network.add_carrier(LOAD_SHEDDING_CARRIER)?;
        let buses: Vec<String> = network.buses.iter().map(|b| b.name.clone()).collect();
        let mut added = Vec::with_capacity(buses.len());
        for bus in &buses {
            let generator = shedding_generator(bus, LOAD_SHEDDING_CARRIER);
            added.push(generator.name.clone());
            network.add_generator(generator)?;
        }
        Ok(added)
    }
}

/// Shedding on low-voltage (electrical) and heat buses only.
///
/// Buses of any other carrier, such as gas or hydrogen, get no shedding
/// generator: unmet demand there is not relaxable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectorCoupled;

impl SectorCoupled {
    fn buses_with_carrier(network: &Network, carrier: &str) -> Vec<String> {
        network
            .buses
            .iter()
            .filter(|b| b.carrier == carrier)
            .map(|b| b.name.clone())
            .collect()
    }
}

impl SheddingStrategy for SectorCoupled {
    fn label(&self) -> &'static str {
        "sector-coupled"
    }

    fn synthesize(&self, network: &mut Network) -> DispatchResult<Vec<String>> {
        network.add_carrier(LOAD_EL_CARRIER)?;
        network.add_carrier(LOAD_HEAT_CARRIER)?;

        let groups = std::iter::once((LOW_VOLTAGE, LOAD_EL_CARRIER)).chain(
            HEAT_BUS_CARRIERS
                .iter()
                .map(|&bus_carrier| (bus_carrier, LOAD_HEAT_CARRIER)),
        );

        let mut added = Vec::new();
        for (bus_carrier, shedding_carrier) in groups {
            let buses = Self::buses_with_carrier(network, bus_carrier);
            debug!(bus_carrier, count = buses.len(), "adding shedding generators");
            for bus in &buses {
                let generator = shedding_generator(bus, shedding_carrier);
                added.push(generator.name.clone());
                network.add_generator(generator)?;
            }
        }
        Ok(added)
    }
}

/// Returns `true` if any bus carrier mentions heat.
pub fn is_sector_coupled(network: &Network) -> bool {
    network.buses.iter().any(|b| b.carrier.contains("heat"))
}

/// Picks the shedding strategy matching the network's sectors.
pub fn select_strategy(network: &Network) -> Box<dyn SheddingStrategy> {
    if is_sector_coupled(network) {
        Box::new(SectorCoupled)
    } else {
        Box::new(ElectricityOnly)
    }
}

/// Detects the network type and adds load shedding accordingly.
///
/// # Errors
///
/// Propagates naming conflicts from the selected strategy.
pub fn add_load_shedding(network: &mut Network) -> DispatchResult<Vec<String>> {
    let strategy = select_strategy(network);
    let added = strategy.synthesize(network)?;
    info!(
        strategy = strategy.label(),
        generators = added.len(),
        "added load shedding"
    );
    Ok(added)
}
