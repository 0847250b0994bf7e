//! Component records stored in a [`Network`](super::Network).
//!
//! Field names follow the usual energy-system modelling vocabulary
//! (`p_nom`, `p_max_pu`, `e_nom`, ...). Every record deserializes with
//! defaults so network files only need to spell out what differs.

use serde::{Deserialize, Serialize};

/// Anything stored in the network under a unique name.
pub trait Component {
    /// Component kind used in error messages (e.g. `"Generator"`).
    const KIND: &'static str;

    /// Unique name within its kind.
    fn name(&self) -> &str;
}

/// Energy carrier or technology label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Carrier {
    pub name: String,
    /// Specific emissions (t CO2 / MWh of primary energy).
    pub co2_emissions: f64,
}

/// Node at which supply and demand balance for one carrier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bus {
    pub name: String,
    pub carrier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    /// Nominal capacity (MW). Fixed unless `p_nom_extendable`.
    pub p_nom: f64,
    /// Capacity chosen by the previous optimization.
    pub p_nom_opt: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    /// Upper bound for extendable capacity; `None` means unbounded.
    pub p_nom_max: Option<f64>,
    pub p_min_pu: f64,
    /// Static availability, overridden per snapshot by `generators_t.p_max_pu`.
    pub p_max_pu: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_opt: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// Fixed demand at a bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// Static demand (MW), overridden per snapshot by `loads_t.p_set`.
    pub p_set: f64,
}

/// Storage with a power rating and a fixed energy-to-power ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageUnit {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_opt: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: Option<f64>,
    /// Energy capacity expressed in hours at full power.
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    /// State of charge (MWh) before the first snapshot.
    pub state_of_charge_initial: f64,
    pub cyclic_state_of_charge: bool,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_opt: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            state_of_charge_initial: 0.0,
            cyclic_state_of_charge: false,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// Energy store with independent energy capacity.
///
/// Positive `p` withdraws energy from the store and injects it at the bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub e_nom: f64,
    pub e_nom_opt: f64,
    pub e_nom_extendable: bool,
    pub e_nom_min: f64,
    pub e_nom_max: Option<f64>,
    pub e_initial: f64,
    pub e_cyclic: bool,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

/// Controllable directed flow from `bus0` to `bus1` with conversion losses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_opt: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: Option<f64>,
    pub efficiency: f64,
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_opt: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: None,
            efficiency: 1.0,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// Transmission line, modelled as a bidirectional transport capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub s_nom: f64,
    pub s_nom_opt: f64,
    pub s_nom_extendable: bool,
    pub s_nom_min: f64,
    pub s_nom_max: Option<f64>,
    pub s_max_pu: f64,
    pub capital_cost: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            s_nom: 0.0,
            s_nom_opt: 0.0,
            s_nom_extendable: false,
            s_nom_min: 0.0,
            s_nom_max: None,
            s_max_pu: 1.0,
            capital_cost: 0.0,
        }
    }
}

/// Network-wide linear limit.
///
/// Only `operational_limit` constraints are enforced by the dispatch model:
/// the summed final energy level of stores whose carrier equals
/// `carrier_attribute` is bounded by `constant`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConstraint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub carrier_attribute: String,
    pub sense: String,
    pub constant: f64,
}

macro_rules! impl_component {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl Component for $ty {
                const KIND: &'static str = $kind;

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_component! {
    Carrier => "Carrier",
    Bus => "Bus",
    Generator => "Generator",
    Load => "Load",
    StorageUnit => "StorageUnit",
    Store => "Store",
    Link => "Link",
    Line => "Line",
    GlobalConstraint => "GlobalConstraint",
}
