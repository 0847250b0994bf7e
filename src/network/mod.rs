//! Energy-system network model: components, snapshots and time series.

pub mod capacity;
pub mod components;
pub mod io;

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

pub use capacity::fix_optimal_capacities;
pub use components::{
    Bus, Carrier, Component, Generator, GlobalConstraint, Line, Link, Load, StorageUnit, Store,
};

/// Per-component time series: component name to one value per snapshot.
pub type SeriesTable = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSeries {
    /// Availability factor per snapshot; overrides the static `p_max_pu`.
    pub p_max_pu: SeriesTable,
    /// Dispatch result (MW).
    pub p: SeriesTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSeries {
    pub p_set: SeriesTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageUnitSeries {
    /// Net output (dispatch minus store).
    pub p: SeriesTable,
    pub state_of_charge: SeriesTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSeries {
    pub p: SeriesTable,
    pub e: SeriesTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSeries {
    /// Withdrawal at `bus0`.
    pub p0: SeriesTable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSeries {
    /// Flow from `bus0` towards `bus1`.
    pub p0: SeriesTable,
}

/// The full energy-system model.
///
/// Loaded once, mutated in place by the pipeline stages and exported once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    pub snapshots: Vec<NaiveDateTime>,
    /// Hours represented by each snapshot (objective and storage weighting).
    pub snapshot_weightings: Vec<f64>,
    pub carriers: Vec<Carrier>,
    pub buses: Vec<Bus>,
    pub generators: Vec<Generator>,
    pub loads: Vec<Load>,
    pub storage_units: Vec<StorageUnit>,
    pub stores: Vec<Store>,
    pub links: Vec<Link>,
    pub lines: Vec<Line>,
    pub global_constraints: Vec<GlobalConstraint>,
    pub generators_t: GeneratorSeries,
    pub loads_t: LoadSeries,
    pub storage_units_t: StorageUnitSeries,
    pub stores_t: StoreSeries,
    pub links_t: LinkSeries,
    pub lines_t: LineSeries,
    /// Objective value of the last solve.
    pub objective: Option<f64>,
    /// Free-form run metadata attached before export.
    pub meta: serde_json::Value,
}

fn insert_unique<C: Component>(items: &mut Vec<C>, item: C) -> DispatchResult<()> {
    if items.iter().any(|c| c.name() == item.name()) {
        return Err(DispatchError::DuplicateComponent {
            kind: C::KIND,
            name: item.name().to_string(),
        });
    }
    items.push(item);
    Ok(())
}

/// Rejects the first name that appears twice among `items`.
fn ensure_unique_names<C: Component>(items: &[C]) -> DispatchResult<()> {
    let mut seen = HashSet::with_capacity(items.len());
    match items.iter().find(|c| !seen.insert(c.name())) {
        Some(dup) => Err(DispatchError::InvalidNetwork(format!(
            "{} name \"{}\" is used more than once",
            C::KIND,
            dup.name()
        ))),
        None => Ok(()),
    }
}

impl Network {
    /// Creates an empty network over `snapshots`, each weighted one hour.
    pub fn new(name: impl Into<String>, snapshots: Vec<NaiveDateTime>) -> Self {
        let snapshot_weightings = vec![1.0; snapshots.len()];
        Self {
            name: name.into(),
            snapshots,
            snapshot_weightings,
            ..Self::default()
        }
    }

    /// Number of snapshots in the optimization horizon.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Weighting (hours) of snapshot `t`; missing weightings count as one hour.
    pub fn snapshot_weighting(&self, t: usize) -> f64 {
        self.snapshot_weightings.get(t).copied().unwrap_or(1.0)
    }

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }

    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.name == name)
    }

    pub fn has_carrier(&self, name: &str) -> bool {
        self.carriers.iter().any(|c| c.name == name)
    }

    fn require_bus(&self, name: &str) -> DispatchResult<()> {
        if self.bus(name).is_none() {
            return Err(DispatchError::UnknownComponent {
                kind: Bus::KIND,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Adds a carrier.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateComponent`] if the carrier exists.
    pub fn add_carrier(&mut self, name: impl Into<String>) -> DispatchResult<()> {
        insert_unique(
            &mut self.carriers,
            Carrier {
                name: name.into(),
                ..Carrier::default()
            },
        )
    }

    pub fn add_bus(&mut self, bus: Bus) -> DispatchResult<()> {
        insert_unique(&mut self.buses, bus)
    }

    /// Adds a generator attached to an existing bus.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate generator name or an unknown bus.
    pub fn add_generator(&mut self, generator: Generator) -> DispatchResult<()> {
        self.require_bus(&generator.bus)?;
        insert_unique(&mut self.generators, generator)
    }

    pub fn add_load(&mut self, load: Load) -> DispatchResult<()> {
        self.require_bus(&load.bus)?;
        insert_unique(&mut self.loads, load)
    }

    pub fn add_storage_unit(&mut self, unit: StorageUnit) -> DispatchResult<()> {
        self.require_bus(&unit.bus)?;
        insert_unique(&mut self.storage_units, unit)
    }

    pub fn add_store(&mut self, store: Store) -> DispatchResult<()> {
        self.require_bus(&store.bus)?;
        insert_unique(&mut self.stores, store)
    }

    pub fn add_link(&mut self, link: Link) -> DispatchResult<()> {
        self.require_bus(&link.bus0)?;
        self.require_bus(&link.bus1)?;
        insert_unique(&mut self.links, link)
    }

    pub fn add_line(&mut self, line: Line) -> DispatchResult<()> {
        self.require_bus(&line.bus0)?;
        self.require_bus(&line.bus1)?;
        insert_unique(&mut self.lines, line)
    }

    /// Adds a global constraint, replacing any existing one of the same name.
    pub fn set_global_constraint(&mut self, constraint: GlobalConstraint) {
        self.global_constraints
            .retain(|c| c.name != constraint.name);
        self.global_constraints.push(constraint);
    }

    /// Availability of `generator` at snapshot `t`.
    pub fn p_max_pu(&self, generator: &Generator, t: usize) -> f64 {
        self.generators_t
            .p_max_pu
            .get(&generator.name)
            .and_then(|series| series.get(t))
            .copied()
            .unwrap_or(generator.p_max_pu)
    }

    /// Demand of `load` at snapshot `t`.
    pub fn p_set(&self, load: &Load, t: usize) -> f64 {
        self.loads_t
            .p_set
            .get(&load.name)
            .and_then(|series| series.get(t))
            .copied()
            .unwrap_or(load.p_set)
    }

    fn series_tables_mut(&mut self) -> [&mut SeriesTable; 9] {
        [
            &mut self.generators_t.p_max_pu,
            &mut self.generators_t.p,
            &mut self.loads_t.p_set,
            &mut self.storage_units_t.p,
            &mut self.storage_units_t.state_of_charge,
            &mut self.stores_t.p,
            &mut self.stores_t.e,
            &mut self.links_t.p0,
            &mut self.lines_t.p0,
        ]
    }

    /// Keeps only the first `n` snapshots, trimming weightings and every
    /// time series to match.
    pub fn truncate_snapshots(&mut self, n: usize) {
        self.snapshots.truncate(n);
        self.snapshot_weightings.truncate(n);
        for table in self.series_tables_mut() {
            for series in table.values_mut() {
                series.truncate(n);
            }
        }
    }

    /// Checks the structural consistency of a freshly loaded network.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidNetwork`] describing the first
    /// inconsistency found.
    pub fn validate(&self) -> DispatchResult<()> {
        let n = self.snapshots.len();
        if self.snapshot_weightings.len() != n {
            return Err(DispatchError::InvalidNetwork(format!(
                "{} snapshot weightings for {n} snapshots",
                self.snapshot_weightings.len()
            )));
        }
        if let Some(w) = self.snapshots.windows(2).find(|w| w[1] <= w[0]) {
            return Err(DispatchError::InvalidNetwork(format!(
                "snapshots must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }

        ensure_unique_names(&self.carriers)?;
        ensure_unique_names(&self.buses)?;
        ensure_unique_names(&self.generators)?;
        ensure_unique_names(&self.loads)?;
        ensure_unique_names(&self.storage_units)?;
        ensure_unique_names(&self.stores)?;
        ensure_unique_names(&self.links)?;
        ensure_unique_names(&self.lines)?;

        let bus_refs = self
            .generators
            .iter()
            .map(|g| (Generator::KIND, &g.name, &g.bus))
            .chain(self.loads.iter().map(|l| (Load::KIND, &l.name, &l.bus)))
            .chain(
                self.storage_units
                    .iter()
                    .map(|s| (StorageUnit::KIND, &s.name, &s.bus)),
            )
            .chain(self.stores.iter().map(|s| (Store::KIND, &s.name, &s.bus)))
            .chain(self.links.iter().flat_map(|l| {
                [(Link::KIND, &l.name, &l.bus0), (Link::KIND, &l.name, &l.bus1)]
            }))
            .chain(self.lines.iter().flat_map(|l| {
                [(Line::KIND, &l.name, &l.bus0), (Line::KIND, &l.name, &l.bus1)]
            }));
        for (kind, name, bus) in bus_refs {
            if self.bus(bus).is_none() {
                return Err(DispatchError::InvalidNetwork(format!(
                    "{kind} \"{name}\" is attached to unknown bus \"{bus}\""
                )));
            }
        }

        let inputs = [
            ("generators_t.p_max_pu", &self.generators_t.p_max_pu),
            ("loads_t.p_set", &self.loads_t.p_set),
        ];
        for (table_name, table) in inputs {
            if let Some((key, series)) = table.iter().find(|(_, s)| s.len() != n) {
                return Err(DispatchError::InvalidNetwork(format!(
                    "{table_name}[\"{key}\"] has {} values for {n} snapshots",
                    series.len()
                )));
            }
        }
        Ok(())
    }
}
