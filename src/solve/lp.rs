//! Linear dispatch model over one window of snapshots.
//!
//! Every component contributes variables per snapshot; capacities are
//! constants unless the component is extendable, in which case the
//! capacity becomes a variable priced at its capital cost.

use std::collections::HashMap;
use std::ops::Range;

use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable, constraint,
    variable, variables,
};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};
use crate::network::{Network, SeriesTable};

/// Global constraint type enforced on final store energy levels.
pub const OPERATIONAL_LIMIT: &str = "operational_limit";

/// Cost per unit of extendable capacity added to the LP (not the reported
/// objective) so that zero-cost capacity settles at its binding level.
const CAPACITY_REGULARIZATION: f64 = 1e-6;

/// Storage levels entering a window.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    /// State of charge per storage unit, in network order.
    pub state_of_charge: Vec<f64>,
    /// Energy level per store, in network order.
    pub energy: Vec<f64>,
    /// Honour `cyclic_state_of_charge` / `e_cyclic` in this window.
    pub cyclic: bool,
}

impl InitialState {
    /// Initial levels as declared on the components, cyclic conditions on.
    pub fn from_network(network: &Network) -> Self {
        Self {
            state_of_charge: network
                .storage_units
                .iter()
                .map(|s| s.state_of_charge_initial)
                .collect(),
            energy: network.stores.iter().map(|s| s.e_initial).collect(),
            cyclic: true,
        }
    }

    /// Levels at snapshot `t` taken from earlier results; cyclic conditions off.
    pub fn from_results(network: &Network, t: usize) -> Self {
        let level = |table: &SeriesTable, name: &str, fallback: f64| {
            table
                .get(name)
                .and_then(|s| s.get(t))
                .copied()
                .unwrap_or(fallback)
        };
        Self {
            state_of_charge: network
                .storage_units
                .iter()
                .map(|s| {
                    level(
                        &network.storage_units_t.state_of_charge,
                        &s.name,
                        s.state_of_charge_initial,
                    )
                })
                .collect(),
            energy: network
                .stores
                .iter()
                .map(|s| level(&network.stores_t.e, &s.name, s.e_initial))
                .collect(),
            cyclic: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Capacity {
    Fixed(f64),
    Extendable(Variable),
}

impl Capacity {
    fn value(&self, solution: &impl Solution) -> f64 {
        match self {
            Capacity::Fixed(v) => *v,
            Capacity::Extendable(var) => solution.value(*var),
        }
    }
}

/// Solved values for one window, indexed `[component][snapshot in window]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSolution {
    pub range: Range<usize>,
    pub generator_p: Vec<Vec<f64>>,
    pub generator_capacity: Vec<f64>,
    pub storage_p: Vec<Vec<f64>>,
    pub storage_soc: Vec<Vec<f64>>,
    pub storage_capacity: Vec<f64>,
    pub store_p: Vec<Vec<f64>>,
    pub store_e: Vec<Vec<f64>>,
    pub store_capacity: Vec<f64>,
    pub link_p0: Vec<Vec<f64>>,
    pub link_capacity: Vec<f64>,
    pub line_p0: Vec<Vec<f64>>,
    pub line_capacity: Vec<f64>,
    /// Weighted operating cost plus capital cost of extendable capacity.
    pub objective: f64,
}

struct Model {
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
}

impl Model {
    fn capacity(
        &mut self,
        extendable: bool,
        nominal: f64,
        min: f64,
        max: Option<f64>,
        capital_cost: f64,
    ) -> Capacity {
        if !extendable {
            return Capacity::Fixed(nominal);
        }
        let mut def = variable().min(min);
        if let Some(max) = max.filter(|m| m.is_finite()) {
            def = def.max(max);
        }
        let cap = self.vars.add(def);
        self.objective += (capital_cost + CAPACITY_REGULARIZATION) * cap;
        Capacity::Extendable(cap)
    }

    /// Variable confined to `[lo·cap, hi·cap]`.
    fn scaled(&mut self, cap: Capacity, lo: f64, hi: f64) -> Variable {
        match cap {
            Capacity::Fixed(p) => self.vars.add(variable().min(lo * p).max(hi * p)),
            Capacity::Extendable(c) => {
                let v = self.vars.add(variable());
                self.constraints.push(constraint!(v - hi * c <= 0.0));
                self.constraints.push(constraint!(v - lo * c >= 0.0));
                v
            }
        }
    }
}

/// Builds and solves the dispatch LP for snapshots in `range`.
///
/// # Arguments
///
/// * `network` - Network whose capacities, costs and series define the model
/// * `range` - Snapshot indices forming the window
/// * `initial` - Storage levels before the first snapshot of the window
///
/// # Errors
///
/// Returns [`DispatchError::Solver`] if the solver fails or reports the
/// problem infeasible, and [`DispatchError::InvalidNetwork`] for an
/// unsupported global constraint sense or an empty window.
pub fn solve_window(
    network: &Network,
    range: Range<usize>,
    initial: &InitialState,
) -> DispatchResult<WindowSolution> {
    if range.is_empty() || range.end > network.snapshot_count() {
        return Err(DispatchError::InvalidNetwork(format!(
            "window {}..{} is empty or exceeds {} snapshots",
            range.start,
            range.end,
            network.snapshot_count()
        )));
    }
    let steps = range.len();
    let weights: Vec<f64> = range.clone().map(|t| network.snapshot_weighting(t)).collect();

    let bus_index: HashMap<&str, usize> = network
        .buses
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name.as_str(), i))
        .collect();
    let bus_of = |name: &str| -> DispatchResult<usize> {
        bus_index.get(name).copied().ok_or_else(|| DispatchError::UnknownComponent {
            kind: "Bus",
            name: name.to_string(),
        })
    };
    let mut balance: Vec<Vec<Expression>> =
        vec![vec![Expression::from(0.0); steps]; network.buses.len()];
    let mut touched = vec![false; network.buses.len()];

    let mut model = Model {
        vars: variables!(),
        objective: Expression::from(0.0),
        constraints: Vec::new(),
    };

    // Generators
    let mut gen_caps = Vec::with_capacity(network.generators.len());
    let mut gen_p = Vec::with_capacity(network.generators.len());
    for g in &network.generators {
        let b = bus_of(&g.bus)?;
        touched[b] = true;
        let cap = model.capacity(
            g.p_nom_extendable,
            g.p_nom,
            g.p_nom_min,
            g.p_nom_max,
            g.capital_cost,
        );
        let mut p = Vec::with_capacity(steps);
        for (k, t) in range.clone().enumerate() {
            let v = model.scaled(cap, g.p_min_pu, network.p_max_pu(g, t));
            model.objective += weights[k] * g.marginal_cost * v;
            balance[b][k] += v;
            p.push(v);
        }
        gen_caps.push(cap);
        gen_p.push(p);
    }

    // Storage units
    let mut su_caps = Vec::with_capacity(network.storage_units.len());
    let mut su_vars = Vec::with_capacity(network.storage_units.len());
    for (i, s) in network.storage_units.iter().enumerate() {
        let b = bus_of(&s.bus)?;
        touched[b] = true;
        let cap = model.capacity(
            s.p_nom_extendable,
            s.p_nom,
            s.p_nom_min,
            s.p_nom_max,
            s.capital_cost,
        );
        let mut dispatch = Vec::with_capacity(steps);
        let mut store = Vec::with_capacity(steps);
        let mut soc = Vec::with_capacity(steps);
        for k in 0..steps {
            let d = model.scaled(cap, 0.0, 1.0);
            let c = model.scaled(cap, 0.0, 1.0);
            let e = model.scaled(cap, 0.0, s.max_hours);
            model.objective += weights[k] * s.marginal_cost * d;
            balance[b][k] += d;
            balance[b][k] -= c;
            dispatch.push(d);
            store.push(c);
            soc.push(e);
        }
        for k in 0..steps {
            let previous = match k {
                0 if initial.cyclic && s.cyclic_state_of_charge => Expression::from(soc[steps - 1]),
                0 => Expression::from(initial.state_of_charge[i]),
                _ => Expression::from(soc[k - 1]),
            };
            let net = s.efficiency_store * store[k] - (1.0 / s.efficiency_dispatch) * dispatch[k];
            let (level, w) = (soc[k], weights[k]);
            model
                .constraints
                .push(constraint!(level - previous - w * net == 0.0));
        }
        su_caps.push(cap);
        su_vars.push((dispatch, store, soc));
    }

    // Stores
    let mut st_caps = Vec::with_capacity(network.stores.len());
    let mut st_vars = Vec::with_capacity(network.stores.len());
    for (i, s) in network.stores.iter().enumerate() {
        let b = bus_of(&s.bus)?;
        touched[b] = true;
        let cap = model.capacity(
            s.e_nom_extendable,
            s.e_nom,
            s.e_nom_min,
            s.e_nom_max,
            s.capital_cost,
        );
        let mut p = Vec::with_capacity(steps);
        let mut e = Vec::with_capacity(steps);
        for k in 0..steps {
            let pk = model.vars.add(variable());
            let ek = model.scaled(cap, 0.0, 1.0);
            model.objective += weights[k] * s.marginal_cost * pk;
            balance[b][k] += pk;
            p.push(pk);
            e.push(ek);
        }
        for k in 0..steps {
            let previous = match k {
                0 if initial.cyclic && s.e_cyclic => Expression::from(e[steps - 1]),
                0 => Expression::from(initial.energy[i]),
                _ => Expression::from(e[k - 1]),
            };
            let (level, flow, w) = (e[k], p[k], weights[k]);
            model
                .constraints
                .push(constraint!(level - previous + w * flow == 0.0));
        }
        st_caps.push(cap);
        st_vars.push((p, e));
    }

    // Links
    let mut link_caps = Vec::with_capacity(network.links.len());
    let mut link_p = Vec::with_capacity(network.links.len());
    for l in &network.links {
        let (b0, b1) = (bus_of(&l.bus0)?, bus_of(&l.bus1)?);
        touched[b0] = true;
        touched[b1] = true;
        let cap = model.capacity(
            l.p_nom_extendable,
            l.p_nom,
            l.p_nom_min,
            l.p_nom_max,
            l.capital_cost,
        );
        let mut p = Vec::with_capacity(steps);
        for k in 0..steps {
            let v = model.scaled(cap, l.p_min_pu, l.p_max_pu);
            model.objective += weights[k] * l.marginal_cost * v;
            balance[b0][k] -= v;
            balance[b1][k] += l.efficiency * v;
            p.push(v);
        }
        link_caps.push(cap);
        link_p.push(p);
    }

    // Lines
    let mut line_caps = Vec::with_capacity(network.lines.len());
    let mut line_p = Vec::with_capacity(network.lines.len());
    for l in &network.lines {
        let (b0, b1) = (bus_of(&l.bus0)?, bus_of(&l.bus1)?);
        touched[b0] = true;
        touched[b1] = true;
        let cap = model.capacity(
            l.s_nom_extendable,
            l.s_nom,
            l.s_nom_min,
            l.s_nom_max,
            l.capital_cost,
        );
        let mut p = Vec::with_capacity(steps);
        for k in 0..steps {
            let v = model.scaled(cap, -l.s_max_pu, l.s_max_pu);
            balance[b0][k] -= v;
            balance[b1][k] += v;
            p.push(v);
        }
        line_caps.push(cap);
        line_p.push(p);
    }

    // Demand
    let mut demand = vec![vec![0.0; steps]; network.buses.len()];
    for load in &network.loads {
        let b = bus_of(&load.bus)?;
        for (k, t) in range.clone().enumerate() {
            demand[b][k] += network.p_set(load, t);
        }
    }

    let Model {
        vars,
        objective,
        mut constraints,
    } = model;

    for (b, per_step) in balance.into_iter().enumerate() {
        for (k, supply) in per_step.into_iter().enumerate() {
            let load = demand[b][k];
            if !touched[b] && load == 0.0 {
                continue;
            }
            constraints.push(constraint!(supply == load));
        }
    }

    for gc in &network.global_constraints {
        if gc.kind != OPERATIONAL_LIMIT {
            debug!(name = %gc.name, kind = %gc.kind, "global constraint type not modelled, skipped");
            continue;
        }
        let mut total = Expression::from(0.0);
        let mut matched = 0;
        for (s, (_, e)) in network.stores.iter().zip(&st_vars) {
            if s.carrier == gc.carrier_attribute {
                total += e[steps - 1];
                matched += 1;
            }
        }
        if matched == 0 {
            debug!(name = %gc.name, carrier = %gc.carrier_attribute, "no stores match global constraint");
            continue;
        }
        let limit = gc.constant;
        let c = match gc.sense.as_str() {
            "<=" => constraint!(total <= limit),
            ">=" => constraint!(total >= limit),
            "==" => constraint!(total == limit),
            other => {
                return Err(DispatchError::InvalidNetwork(format!(
                    "global constraint \"{}\" has unsupported sense \"{other}\"",
                    gc.name
                )));
            }
        };
        constraints.push(c);
    }

    debug!(
        window_start = range.start,
        window_end = range.end,
        constraints = constraints.len(),
        "solving dispatch window"
    );

    let mut problem = vars.minimise(objective).using(clarabel);
    for c in constraints {
        problem = problem.with(c);
    }
    let solution = problem.solve().map_err(|e| {
        DispatchError::Solver(format!(
            "clarabel failed on snapshots {}..{}: {e}",
            range.start, range.end
        ))
    })?;

    let values = |vars: &Vec<Variable>| -> Vec<f64> { vars.iter().map(|v| solution.value(*v)).collect() };
    let caps = |caps: &Vec<Capacity>| -> Vec<f64> { caps.iter().map(|c| c.value(&solution)).collect() };

    let mut out = WindowSolution {
        range: range.clone(),
        generator_p: gen_p.iter().map(|p| values(p)).collect(),
        generator_capacity: caps(&gen_caps),
        storage_p: su_vars
            .iter()
            .map(|(d, c, _)| {
                values(d)
                    .into_iter()
                    .zip(values(c))
                    .map(|(d, c)| d - c)
                    .collect()
            })
            .collect(),
        storage_soc: su_vars.iter().map(|(_, _, e)| values(e)).collect(),
        storage_capacity: caps(&su_caps),
        store_p: st_vars.iter().map(|(p, _)| values(p)).collect(),
        store_e: st_vars.iter().map(|(_, e)| values(e)).collect(),
        store_capacity: caps(&st_caps),
        link_p0: link_p.iter().map(|p| values(p)).collect(),
        link_capacity: caps(&link_caps),
        line_p0: line_p.iter().map(|p| values(p)).collect(),
        line_capacity: caps(&line_caps),
        objective: 0.0,
    };
    out.objective = operating_cost(network, &out, &weights, &su_vars, &solution);
    Ok(out)
}

type StorageVars = (Vec<Variable>, Vec<Variable>, Vec<Variable>);

fn operating_cost(
    network: &Network,
    out: &WindowSolution,
    weights: &[f64],
    su_vars: &[StorageVars],
    solution: &impl Solution,
) -> f64 {
    let weighted = |cost: f64, series: &[f64]| -> f64 {
        cost * series.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>()
    };
    let mut total = 0.0;
    for (g, (p, cap)) in network
        .generators
        .iter()
        .zip(out.generator_p.iter().zip(&out.generator_capacity))
    {
        total += weighted(g.marginal_cost, p);
        if g.p_nom_extendable {
            total += g.capital_cost * cap;
        }
    }
    for (s, ((dispatch, _, _), cap)) in network
        .storage_units
        .iter()
        .zip(su_vars.iter().zip(&out.storage_capacity))
    {
        let d: Vec<f64> = dispatch.iter().map(|v| solution.value(*v)).collect();
        total += weighted(s.marginal_cost, &d);
        if s.p_nom_extendable {
            total += s.capital_cost * cap;
        }
    }
    for (s, (p, cap)) in network
        .stores
        .iter()
        .zip(out.store_p.iter().zip(&out.store_capacity))
    {
        total += weighted(s.marginal_cost, p);
        if s.e_nom_extendable {
            total += s.capital_cost * cap;
        }
    }
    for (l, (p, cap)) in network
        .links
        .iter()
        .zip(out.link_p0.iter().zip(&out.link_capacity))
    {
        total += weighted(l.marginal_cost, p);
        if l.p_nom_extendable {
            total += l.capital_cost * cap;
        }
    }
    for (l, cap) in network.lines.iter().zip(&out.line_capacity) {
        if l.s_nom_extendable {
            total += l.capital_cost * cap;
        }
    }
    total
}

fn write_series(
    table: &mut SeriesTable,
    name: &str,
    len: usize,
    range: &Range<usize>,
    values: &[f64],
) {
    let series = table
        .entry(name.to_string())
        .or_insert_with(|| vec![0.0; len]);
    series.resize(len, 0.0);
    series[range.clone()].copy_from_slice(values);
}

impl WindowSolution {
    /// Writes the window's dispatch into the network series and records
    /// optimal capacities.
    ///
    /// With `merge_capacity` the optimal capacity of extendable components
    /// becomes the larger of the stored and the solved value, so that a
    /// sequence of windows reports the capacity needed by any of them.
    pub fn write_back(&self, network: &mut Network, merge_capacity: bool) {
        let len = network.snapshot_count();
        let r = &self.range;
        let merge = |old: f64, new: f64| if merge_capacity { old.max(new) } else { new };

        for (i, g) in network.generators.iter_mut().enumerate() {
            write_series(&mut network.generators_t.p, &g.name, len, r, &self.generator_p[i]);
            g.p_nom_opt = if g.p_nom_extendable {
                merge(g.p_nom_opt, self.generator_capacity[i])
            } else {
                g.p_nom
            };
        }
        for (i, s) in network.storage_units.iter_mut().enumerate() {
            write_series(&mut network.storage_units_t.p, &s.name, len, r, &self.storage_p[i]);
            write_series(
                &mut network.storage_units_t.state_of_charge,
                &s.name,
                len,
                r,
                &self.storage_soc[i],
            );
            s.p_nom_opt = if s.p_nom_extendable {
                merge(s.p_nom_opt, self.storage_capacity[i])
            } else {
                s.p_nom
            };
        }
        for (i, s) in network.stores.iter_mut().enumerate() {
            write_series(&mut network.stores_t.p, &s.name, len, r, &self.store_p[i]);
            write_series(&mut network.stores_t.e, &s.name, len, r, &self.store_e[i]);
            s.e_nom_opt = if s.e_nom_extendable {
                merge(s.e_nom_opt, self.store_capacity[i])
            } else {
                s.e_nom
            };
        }
        for (i, l) in network.links.iter_mut().enumerate() {
            write_series(&mut network.links_t.p0, &l.name, len, r, &self.link_p0[i]);
            l.p_nom_opt = if l.p_nom_extendable {
                merge(l.p_nom_opt, self.link_capacity[i])
            } else {
                l.p_nom
            };
        }
        for (i, l) in network.lines.iter_mut().enumerate() {
            write_series(&mut network.lines_t.p0, &l.name, len, r, &self.line_p0[i]);
            l.s_nom_opt = if l.s_nom_extendable {
                merge(l.s_nom_opt, self.line_capacity[i])
            } else {
                l.s_nom
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Bus, Generator, Line, Link, Load, StorageUnit, Store};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    const TOL: f64 = 1e-3;

    fn hours(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2013, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("date");
        (0..n).map(|h| start + Duration::hours(h as i64)).collect()
    }

    fn bus(n: &mut Network, name: &str) {
        n.add_bus(Bus {
            name: name.into(),
            carrier: "AC".into(),
        })
        .expect("bus");
    }

    fn load(n: &mut Network, bus: &str, p: f64) {
        n.add_load(Load {
            name: format!("{bus} load"),
            bus: bus.into(),
            p_set: p,
        })
        .expect("load");
    }

    fn generator(n: &mut Network, name: &str, bus: &str, p_nom: f64, cost: f64) {
        n.add_generator(Generator {
            name: name.into(),
            bus: bus.into(),
            p_nom,
            marginal_cost: cost,
            ..Generator::default()
        })
        .expect("gen");
    }

    #[test]
    fn merit_order_dispatch() {
        let mut n = Network::new("n", hours(2));
        bus(&mut n, "b");
        load(&mut n, "b", 8.0);
        generator(&mut n, "cheap", "b", 5.0, 10.0);
        generator(&mut n, "dear", "b", 10.0, 50.0);
        let s = solve_window(&n, 0..2, &InitialState::from_network(&n)).expect("solve");
        for k in 0..2 {
            assert!((s.generator_p[0][k] - 5.0).abs() < TOL);
            assert!((s.generator_p[1][k] - 3.0).abs() < TOL);
        }
        assert!((s.objective - 2.0 * (5.0 * 10.0 + 3.0 * 50.0)).abs() < 1e-2);
    }

    #[test]
    fn time_varying_availability_is_respected() {
        let mut n = Network::new("n", hours(2));
        bus(&mut n, "b");
        load(&mut n, "b", 4.0);
        generator(&mut n, "wind", "b", 10.0, 0.0);
        generator(&mut n, "gas", "b", 10.0, 30.0);
        n.generators_t.p_max_pu.insert("wind".into(), vec![0.1, 0.3]);
        let s = solve_window(&n, 0..2, &InitialState::from_network(&n)).expect("solve");
        assert!((s.generator_p[0][0] - 1.0).abs() < TOL);
        assert!((s.generator_p[0][1] - 3.0).abs() < TOL);
        assert!((s.generator_p[1][0] - 3.0).abs() < TOL);
    }

    #[test]
    fn line_carries_cheap_power_up_to_its_rating() {
        let mut n = Network::new("n", hours(1));
        bus(&mut n, "b1");
        bus(&mut n, "b2");
        load(&mut n, "b2", 6.0);
        generator(&mut n, "cheap", "b1", 10.0, 1.0);
        generator(&mut n, "dear", "b2", 10.0, 100.0);
        n.add_line(Line {
            name: "l".into(),
            bus0: "b1".into(),
            bus1: "b2".into(),
            s_nom: 4.0,
            ..Line::default()
        })
        .expect("line");
        let s = solve_window(&n, 0..1, &InitialState::from_network(&n)).expect("solve");
        assert!((s.line_p0[0][0] - 4.0).abs() < TOL);
        assert!((s.generator_p[1][0] - 2.0).abs() < TOL);
    }

    #[test]
    fn link_applies_efficiency() {
        let mut n = Network::new("n", hours(1));
        bus(&mut n, "gas");
        bus(&mut n, "el");
        load(&mut n, "el", 5.0);
        generator(&mut n, "well", "gas", 100.0, 20.0);
        n.add_link(Link {
            name: "ocgt".into(),
            bus0: "gas".into(),
            bus1: "el".into(),
            p_nom: 100.0,
            efficiency: 0.5,
            ..Link::default()
        })
        .expect("link");
        let s = solve_window(&n, 0..1, &InitialState::from_network(&n)).expect("solve");
        assert!((s.link_p0[0][0] - 10.0).abs() < TOL);
        assert!((s.generator_p[0][0] - 10.0).abs() < TOL);
    }

    #[test]
    fn storage_shifts_cheap_energy() {
        let mut n = Network::new("n", hours(2));
        bus(&mut n, "b");
        load(&mut n, "b", 2.0);
        generator(&mut n, "gen", "b", 10.0, 10.0);
        n.generators_t.p_max_pu.insert("gen".into(), vec![1.0, 0.0]);
        n.add_storage_unit(StorageUnit {
            name: "battery".into(),
            bus: "b".into(),
            p_nom: 5.0,
            max_hours: 2.0,
            ..StorageUnit::default()
        })
        .expect("storage");
        let s = solve_window(&n, 0..2, &InitialState::from_network(&n)).expect("solve");
        assert!((s.storage_p[0][0] + 2.0).abs() < TOL);
        assert!((s.storage_p[0][1] - 2.0).abs() < TOL);
        assert!((s.storage_soc[0][0] - 2.0).abs() < TOL);
    }

    #[test]
    fn store_limit_caps_final_level() {
        let mut n = Network::new("n", hours(1));
        bus(&mut n, "co2");
        n.add_store(Store {
            name: "sink".into(),
            bus: "co2".into(),
            carrier: "co2 sequestered".into(),
            e_nom: 100.0,
            marginal_cost: 1.0,
            ..Store::default()
        })
        .expect("store");
        generator(&mut n, "capture", "co2", 100.0, 0.0);
        n.set_global_constraint(crate::network::GlobalConstraint {
            name: "co2_sequestration_limit".into(),
            kind: OPERATIONAL_LIMIT.into(),
            carrier_attribute: "co2 sequestered".into(),
            sense: "<=".into(),
            constant: 30.0,
        });
        let s = solve_window(&n, 0..1, &InitialState::from_network(&n)).expect("solve");
        assert!(s.store_e[0][0] <= 30.0 + TOL);
        assert!((s.store_e[0][0] - 30.0).abs() < 1e-2);
    }

    #[test]
    fn unknown_constraint_sense_is_rejected() {
        let mut n = Network::new("n", hours(1));
        bus(&mut n, "b");
        n.add_store(Store {
            name: "s".into(),
            bus: "b".into(),
            carrier: "x".into(),
            ..Store::default()
        })
        .expect("store");
        n.set_global_constraint(crate::network::GlobalConstraint {
            name: "g".into(),
            kind: OPERATIONAL_LIMIT.into(),
            carrier_attribute: "x".into(),
            sense: "<>".into(),
            constant: 0.0,
        });
        let err = solve_window(&n, 0..1, &InitialState::from_network(&n));
        assert!(matches!(err, Err(DispatchError::InvalidNetwork(_))));
    }

    #[test]
    fn infeasible_window_is_a_solver_error() {
        let mut n = Network::new("n", hours(1));
        bus(&mut n, "b");
        load(&mut n, "b", 10.0);
        generator(&mut n, "small", "b", 1.0, 0.0);
        let err = solve_window(&n, 0..1, &InitialState::from_network(&n));
        assert!(matches!(err, Err(DispatchError::Solver(_))));
    }

    #[test]
    fn empty_window_rejected() {
        let n = Network::new("n", hours(2));
        assert!(solve_window(&n, 1..1, &InitialState::from_network(&n)).is_err());
        assert!(solve_window(&n, 0..3, &InitialState::from_network(&n)).is_err());
    }

    #[test]
    fn write_back_fills_series_and_capacity() {
        let mut n = Network::new("n", hours(2));
        bus(&mut n, "b");
        load(&mut n, "b", 3.0);
        n.add_generator(Generator {
            name: "ext".into(),
            bus: "b".into(),
            p_nom_extendable: true,
            marginal_cost: 1.0,
            capital_cost: 5.0,
            ..Generator::default()
        })
        .expect("gen");
        let s = solve_window(&n, 1..2, &InitialState::from_network(&n)).expect("solve");
        s.write_back(&mut n, false);
        let p = &n.generators_t.p["ext"];
        assert_eq!(p.len(), 2);
        assert_eq!(p[0], 0.0);
        assert!((p[1] - 3.0).abs() < TOL);
        assert!((n.generators[0].p_nom_opt - 3.0).abs() < 1e-2);
    }
}
