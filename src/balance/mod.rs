//! Line balancing over a precedence graph.
//!
//! `balance` assigns every task to one of a fixed number of stations so that
//! no precedence edge points backwards and the per-station load under the
//! chosen objective is as even as the heuristic can make it:
//!
//! 1. order tasks topologically, heavier tasks first among the ready ones
//! 2. build an initial assignment (least-loaded or sequential fill)
//! 3. improve it with adjacent-station moves and swaps

mod construct;
mod improve;
pub mod station;

pub use station::{BalanceResult, Station, StationAssignment};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{PrecedenceGraph, TaskId, TaskMetrics, TaskTable};
use crate::{lblog_debug, lblog_warn, Error, Result};

pub(crate) const EPS: f64 = 1e-9;

/// What the balancer evens out across stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    #[default]
    CycleTime,
    Metabolic,
    /// Weighted sum of normalized cycle time and metabolic cost.
    Both,
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::CycleTime => write!(f, "CYCLE_TIME"),
            Objective::Metabolic => write!(f, "METABOLIC"),
            Objective::Both => write!(f, "BOTH"),
        }
    }
}

impl std::str::FromStr for Objective {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cycle_time" | "time" => Ok(Objective::CycleTime),
            "metabolic" | "metabolic_cost" => Ok(Objective::Metabolic),
            "both" => Ok(Objective::Both),
            _ => Err(Error::invalid_input(
                "objective",
                format!("expected CYCLE_TIME, METABOLIC or BOTH, got {:?}", s),
            )),
        }
    }
}

/// How the initial assignment is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Construction {
    /// Each task goes to the lightest station its predecessors allow.
    #[default]
    LeastLoaded,
    /// Stations are filled one after another up to the average load.
    Sequential,
}

impl std::fmt::Display for Construction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Construction::LeastLoaded => write!(f, "least-loaded"),
            Construction::Sequential => write!(f, "sequential"),
        }
    }
}

impl std::str::FromStr for Construction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "least-loaded" => Ok(Construction::LeastLoaded),
            "sequential" => Ok(Construction::Sequential),
            _ => Err(Error::invalid_input(
                "construction",
                format!("expected least-loaded or sequential, got {:?}", s),
            )),
        }
    }
}

/// Weights of the two metrics when balancing `Objective::Both`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub cycle_time: f64,
    pub metabolic_cost: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            cycle_time: 2.0,
            metabolic_cost: 1.0,
        }
    }
}

/// Tuning knobs for `balance`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceOptions {
    pub objective: Objective,
    /// Minimum imbalance reduction an improvement move must achieve.
    pub threshold: f64,
    pub weights: Weights,
    /// Cap on improvement moves.
    pub max_iterations: usize,
    /// Predecessors must sit on a strictly earlier station.
    pub strict_precedence: bool,
    pub construction: Construction,
    /// Percentage over the average load a sequentially filled station may
    /// reach with one extra task.
    pub overshoot: f64,
}

impl Default for BalanceOptions {
    fn default() -> Self {
        Self {
            objective: Objective::CycleTime,
            threshold: 0.0,
            weights: Weights::default(),
            max_iterations: 1000,
            strict_precedence: false,
            construction: Construction::LeastLoaded,
            overshoot: 10.0,
        }
    }
}

impl BalanceOptions {
    pub fn with_objective(objective: Objective) -> Self {
        Self {
            objective,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("threshold", self.threshold),
            ("w_cost_time", self.weights.cycle_time),
            ("w_cost_metabolic", self.weights.metabolic_cost),
            ("overshoot", self.overshoot),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_input(
                    name,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }
        if self.objective == Objective::Both
            && self.weights.cycle_time + self.weights.metabolic_cost <= 0.0
        {
            return Err(Error::invalid_input(
                "weights",
                "at least one weight must be positive when balancing BOTH",
            ));
        }
        Ok(())
    }
}

/// Dense, index-based view of the balancing input.
///
/// Graph tasks keep their node index; tasks only present in the table are
/// appended after them in id order.
pub(crate) struct Problem {
    pub ids: Vec<TaskId>,
    pub metrics: Vec<TaskMetrics>,
    /// Per-task weight under the objective.
    pub weight: Vec<f64>,
    pub preds: Vec<Vec<usize>>,
    pub succs: Vec<Vec<usize>>,
    /// Length of the longest successor chain hanging off each task.
    pub tail: Vec<usize>,
    /// Number of tasks on the longest precedence chain.
    pub longest_chain: usize,
    pub num_stations: usize,
    pub strict: bool,
}

impl Problem {
    fn build(
        graph: &PrecedenceGraph,
        tasks: &TaskTable,
        num_stations: usize,
        options: &BalanceOptions,
    ) -> Result<Self> {
        let mut ids: Vec<TaskId> = graph.task_ids().into_iter().cloned().collect();
        let mut metrics = Vec::with_capacity(tasks.len());
        for id in &ids {
            let m = tasks.get(id).ok_or_else(|| {
                Error::invalid_input(id.to_string(), "task appears in the precedence graph but has no data record")
            })?;
            metrics.push(*m);
        }
        for (id, m) in tasks {
            if !graph.contains_task(id) {
                lblog_warn!("Task {} has no precedence constraints", id);
                ids.push(id.clone());
                metrics.push(*m);
            }
        }
        for (id, m) in ids.iter().zip(&metrics) {
            m.validate(id)?;
        }

        let n = ids.len();
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        let g = graph.graph();
        for edge in g.edge_indices() {
            if let Some((a, b)) = g.edge_endpoints(edge) {
                preds[b.index()].push(a.index());
                succs[a.index()].push(b.index());
            }
        }

        let weight = objective_weights(&metrics, options.objective, options.weights);
        // Unconstrained tasks are chains of one.
        let longest_chain = graph.longest_chain()?.max(usize::from(n > 0));

        Ok(Self {
            ids,
            metrics,
            weight,
            preds,
            succs,
            tail: vec![0; n],
            longest_chain,
            num_stations,
            strict: options.strict_precedence,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Topological order taking the heaviest ready task first, ties by index.
    fn priority_order(&self) -> Vec<usize> {
        #[derive(PartialEq)]
        struct Ready {
            weight: f64,
            index: usize,
        }
        impl Eq for Ready {}
        impl Ord for Ready {
            fn cmp(&self, other: &Self) -> Ordering {
                self.weight
                    .total_cmp(&other.weight)
                    .then_with(|| other.index.cmp(&self.index))
            }
        }
        impl PartialOrd for Ready {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut indegree: Vec<usize> = self.preds.iter().map(Vec::len).collect();
        let mut heap: BinaryHeap<Ready> = (0..self.len())
            .filter(|&t| indegree[t] == 0)
            .map(|index| Ready {
                weight: self.weight[index],
                index,
            })
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Ready { index, .. }) = heap.pop() {
            order.push(index);
            for &s in &self.succs[index] {
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    heap.push(Ready {
                        weight: self.weight[s],
                        index: s,
                    });
                }
            }
        }
        order
    }

    fn compute_tails(&mut self, order: &[usize]) {
        for &t in order.iter().rev() {
            self.tail[t] = self.succs[t]
                .iter()
                .map(|&s| self.tail[s] + 1)
                .max()
                .unwrap_or(0);
        }
    }

    /// Earliest station `task` may take given where its predecessors are.
    /// Unplaced predecessors are ignored.
    pub fn lower_bound(&self, task: usize, station_of: &[Option<usize>]) -> usize {
        self.preds[task]
            .iter()
            .filter_map(|&p| station_of[p])
            .map(|s| if self.strict { s + 1 } else { s })
            .max()
            .unwrap_or(0)
    }

    /// Latest station `task` may take while leaving room for its successors.
    pub fn upper_bound(&self, task: usize) -> usize {
        let reserved = if self.strict { self.tail[task] } else { 0 };
        self.num_stations - 1 - reserved
    }

    /// Whether `task` may sit on `station` with every neighbor where it is.
    pub fn fits(&self, task: usize, station: usize, station_of: &[usize]) -> bool {
        let before = |a: usize, b: usize| if self.strict { a < b } else { a <= b };
        self.preds[task]
            .iter()
            .all(|&p| before(station_of[p], station))
            && self.succs[task]
                .iter()
                .all(|&s| before(station, station_of[s]))
    }

    pub fn loads(&self, station_of: &[usize]) -> Vec<f64> {
        let mut loads = vec![0.0; self.num_stations];
        for (t, &s) in station_of.iter().enumerate() {
            loads[s] += self.weight[t];
        }
        loads
    }
}

/// Per-task weight under `objective`.
///
/// For `Both`, each metric is normalized by its total so that neither unit
/// dominates; a metric whose total is zero contributes nothing.
fn objective_weights(metrics: &[TaskMetrics], objective: Objective, weights: Weights) -> Vec<f64> {
    match objective {
        Objective::CycleTime => metrics.iter().map(|m| m.cycle_time).collect(),
        Objective::Metabolic => metrics.iter().map(|m| m.metabolic_cost).collect(),
        Objective::Both => {
            let total_time: f64 = metrics.iter().map(|m| m.cycle_time).sum();
            let total_cost: f64 = metrics.iter().map(|m| m.metabolic_cost).sum();
            let share = |value: f64, total: f64| if total > 0.0 { value / total } else { 0.0 };
            metrics
                .iter()
                .map(|m| {
                    weights.cycle_time * share(m.cycle_time, total_time)
                        + weights.metabolic_cost * share(m.metabolic_cost, total_cost)
                })
                .collect()
        }
    }
}

/// Assign every task to one of `num_stations` stations.
///
/// # Errors
/// - `InvalidInput` for a zero station count, bad options, tasks missing from
///   `tasks`, bad metrics, or more stations than tasks
/// - `Cycle` if `graph` is not acyclic
/// - `Infeasible` if strict precedence needs more stations than given
pub fn balance(
    graph: &PrecedenceGraph,
    tasks: &TaskTable,
    num_stations: usize,
    options: &BalanceOptions,
) -> Result<BalanceResult> {
    if num_stations == 0 {
        return Err(Error::invalid_input(
            "num_stations",
            "at least one station is required",
        ));
    }
    options.validate()?;
    graph.check_acyclic()?;

    let mut problem = Problem::build(graph, tasks, num_stations, options)?;
    if num_stations > problem.len() {
        return Err(Error::invalid_input(
            "num_stations",
            format!(
                "{} stations requested for {} tasks",
                num_stations,
                problem.len()
            ),
        ));
    }

    let order = problem.priority_order();
    problem.compute_tails(&order);

    let longest = problem.longest_chain;
    if problem.strict && longest > num_stations {
        return Err(Error::Infeasible {
            required: longest,
            available: num_stations,
        });
    }
    lblog_debug!(
        "Balancing {} tasks over {} stations: objective={}, construction={}, strict={}, longest chain={}",
        problem.len(),
        num_stations,
        options.objective,
        options.construction,
        problem.strict,
        longest
    );

    let mut station_of = match options.construction {
        Construction::LeastLoaded => construct::least_loaded(&problem, &order),
        Construction::Sequential => construct::sequential(&problem, &order, options.overshoot)?,
    };
    lblog_debug!(
        "Constructive pass done: imbalance={:.4}",
        station::spread(&problem.loads(&station_of))
    );

    let moves = improve::improve(
        &problem,
        &mut station_of,
        options.threshold,
        options.max_iterations,
    );

    let result = assemble(&problem, &order, &station_of, options.objective);
    if result.stations_used() < num_stations {
        lblog_warn!(
            "Only {} of {} stations received tasks",
            result.stations_used(),
            num_stations
        );
    }
    lblog_debug!(
        "Improvement pass done: moves={}, imbalance={:.4}, variance={:.4}",
        moves,
        result.imbalance,
        result.variance
    );
    Ok(BalanceResult { moves, ..result })
}

fn assemble(
    problem: &Problem,
    order: &[usize],
    station_of: &[usize],
    objective: Objective,
) -> BalanceResult {
    let mut stations: Vec<Station> = (0..problem.num_stations).map(Station::new).collect();
    let mut assignment = StationAssignment::new();
    for &t in order {
        let s = station_of[t];
        let station = &mut stations[s];
        station.tasks.push(problem.ids[t].clone());
        station.cycle_time += problem.metrics[t].cycle_time;
        station.metabolic_cost += problem.metrics[t].metabolic_cost;
        station.load += problem.weight[t];
        assignment.assign(problem.ids[t].clone(), s);
    }

    let loads: Vec<f64> = stations.iter().map(|s| s.load).collect();
    let n = problem.num_stations as f64;
    BalanceResult {
        objective,
        num_stations: problem.num_stations,
        assignment,
        imbalance: station::spread(&loads),
        variance: station::variance(&loads),
        moves: 0,
        takt_time: problem.metrics.iter().map(|m| m.cycle_time).sum::<f64>() / n,
        metabolic_target: problem.metrics.iter().map(|m| m.metabolic_cost).sum::<f64>() / n,
        stations,
    }
}
