//! Station aggregates and the balancer's result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Objective;
use crate::core::{PrecedenceGraph, TaskId};

/// One workstation and the tasks assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Zero-based station index.
    pub index: usize,
    /// Assigned tasks, in balancing priority order.
    pub tasks: Vec<TaskId>,
    /// Sum of the tasks' cycle times.
    pub cycle_time: f64,
    /// Sum of the tasks' metabolic costs.
    pub metabolic_cost: f64,
    /// Sum of the tasks' weights under the balanced objective.
    pub load: f64,
}

impl Station {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            tasks: Vec::new(),
            cycle_time: 0.0,
            metabolic_cost: 0.0,
            load: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// One-based label used in reports.
    pub fn label(&self) -> String {
        format!("S{}", self.index + 1)
    }
}

/// Task → station index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationAssignment(BTreeMap<TaskId, usize>);

impl StationAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, task: TaskId, station: usize) {
        self.0.insert(task, station);
    }

    pub fn station_of(&self, task: &TaskId) -> Option<usize> {
        self.0.get(task).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges of `graph` whose endpoints are missing or out of order.
    ///
    /// With `strict` set, a predecessor sharing its successor's station also
    /// counts as a violation.
    pub fn violations<'a>(
        &self,
        graph: &'a PrecedenceGraph,
        strict: bool,
    ) -> Vec<(&'a TaskId, &'a TaskId)> {
        graph
            .precedences()
            .into_iter()
            .filter(|(from, to)| match (self.station_of(from), self.station_of(to)) {
                (Some(a), Some(b)) => {
                    if strict {
                        a >= b
                    } else {
                        a > b
                    }
                }
                _ => true,
            })
            .collect()
    }
}

/// Outcome of a balancing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResult {
    pub objective: Objective,
    pub num_stations: usize,
    pub assignment: StationAssignment,
    /// Every station, including empty ones, ordered by index.
    pub stations: Vec<Station>,
    /// Max minus min station load.
    pub imbalance: f64,
    /// Population variance of the station loads.
    pub variance: f64,
    /// Improvement moves applied after the constructive pass.
    pub moves: usize,
    /// Total cycle time divided by the station count.
    pub takt_time: f64,
    /// Total metabolic cost divided by the station count.
    pub metabolic_target: f64,
}

impl BalanceResult {
    pub fn station_of(&self, task: &TaskId) -> Option<usize> {
        self.assignment.station_of(task)
    }

    /// Number of stations with at least one task.
    pub fn stations_used(&self) -> usize {
        self.stations.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn max_load(&self) -> f64 {
        self.stations.iter().map(|s| s.load).fold(0.0, f64::max)
    }
}

pub(crate) fn spread(loads: &[f64]) -> f64 {
    let max = loads.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = loads.iter().copied().fold(f64::INFINITY, f64::min);
    if loads.is_empty() {
        0.0
    } else {
        max - min
    }
}

pub(crate) fn variance(loads: &[f64]) -> f64 {
    if loads.is_empty() {
        return 0.0;
    }
    let n = loads.len() as f64;
    let mean = loads.iter().sum::<f64>() / n;
    loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n
}
