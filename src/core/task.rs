//! Task data model for line balancing.
//!
//! A task is identified by the name used in the precedence diagram and
//! carries the two metrics the balancer distributes across stations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Identifier of a task, as written in the data file and the DOT diagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Per-task measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskMetrics {
    /// Time the task takes at a workstation.
    pub cycle_time: f64,
    /// Predicted energy expenditure of the task.
    pub metabolic_cost: f64,
}

impl TaskMetrics {
    pub fn new(cycle_time: f64, metabolic_cost: f64) -> Self {
        Self {
            cycle_time,
            metabolic_cost,
        }
    }

    /// Reject negative, NaN or infinite measurements.
    pub fn validate(&self, id: &TaskId) -> Result<()> {
        for (name, value) in [
            ("cycle_time", self.cycle_time),
            ("metabolic_cost", self.metabolic_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_input(
                    id.to_string(),
                    format!("{} must be a non-negative number, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Metrics of every known task, ordered by id.
pub type TaskTable = BTreeMap<TaskId, TaskMetrics>;
