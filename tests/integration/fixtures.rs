//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Writing input files into a temporary directory
//! - The five-task reference line
//! - Seeded random precedence graphs
//! - Checking the invariants every balancing result must satisfy

use rand::prelude::*;
use rand_pcg::Pcg64Mcg;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

use linebal::{BalanceResult, PrecedenceGraph, TaskId, TaskMetrics, TaskTable};

/// Reference line: A,B -> C -> D -> E.
pub const SCENARIO_DATA: &str = "\
A 2 10
B 3 5
C 4 20
D 1 5
E 2 10
";

pub const SCENARIO_DOT: &str = "\
digraph line {
    A -> C;
    B -> C;
    C -> D;
    D -> E;
}
";

/// Input files in a temporary directory that doubles as `$HOME`.
pub struct TestFiles {
    /// The temporary directory holding the files.
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
    pub precedence_path: PathBuf,
}

impl TestFiles {
    pub fn new(data: &str, dot: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_path = temp_dir.path().join("data.txt");
        let precedence_path = temp_dir.path().join("precedence.dot");
        std::fs::write(&data_path, data).expect("Failed to write data file");
        std::fs::write(&precedence_path, dot).expect("Failed to write DOT file");
        Self {
            temp_dir,
            data_path,
            precedence_path,
        }
    }

    pub fn scenario() -> Self {
        Self::new(SCENARIO_DATA, SCENARIO_DOT)
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Write `~/.linebal/linebal.toml` inside the temporary home.
    pub fn write_config(&self, toml: &str) {
        let dir = self.temp_dir.path().join(".linebal");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        std::fs::write(dir.join("linebal.toml"), toml).expect("Failed to write config");
    }
}

pub fn id(name: &str) -> TaskId {
    TaskId::from(name)
}

/// Random DAG over `T0..T{n-1}`; edges only go from lower to higher index.
///
/// The same seed always yields the same graph and metrics.
pub fn generated_line(seed: u64, tasks: usize, edge_probability: f64) -> (PrecedenceGraph, TaskTable) {
    let mut rng = Pcg64Mcg::new(seed as u128);
    let mut graph = PrecedenceGraph::new();
    let mut table = TaskTable::new();

    for j in 0..tasks {
        let name = format!("T{}", j);
        graph.add_task(id(&name));
        let time = rng.gen_range(1..=9u32) as f64;
        let cost = rng.gen_range(50..=250u32) as f64;
        table.insert(id(&name), TaskMetrics::new(time, cost));
        for i in 0..j {
            if rng.gen::<f64>() < edge_probability {
                graph.add_precedence(id(&format!("T{}", i)), id(&name));
            }
        }
    }

    (graph, table)
}

/// Assert the invariants every successful balance must satisfy.
pub fn assert_valid(
    result: &BalanceResult,
    graph: &PrecedenceGraph,
    tasks: &TaskTable,
    num_stations: usize,
    strict: bool,
) {
    assert_eq!(result.stations.len(), num_stations);
    assert!(result.stations_used() <= num_stations);

    // Every task exactly once.
    let mut seen = HashSet::new();
    for station in &result.stations {
        for task in &station.tasks {
            assert!(seen.insert(task.clone()), "task {} assigned twice", task);
            assert_eq!(result.station_of(task), Some(station.index));
        }
    }
    assert_eq!(seen.len(), tasks.len());
    assert_eq!(result.assignment.len(), tasks.len());
    for task in tasks.keys() {
        assert!(seen.contains(task), "task {} not assigned", task);
    }

    // Precedence.
    let violations = result.assignment.violations(graph, strict);
    assert!(violations.is_empty(), "precedence violated: {:?}", violations);

    // Aggregates add up.
    let total_time: f64 = tasks.values().map(|m| m.cycle_time).sum();
    let assigned_time: f64 = result.stations.iter().map(|s| s.cycle_time).sum();
    assert!((total_time - assigned_time).abs() < 1e-6);
}
