//! Hand-checked balancing outcomes.

use linebal::loader::{parse_precedence, parse_task_data};
use linebal::{balance, BalanceOptions, Construction, Error, Objective, PrecedenceGraph, TaskMetrics, TaskTable};

use crate::fixtures::{assert_valid, id, SCENARIO_DATA, SCENARIO_DOT};

fn scenario() -> (PrecedenceGraph, TaskTable) {
    (
        parse_precedence(SCENARIO_DOT, "scenario.dot").unwrap(),
        parse_task_data(SCENARIO_DATA, "scenario.txt").unwrap(),
    )
}

fn chain_with_extras(chain: usize, extras: usize) -> (PrecedenceGraph, TaskTable) {
    let mut graph = PrecedenceGraph::new();
    let mut tasks = TaskTable::new();
    for i in 0..chain {
        let name = format!("C{}", i);
        graph.add_task(id(&name));
        tasks.insert(id(&name), TaskMetrics::new(1.0 + i as f64, 10.0));
        if i > 0 {
            graph.add_precedence(id(&format!("C{}", i - 1)), id(&name));
        }
    }
    for i in 0..extras {
        tasks.insert(id(&format!("X{}", i)), TaskMetrics::new(2.0, 10.0));
    }
    (graph, tasks)
}

#[test]
fn test_five_tasks_three_stations_cycle_time() {
    let (graph, tasks) = scenario();
    let result = balance(&graph, &tasks, 3, &BalanceOptions::default()).unwrap();
    assert_valid(&result, &graph, &tasks, 3, false);

    // A,B before C before D before E.
    let station = |name: &str| result.station_of(&id(name)).unwrap();
    assert!(station("A") <= station("C"));
    assert!(station("B") <= station("C"));
    assert!(station("C") <= station("D"));
    assert!(station("D") <= station("E"));

    // Closest to 12 / 3 = 4 that precedence allows.
    let times: Vec<f64> = result.stations.iter().map(|s| s.cycle_time).collect();
    assert_eq!(times, vec![5.0, 4.0, 3.0]);
    assert_eq!(result.imbalance, 2.0);
    assert_eq!(result.takt_time, 4.0);
}

#[test]
fn test_five_tasks_sequential_construction_matches() {
    let (graph, tasks) = scenario();
    let options = BalanceOptions {
        construction: Construction::Sequential,
        ..BalanceOptions::default()
    };
    let result = balance(&graph, &tasks, 3, &options).unwrap();
    assert_valid(&result, &graph, &tasks, 3, false);
    assert!(result.imbalance <= 2.0 + 1e-9);
}

#[test]
fn test_five_tasks_metabolic_objective() {
    let (graph, tasks) = scenario();
    let options = BalanceOptions::with_objective(Objective::Metabolic);
    let result = balance(&graph, &tasks, 3, &options).unwrap();
    assert_valid(&result, &graph, &tasks, 3, false);
    assert_eq!(result.objective, Objective::Metabolic);
    for station in &result.stations {
        assert_eq!(station.load, station.metabolic_cost);
    }
}

#[test]
fn test_five_tasks_both_objective_loads_sum_to_weights() {
    let (graph, tasks) = scenario();
    let options = BalanceOptions::with_objective(Objective::Both);
    let result = balance(&graph, &tasks, 3, &options).unwrap();
    assert_valid(&result, &graph, &tasks, 3, false);
    // Normalized shares add up to the weight sum (2 + 1).
    let total: f64 = result.stations.iter().map(|s| s.load).sum();
    assert!((total - 3.0).abs() < 1e-9);
}

#[test]
fn test_cycle_is_reported() {
    let graph = parse_precedence("digraph { A -> B; B -> A; }", "cycle.dot").unwrap();
    let tasks = parse_task_data("A 1 1\nB 1 1\n", "cycle.txt").unwrap();
    let err = balance(&graph, &tasks, 1, &BalanceOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }));
    assert_eq!(err.kind(), "CycleError");
}

#[test]
fn test_missing_record_names_task() {
    let graph = parse_precedence("A -> B\nB -> Z\n", "p.dot").unwrap();
    let tasks = parse_task_data("A 1 1\nB 1 1\n", "d.txt").unwrap();
    let err = balance(&graph, &tasks, 2, &BalanceOptions::default()).unwrap_err();
    assert_eq!(err.kind(), "InvalidInputError");
    assert!(err.to_string().contains('Z'));
}

#[test]
fn test_strict_chain_boundary_is_feasible() {
    let (graph, tasks) = chain_with_extras(4, 2);
    let options = BalanceOptions {
        strict_precedence: true,
        ..BalanceOptions::default()
    };
    let result = balance(&graph, &tasks, 4, &options).unwrap();
    assert_valid(&result, &graph, &tasks, 4, true);

    // One chain task per station, in chain order.
    for i in 0..4 {
        assert_eq!(result.station_of(&id(&format!("C{}", i))), Some(i));
    }
}

#[test]
fn test_strict_chain_one_station_short_is_infeasible() {
    let (graph, tasks) = chain_with_extras(4, 2);
    let options = BalanceOptions {
        strict_precedence: true,
        ..BalanceOptions::default()
    };
    match balance(&graph, &tasks, 3, &options) {
        Err(Error::Infeasible {
            required,
            available,
        }) => {
            assert_eq!(required, 4);
            assert_eq!(available, 3);
        }
        other => panic!("expected infeasible, got {:?}", other),
    }
}

#[test]
fn test_strict_sequential_chain_boundary() {
    let (graph, tasks) = chain_with_extras(5, 0);
    let options = BalanceOptions {
        strict_precedence: true,
        construction: Construction::Sequential,
        ..BalanceOptions::default()
    };
    let result = balance(&graph, &tasks, 5, &options).unwrap();
    assert_valid(&result, &graph, &tasks, 5, true);
    assert!(result.stations.iter().all(|s| s.tasks.len() == 1));
}

#[test]
fn test_shared_mode_fits_long_chain_in_few_stations() {
    let (graph, tasks) = chain_with_extras(6, 0);
    let result = balance(&graph, &tasks, 2, &BalanceOptions::default()).unwrap();
    assert_valid(&result, &graph, &tasks, 2, false);
}

#[test]
fn test_threshold_limits_improvement() {
    let (graph, tasks) = scenario();
    let loose = balance(&graph, &tasks, 3, &BalanceOptions::default()).unwrap();
    let tight = balance(
        &graph,
        &tasks,
        3,
        &BalanceOptions {
            threshold: 100.0,
            ..BalanceOptions::default()
        },
    )
    .unwrap();
    assert_eq!(tight.moves, 0);
    assert!(loose.moves > 0);
    assert!(loose.imbalance < tight.imbalance);
}
