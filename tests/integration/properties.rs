//! Invariants over seeded random precedence graphs.

use linebal::{balance, BalanceOptions, Construction, Objective};

use crate::fixtures::{assert_valid, generated_line};

const SEEDS: std::ops::Range<u64> = 1..25;
const TASKS: usize = 18;

fn all_option_sets(strict: bool) -> Vec<BalanceOptions> {
    let mut sets = Vec::new();
    for objective in [Objective::CycleTime, Objective::Metabolic, Objective::Both] {
        for construction in [Construction::LeastLoaded, Construction::Sequential] {
            sets.push(BalanceOptions {
                objective,
                construction,
                strict_precedence: strict,
                ..BalanceOptions::default()
            });
        }
    }
    sets
}

#[test]
fn test_every_task_placed_once_in_precedence_order() {
    for seed in SEEDS {
        let (graph, tasks) = generated_line(seed, TASKS, 0.15);
        for stations in [1, 3, 5, 8] {
            for options in all_option_sets(false) {
                let result = balance(&graph, &tasks, stations, &options)
                    .unwrap_or_else(|e| panic!("seed {} stations {}: {}", seed, stations, e));
                assert_valid(&result, &graph, &tasks, stations, false);
            }
        }
    }
}

#[test]
fn test_strict_mode_whenever_chain_fits() {
    for seed in SEEDS {
        let (graph, tasks) = generated_line(seed, TASKS, 0.1);
        let chain = graph.longest_chain().unwrap();
        for stations in [chain, chain + 1, (chain + 3).min(TASKS)] {
            for options in all_option_sets(true) {
                let result = balance(&graph, &tasks, stations, &options)
                    .unwrap_or_else(|e| panic!("seed {} stations {}: {}", seed, stations, e));
                assert_valid(&result, &graph, &tasks, stations, true);
            }
        }
        if chain > 1 {
            let options = BalanceOptions {
                strict_precedence: true,
                ..BalanceOptions::default()
            };
            let err = balance(&graph, &tasks, chain - 1, &options).unwrap_err();
            assert_eq!(err.kind(), "InfeasibleError");
        }
    }
}

#[test]
fn test_improvement_never_widens_spread() {
    for seed in SEEDS {
        let (graph, tasks) = generated_line(seed, TASKS, 0.2);
        for options in all_option_sets(false) {
            let constructed = balance(
                &graph,
                &tasks,
                4,
                &BalanceOptions {
                    max_iterations: 0,
                    ..options.clone()
                },
            )
            .unwrap();
            let improved = balance(&graph, &tasks, 4, &options).unwrap();
            assert_eq!(constructed.moves, 0);
            assert!(
                improved.imbalance <= constructed.imbalance + 1e-9,
                "seed {}: {} > {}",
                seed,
                improved.imbalance,
                constructed.imbalance
            );
        }
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    for seed in SEEDS {
        let (graph, tasks) = generated_line(seed, TASKS, 0.15);
        let options = BalanceOptions::with_objective(Objective::Both);
        let first = balance(&graph, &tasks, 5, &options).unwrap();
        let second = balance(&graph, &tasks, 5, &options).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_independent_tasks_spread_evenly() {
    // No edges: equal-time tasks end up an equal count per station.
    for seed in SEEDS {
        let (graph, mut tasks) = generated_line(seed, 12, 0.0);
        for metrics in tasks.values_mut() {
            metrics.cycle_time = 1.0;
        }
        let result = balance(&graph, &tasks, 4, &BalanceOptions::default()).unwrap();
        assert_eq!(result.imbalance, 0.0);
        assert!(result.stations.iter().all(|s| s.tasks.len() == 3));
    }
}
