//! Constructive passes producing the initial station assignment.

use super::{Problem, EPS};
use crate::{lblog_trace, Error, Result};

/// Walk `order` and put each task on the lightest station in its window.
///
/// Ties go to the lowest station index.
pub(super) fn least_loaded(problem: &Problem, order: &[usize]) -> Vec<usize> {
    let mut station_of: Vec<Option<usize>> = vec![None; problem.len()];
    let mut loads = vec![0.0; problem.num_stations];

    for &t in order {
        let lower = problem.lower_bound(t, &station_of);
        let upper = problem.upper_bound(t);
        debug_assert!(lower <= upper, "station window closed for task {}", t);

        let mut best = lower;
        for s in lower..=upper {
            if loads[s] < loads[best] - EPS {
                best = s;
            }
        }
        loads[best] += problem.weight[t];
        station_of[t] = Some(best);
    }

    station_of.into_iter().map(|s| s.unwrap_or(0)).collect()
}

/// Fill stations one after another against the average load.
///
/// The first ready task (in `order`) that keeps the station at or under the
/// target is taken. If none fits, a station may take its lightest ready task
/// once when that stays within `overshoot` percent of the target, and an
/// empty station always takes one. The last station takes everything left.
pub(super) fn sequential(problem: &Problem, order: &[usize], overshoot: f64) -> Result<Vec<usize>> {
    let n = problem.len();
    let total: f64 = problem.weight.iter().sum();
    let target = total / problem.num_stations as f64;
    let limit = target * (1.0 + overshoot / 100.0);

    let mut station_of: Vec<Option<usize>> = vec![None; n];
    let mut placed = 0;
    let mut station = 0;
    let mut load = 0.0;
    let mut empty = true;
    let mut overshot = false;

    while placed < n {
        let ready: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&t| station_of[t].is_none() && is_ready(problem, t, station, &station_of))
            .collect();
        let last = station + 1 == problem.num_stations;

        let pick = if let Some(&t) = ready.iter().find(|&&t| problem.upper_bound(t) == station) {
            Some(t)
        } else if last {
            ready.first().copied()
        } else if let Some(&t) = ready
            .iter()
            .find(|&&t| load + problem.weight[t] <= target + EPS)
        {
            Some(t)
        } else {
            let lightest = ready
                .iter()
                .copied()
                .min_by(|&a, &b| problem.weight[a].total_cmp(&problem.weight[b]));
            match lightest {
                Some(t) if empty => Some(t),
                Some(t) if !overshot && load + problem.weight[t] <= limit + EPS => {
                    overshot = true;
                    Some(t)
                }
                _ => None,
            }
        };

        match pick {
            Some(t) => {
                lblog_trace!("Sequential: {} -> station {}", problem.ids[t], station);
                station_of[t] = Some(station);
                load += problem.weight[t];
                empty = false;
                placed += 1;
            }
            None if last => {
                return Err(Error::Infeasible {
                    required: problem.longest_chain,
                    available: problem.num_stations,
                });
            }
            None => {
                station += 1;
                load = 0.0;
                empty = true;
                overshot = false;
            }
        }
    }

    Ok(station_of.into_iter().map(|s| s.unwrap_or(0)).collect())
}

/// All predecessors placed, and in strict mode on an earlier station.
fn is_ready(problem: &Problem, task: usize, station: usize, station_of: &[Option<usize>]) -> bool {
    problem.preds[task].iter().all(|&p| match station_of[p] {
        Some(s) => !problem.strict || s < station,
        None => false,
    })
}
