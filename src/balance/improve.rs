//! Local improvement of a station assignment.
//!
//! Each round evaluates every single-task move to a neighboring station and
//! every swap between tasks on neighboring stations, and applies the one
//! that shrinks the load spread the most. When no candidate changes the
//! spread (two stations tied at the maximum, say), the one that lowers the
//! load variance most is taken instead, as long as no threshold is set.
//! Rounds stop when nothing qualifies or the move cap is hit.

use super::station::{spread, variance};
use super::{Problem, EPS};
use crate::lblog_trace;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Move {
    Relocate { task: usize, to: usize },
    Swap { a: usize, b: usize },
}

/// How much a candidate lowers the spread and the variance of the loads.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gain {
    spread: f64,
    variance: f64,
}

impl Gain {
    /// Larger spread reduction wins; variance decides between equal spreads.
    fn beats(&self, other: &Gain) -> bool {
        self.spread > other.spread + EPS
            || ((self.spread - other.spread).abs() <= EPS && self.variance > other.variance + EPS)
    }

    fn accepted(&self, threshold: f64) -> bool {
        if self.spread > EPS {
            self.spread > threshold
        } else {
            threshold <= 0.0 && self.spread >= -EPS && self.variance > EPS
        }
    }
}

/// Improve `station_of` in place and return the number of applied moves.
pub(super) fn improve(
    problem: &Problem,
    station_of: &mut [usize],
    threshold: f64,
    max_iterations: usize,
) -> usize {
    let mut loads = problem.loads(station_of);
    let mut moves = 0;

    while moves < max_iterations {
        let Some((mv, gain)) = best_move(problem, station_of, &loads) else {
            break;
        };
        if !gain.accepted(threshold) {
            break;
        }

        match mv {
            Move::Relocate { task, to } => {
                loads[station_of[task]] -= problem.weight[task];
                loads[to] += problem.weight[task];
                station_of[task] = to;
            }
            Move::Swap { a, b } => {
                let (sa, sb) = (station_of[a], station_of[b]);
                let delta = problem.weight[b] - problem.weight[a];
                loads[sa] += delta;
                loads[sb] -= delta;
                station_of[a] = sb;
                station_of[b] = sa;
            }
        }
        moves += 1;
        lblog_trace!(
            "Improvement move {}: {:?}, spread -{:.4}, variance -{:.4}",
            moves,
            mv,
            gain.spread,
            gain.variance
        );
    }

    moves
}

/// The best candidate by `Gain::beats`, first found on ties.
fn best_move(problem: &Problem, station_of: &mut [usize], loads: &[f64]) -> Option<(Move, Gain)> {
    let stations = problem.num_stations;
    let current = Gain {
        spread: spread(loads),
        variance: variance(loads),
    };
    let gain_of = |scratch: &[f64]| Gain {
        spread: current.spread - spread(scratch),
        variance: current.variance - variance(scratch),
    };
    let mut best: Option<(Move, Gain)> = None;
    let mut scratch = loads.to_vec();
    let mut consider = |mv: Move, gain: Gain| {
        if best.map_or(true, |(_, g)| gain.beats(&g)) {
            best = Some((mv, gain));
        }
    };

    for task in 0..problem.len() {
        let from = station_of[task];
        let neighbors = [from.checked_sub(1), Some(from + 1).filter(|&s| s < stations)];
        for to in neighbors.into_iter().flatten() {
            if !problem.fits(task, to, station_of) {
                continue;
            }
            let w = problem.weight[task];
            scratch[from] -= w;
            scratch[to] += w;
            let gain = gain_of(&scratch);
            scratch[from] = loads[from];
            scratch[to] = loads[to];
            consider(Move::Relocate { task, to }, gain);
        }
    }

    for a in 0..problem.len() {
        let sa = station_of[a];
        if sa + 1 >= stations {
            continue;
        }
        for b in 0..problem.len() {
            let sb = station_of[b];
            if sb != sa + 1 || (problem.weight[a] - problem.weight[b]).abs() <= EPS {
                continue;
            }

            station_of[a] = sb;
            station_of[b] = sa;
            let valid = problem.fits(a, sb, station_of) && problem.fits(b, sa, station_of);
            station_of[a] = sa;
            station_of[b] = sb;
            if !valid {
                continue;
            }

            let delta = problem.weight[b] - problem.weight[a];
            scratch[sa] += delta;
            scratch[sb] -= delta;
            let gain = gain_of(&scratch);
            scratch[sa] = loads[sa];
            scratch[sb] = loads[sb];
            consider(Move::Swap { a, b }, gain);
        }
    }

    best
}
