use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::algorithms::balance::balance;
use crate::algorithms::coarsen::COARSEN_TO;
use crate::algorithms::fm_refiner::fm_refine;
use crate::algorithms::multilevel_bisection::BisectionConfig;
use crate::algorithms::refinement::{RefinementState, WEIGHT_EPSILON};
use crate::graph::Graph;

/// Grow side 0 breadth-first from a random vertex until side 1 is down to its target.
///
/// Vertices whose move would take side 1 below its target are skipped and not
/// expanded. When the queue drains early (disconnected graph, or every
/// frontier vertex was skipped) the search restarts from the lowest-index
/// unvisited vertex.
fn grow_bisection<R: Rng + ?Sized>(graph: &Graph, weights: &[f64], targets: [f64; 2], rng: &mut R) -> Vec<usize> {
    let num_of_vertices = graph.len();
    let mut partition = vec![1; num_of_vertices];
    let mut part1_weight: f64 = weights.iter().sum();
    let mut visited = vec![false; num_of_vertices];
    let mut queue = VecDeque::new();
    let mut next_unvisited = 0;

    let start = rng.gen_range(0..num_of_vertices);
    visited[start] = true;
    queue.push_back(start);

    loop {
        let vertex = match queue.pop_front() {
            Some(vertex) => vertex,
            None => {
                while next_unvisited < num_of_vertices && visited[next_unvisited] {
                    next_unvisited += 1;
                }
                if next_unvisited == num_of_vertices {
                    break;
                }
                visited[next_unvisited] = true;
                next_unvisited
            }
        };

        if part1_weight - weights[vertex] < targets[1] - WEIGHT_EPSILON {
            continue;
        }

        partition[vertex] = 0;
        part1_weight -= weights[vertex];
        if part1_weight <= targets[1] + WEIGHT_EPSILON {
            break;
        }

        for (neighbor, _) in graph.neighbors(vertex) {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }

    partition
}

/// Compute a balanced bisection of a (coarse) graph.
///
/// Several breadth-first growing trials are balanced and refined; the one with
/// the lowest cut wins, the earliest on ties. A trial with no cut at all ends
/// the search.
pub(crate) fn initial_bisection<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    target_ratios: [f64; 2],
    config: &BisectionConfig,
    rng: &mut R,
) -> RefinementState {
    debug_assert!(!graph.is_empty());

    let total_weight: f64 = weights.iter().sum();
    let targets = [target_ratios[0] * total_weight, total_weight - target_ratios[0] * total_weight];
    let num_trials = if graph.len() > COARSEN_TO { 9 } else { 4 };

    let run_trial = |rng: &mut R| {
        let partition = grow_bisection(graph, weights, targets, rng);
        let mut state = RefinementState::compute(graph, weights, partition);
        balance(graph, weights, &mut state, targets, config.balance_passes, rng);
        fm_refine(graph, weights, &mut state, targets, config.refine_passes, rng);
        state
    };

    let mut best = run_trial(rng);
    debug!(trial = 0, cut = best.cut, "initial bisection trial");

    for trial in 1..num_trials {
        if best.cut <= WEIGHT_EPSILON {
            break;
        }
        let state = run_trial(rng);
        debug!(trial, cut = state.cut, "initial bisection trial");
        if state.cut < best.cut - WEIGHT_EPSILON {
            best = state;
        }
    }

    best
}
