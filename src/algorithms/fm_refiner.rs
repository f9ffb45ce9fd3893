// This file contains the Fiduccia-Mattheyses style boundary refinement of a bisection.
// # Reference
//
// Fiduccia, C. M., and R. M. Mattheyses. "A linear-time heuristic for improving network partitions."
// 19th Design Automation Conference (1982): 175-181.

use rand::Rng;
use tracing::debug;

use crate::algorithms::gain_queue::GainQueues;
use crate::algorithms::refinement::{average_part_weight_slack, RefinementState, WEIGHT_EPSILON};
use crate::graph::Graph;
use crate::random::chunked_permutation;

/// Number of moves without a new best prefix after which a pass stops.
fn swap_limit(num_of_vertices: usize) -> usize {
    15.max(num_of_vertices / 100)
}

// The side to take the next vertex from: the one holding more weight than it should.
fn source_side(part_weights: [f64; 2], targets: [f64; 2]) -> usize {
    if targets[0] - part_weights[0] < targets[1] - part_weights[1] {
        0
    } else {
        1
    }
}

/// Improve the edge cut of `state` by moving boundary vertices between the two sides.
///
/// Every pass moves vertices greedily by gain and then rolls back to the best
/// prefix of moves it saw, so the cut never increases.
pub(crate) fn fm_refine<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    state: &mut RefinementState,
    targets: [f64; 2],
    max_passes: usize,
    rng: &mut R,
) {
    let num_of_vertices = graph.len();
    let total_weight = state.part_weights[0] + state.part_weights[1];
    let slack = average_part_weight_slack(total_weight, num_of_vertices);
    let limit = swap_limit(num_of_vertices);

    let mut queues = GainQueues::new(num_of_vertices);
    let mut locked = vec![false; num_of_vertices];
    let mut swaps = Vec::with_capacity(num_of_vertices);

    for pass in 0..max_passes {
        queues.clear();
        locked.fill(false);
        swaps.clear();

        let initial_cut = state.cut;
        let original_diff = (targets[0] - state.part_weights[0]).abs();
        let mut min_cut = initial_cut;
        let mut min_diff = original_diff;
        let mut best_prefix: Option<usize> = None;

        let boundary_len = state.boundary.len();
        for index in chunked_permutation(boundary_len, boundary_len, rng) {
            let vertex = state.boundary.vertices()[index];
            queues.sides[state.partition[vertex]].insert(vertex, state.gain(vertex));
        }

        for num_swaps in 0..num_of_vertices {
            let from = source_side(state.part_weights, targets);
            let Some(vertex) = queues.sides[from].pop() else {
                break;
            };

            let new_cut = state.cut - state.gain(vertex);
            let new_weight0 = if from == 0 {
                state.part_weights[0] - weights[vertex]
            } else {
                state.part_weights[0] + weights[vertex]
            };
            let new_diff = (targets[0] - new_weight0).abs();

            let lowers_cut = new_cut < min_cut - WEIGHT_EPSILON && new_diff <= original_diff + slack;
            let same_cut_better_balance = (new_cut - min_cut).abs() <= WEIGHT_EPSILON && new_diff < min_diff;

            if lowers_cut || same_cut_better_balance {
                min_cut = new_cut;
                min_diff = new_diff;
                best_prefix = Some(num_swaps);
            } else if best_prefix.map_or(num_swaps + 1, |best| num_swaps - best) > limit {
                break;
            }

            locked[vertex] = true;
            state.apply_move(graph, weights, vertex, Some(&mut queues), &locked);
            swaps.push(vertex);
        }

        // Undo every move past the best prefix.
        let kept = best_prefix.map_or(0, |best| best + 1);
        for &vertex in swaps[kept..].iter().rev() {
            state.apply_move(graph, weights, vertex, None, &locked);
        }

        debug!(pass, moves = swaps.len(), kept, initial_cut, cut = state.cut, "fm pass");

        if best_prefix.map_or(true, |best| best == 0) || (min_cut - initial_cut).abs() <= WEIGHT_EPSILON {
            break;
        }
    }
}
