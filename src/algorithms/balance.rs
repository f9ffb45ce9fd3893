// Boundary balancing of a bisection: moves the best boundary vertices out of
// the overweight side until the sides are close to their target weights.

use rand::Rng;
use tracing::debug;

use crate::algorithms::gain_queue::GainQueues;
use crate::algorithms::refinement::{average_part_weight_slack, deviation, RefinementState, WEIGHT_EPSILON};
use crate::graph::Graph;
use crate::random::chunked_permutation;

fn relative_excess(part_weight: f64, target: f64) -> f64 {
    if target > 0.0 {
        (part_weight - target) / target
    } else if part_weight > 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    }
}

/// The side that exceeds its target weight by the largest relative margin.
fn heaviest_side(part_weights: [f64; 2], targets: [f64; 2]) -> usize {
    if relative_excess(part_weights[0], targets[0]) >= relative_excess(part_weights[1], targets[1]) {
        0
    } else {
        1
    }
}

pub(crate) fn balance<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    state: &mut RefinementState,
    targets: [f64; 2],
    max_passes: usize,
    rng: &mut R,
) {
    let total_weight = state.part_weights[0] + state.part_weights[1];
    let slack = average_part_weight_slack(total_weight, graph.len());
    let mut queues = GainQueues::new(graph.len());
    let mut locked = vec![false; graph.len()];

    for pass in 0..max_passes {
        if deviation(state.part_weights, targets) <= slack || state.boundary.is_empty() {
            return;
        }

        let num_moves = boundary_balance(graph, weights, state, targets, &mut queues, &mut locked, rng);
        debug!(pass, num_moves, cut = state.cut, weights = ?state.part_weights, "balance pass");

        if num_moves == 0 {
            return;
        }
    }
}

fn boundary_balance<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    state: &mut RefinementState,
    targets: [f64; 2],
    queues: &mut GainQueues,
    locked: &mut [bool],
    rng: &mut R,
) -> usize {
    let from = heaviest_side(state.part_weights, targets);
    let to = 1 - from;
    let min_diff = deviation(state.part_weights, targets);

    queues.clear();
    locked.fill(false);

    // Only vertices light enough not to overshoot the other side are candidates.
    let boundary_len = state.boundary.len();
    for index in chunked_permutation(boundary_len, boundary_len / 5, rng) {
        let vertex = state.boundary.vertices()[index];
        if state.partition[vertex] == from && weights[vertex] <= min_diff + WEIGHT_EPSILON {
            queues.sides[from].insert(vertex, state.gain(vertex));
        }
    }

    let mut num_moves = 0;
    while let Some(vertex) = queues.sides[from].pop() {
        if state.part_weights[to] + weights[vertex] > targets[to] + WEIGHT_EPSILON {
            break;
        }

        locked[vertex] = true;
        state.apply_move(graph, weights, vertex, Some(&mut *queues), locked);
        num_moves += 1;
    }

    num_moves
}
