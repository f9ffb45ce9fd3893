use rand::Rng;
use tracing::debug;

use crate::algorithms::balance::balance;
use crate::algorithms::coarsen::{coarsen_graph, COARSEN_TO};
use crate::algorithms::fm_refiner::fm_refine;
use crate::algorithms::initial_bisection::initial_bisection;
use crate::algorithms::refinement::RefinementState;
use crate::graph::Graph;

/// Knobs shared by every bisection of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BisectionConfig {
    /// Coarsening stops at this many vertices.
    pub coarsen_to: usize,

    /// Maximum number of balancing passes per refinement step.
    pub balance_passes: usize,

    /// Maximum number of FM passes per refinement step.
    pub refine_passes: usize,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        BisectionConfig {
            coarsen_to: COARSEN_TO,
            balance_passes: 4,
            refine_passes: 4,
        }
    }
}

// Projects the partition from a coarse graph back to the finer graph one level up.
// If vertices 1 and 2 of the finer graph were merged into vertex 0 of the coarse
// graph and it belonged to partition 0, then vertices 1 and 2 belong to partition 0.
pub(crate) fn project_partition(coarse_partition: &[usize], fine_vertex_to_coarse_vertex: &[usize]) -> Vec<usize> {
    fine_vertex_to_coarse_vertex
        .iter()
        .map(|&coarse_vertex| coarse_partition[coarse_vertex])
        .collect()
}

/// Lift a coarse bisection to the finer level, then balance and refine it there.
pub(crate) fn project<R: Rng + ?Sized>(
    fine_graph: &Graph,
    fine_weights: &[f64],
    fine_vertex_to_coarse_vertex: &[usize],
    coarse_partition: &[usize],
    targets: [f64; 2],
    config: &BisectionConfig,
    rng: &mut R,
) -> RefinementState {
    let partition = project_partition(coarse_partition, fine_vertex_to_coarse_vertex);
    let mut state = RefinementState::compute(fine_graph, fine_weights, partition);
    balance(fine_graph, fine_weights, &mut state, targets, config.balance_passes, rng);
    fm_refine(fine_graph, fine_weights, &mut state, targets, config.refine_passes, rng);
    state
}

/// Multilevel bisection: coarsen, bisect the coarsest graph, then project and
/// refine level by level back up to `graph`.
///
/// `target_ratios` are the shares of the total weight each side should receive.
pub(crate) fn multilevel_bisection<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    target_ratios: [f64; 2],
    config: &BisectionConfig,
    rng: &mut R,
) -> RefinementState {
    let total_weight: f64 = weights.iter().sum();
    let targets = [target_ratios[0] * total_weight, total_weight - target_ratios[0] * total_weight];

    let levels = coarsen_graph(graph, weights, config.coarsen_to, rng);
    let (coarsest_graph, coarsest_weights) = match levels.last() {
        Some(level) => (&level.graph, level.weights.as_slice()),
        None => (graph, weights),
    };

    let mut state = initial_bisection(coarsest_graph, coarsest_weights, target_ratios, config, rng);
    debug!(levels = levels.len(), vertices = coarsest_graph.len(), cut = state.cut, "initial bisection");

    // Uncoarsen the graph till we reach the initial graph.
    for index in (0..levels.len()).rev() {
        let (fine_graph, fine_weights) = if index == 0 {
            (graph, weights)
        } else {
            (&levels[index - 1].graph, levels[index - 1].weights.as_slice())
        };
        state = project(
            fine_graph,
            fine_weights,
            &levels[index].fine_to_coarse,
            &state.partition,
            targets,
            config,
            rng,
        );
        debug!(level = index, vertices = fine_graph.len(), cut = state.cut, "projected bisection");
    }

    state
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use crate::algorithms::coarsen::heavy_edge_matching_coarse;
    use crate::algorithms::coarsen::max_vertex_weight;
    use crate::algorithms::refinement::average_part_weight_slack;
    use crate::imbalance::imbalance;
    use crate::random::seeded_rng;
    use super::*;

    fn grid_graph(rows: usize, cols: usize) -> Graph {
        let mut edges = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let vertex = row * cols + col;
                if col + 1 < cols {
                    edges.push((vertex, vertex + 1, 1.0));
                }
                if row + 1 < rows {
                    edges.push((vertex, vertex + cols, 1.0));
                }
            }
        }
        Graph::from_edges(rows * cols, edges)
    }

    #[test]
    fn test_project_partition() {
        // Arrange
        let fine_vertex_to_coarse_vertex_mapping = vec![0, 2, 1, 0];
        let weights_coarse_graph = [5.0, 7.0, 6.0];
        let coarse_graph_partition = [1, 0, 0];
        let weights_uncoarse_graph = [2.0, 6.0, 7.0, 3.0];

        // Act
        let uncoarsed_graph_partition = project_partition(&coarse_graph_partition, &fine_vertex_to_coarse_vertex_mapping);

        // Assert
        assert_eq!(uncoarsed_graph_partition, vec![1, 0, 0, 1]);
        let coarse_graph_imbalance = imbalance(2, &coarse_graph_partition, &weights_coarse_graph);
        let uncoarse_graph_imbalance = imbalance(2, &uncoarsed_graph_partition, &weights_uncoarse_graph);
        assert_ulps_eq!(coarse_graph_imbalance, uncoarse_graph_imbalance);
    }

    #[test]
    fn test_coarsen_then_project_restores_assignment() {
        // Arrange
        let graph = grid_graph(6, 6);
        let weights = vec![1.0; 36];
        let mut rng = seeded_rng(Some(5));
        let level = heavy_edge_matching_coarse(&graph, &weights, max_vertex_weight(36.0), &mut rng);
        // A fine assignment that is constant on every matched pair.
        let fine_partition: Vec<usize> = level.fine_to_coarse.iter().map(|&coarse| coarse % 2).collect();
        let mut coarse_partition = vec![0; level.graph.len()];
        for (vertex, &coarse) in level.fine_to_coarse.iter().enumerate() {
            coarse_partition[coarse] = fine_partition[vertex];
        }

        // Act
        let projected = project_partition(&coarse_partition, &level.fine_to_coarse);

        // Assert
        assert_eq!(projected, fine_partition);
    }

    #[test]
    fn test_project_recomputes_state() {
        // Arrange
        let graph = grid_graph(6, 6);
        let weights = vec![1.0; 36];
        let mut rng = seeded_rng(Some(5));
        let level = heavy_edge_matching_coarse(&graph, &weights, max_vertex_weight(36.0), &mut rng);
        let coarse_state = initial_bisection(&level.graph, &level.weights, [0.5, 0.5], &BisectionConfig::default(), &mut rng);

        // Act
        let state = project(
            &graph,
            &weights,
            &level.fine_to_coarse,
            &coarse_state.partition,
            [18.0, 18.0],
            &BisectionConfig::default(),
            &mut rng,
        );

        // Assert
        assert_ulps_eq!(state.cut, graph.edge_cut(&state.partition), epsilon = 1e-9);
        assert_eq!(state.partition.len(), 36);
        assert_ulps_eq!(state.part_weights[0] + state.part_weights[1], 36.0);
    }

    #[test]
    fn test_multilevel_bisection_of_grid() {
        // Arrange
        let graph = grid_graph(16, 16);
        let weights = vec![1.0; 256];
        let tolerance = average_part_weight_slack(256.0, 256) + 1.0;

        for seed in 0..6 {
            let mut rng = seeded_rng(Some(seed));

            // Act
            let state = multilevel_bisection(&graph, &weights, [0.5, 0.5], &BisectionConfig::default(), &mut rng);

            // Assert
            assert_ulps_eq!(state.cut, graph.edge_cut(&state.partition), epsilon = 1e-9);
            assert!(state.cut < 64.0);
            assert!(
                (state.part_weights[0] - 128.0).abs() <= tolerance,
                "seed {seed} part weight {}",
                state.part_weights[0]
            );
        }
    }
}
