use rand::Rng;
use tracing::{debug, info};

use crate::algorithms::multilevel_bisection::{multilevel_bisection, BisectionConfig};
use crate::algorithms::Error;
use crate::graph::Graph;
use crate::imbalance::compute_parts_load;
use crate::random::seeded_rng;
use crate::Partition;

fn normalized(ratios: &[f64]) -> Vec<f64> {
    let total: f64 = ratios.iter().sum();
    ratios.iter().map(|ratio| ratio / total).collect()
}

// Bisects `graph`, labels both sides and recurses into each side until every
// subgraph carries a single part. `labels` maps local vertices to the vertices
// of the input graph. Returns the sum of the cuts of all bisections.
fn recursive_bisection<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    num_of_partitions: usize,
    target_ratios: &[f64],
    first_part: usize,
    labels: &[usize],
    part_ids: &mut [usize],
    config: &BisectionConfig,
    rng: &mut R,
) -> f64 {
    if num_of_partitions <= 1 {
        for &label in labels {
            part_ids[label] = first_part;
        }
        return 0.0;
    }

    // Not enough vertices left to fill every part: one vertex per part.
    if graph.len() < num_of_partitions {
        for (offset, &label) in labels.iter().enumerate() {
            part_ids[label] = first_part + offset;
        }
        return graph.total_edge_weight();
    }

    let left_partitions = num_of_partitions / 2;
    let left_ratio: f64 = target_ratios[..left_partitions].iter().sum();
    let state = multilevel_bisection(graph, weights, [left_ratio, 1.0 - left_ratio], config, rng);
    debug!(
        vertices = graph.len(),
        parts = num_of_partitions,
        first_part,
        cut = state.cut,
        weights = ?state.part_weights,
        "bisection"
    );

    for (vertex, &side) in state.partition.iter().enumerate() {
        part_ids[labels[vertex]] = if side == 0 { first_part } else { first_part + left_partitions };
    }

    let mut cut = state.cut;
    if num_of_partitions > 2 {
        let (left_vertices, right_vertices): (Vec<usize>, Vec<usize>) =
            (0..graph.len()).partition(|&vertex| state.partition[vertex] == 0);

        let halves = [
            (left_vertices, left_partitions, &target_ratios[..left_partitions], first_part),
            (
                right_vertices,
                num_of_partitions - left_partitions,
                &target_ratios[left_partitions..],
                first_part + left_partitions,
            ),
        ];

        for (vertices, sub_partitions, sub_ratios, sub_first_part) in halves {
            let subgraph = graph.induced_subgraph(&vertices);
            let sub_weights: Vec<f64> = vertices.iter().map(|&vertex| weights[vertex]).collect();
            let sub_labels: Vec<usize> = vertices.iter().map(|&vertex| labels[vertex]).collect();
            cut += recursive_bisection(
                &subgraph,
                &sub_weights,
                sub_partitions,
                &normalized(sub_ratios),
                sub_first_part,
                &sub_labels,
                part_ids,
                config,
                rng,
            );
        }
    }

    cut
}

/// Diagnostic data of a partitioning run.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionMetadata {
    /// Total weight of the edges between different parts.
    pub edge_cut: f64,

    /// Total vertex weight of every part.
    pub part_weights: Vec<f64>,
}

/// Multilevel Recursive Bisection
///
/// Splits a graph into `num_of_partitions` parts of (nearly) equal vertex
/// weight by repeated multilevel bisection: heavy edge matching coarsening,
/// breadth-first initial bisection, boundary balancing and FM refinement.
///
/// # Example
///
/// ```rust
/// use topocut::algorithms::RecursiveBisection;
/// use topocut::graph::Graph;
/// use topocut::Partition;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
///
///     let graph = Graph::from_edges(6, (0..6).map(|vertex| (vertex, (vertex + 1) % 6, 1.0)));
///     let weights = vec![1.0; 6];
///     let mut partition = vec![0; graph.len()];
///
///     let metadata = RecursiveBisection { seed: Some(5), ..Default::default() }
///         .partition(&mut partition, (&graph, weights.as_slice()))?;
///
///     assert_eq!(metadata.edge_cut, 2.0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecursiveBisection {
    /// Number of partitions
    pub num_of_partitions: usize,

    /// Seed for the random choices of the run. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Coarsening stops once a graph has at most this many vertices.
    pub coarsen_to: usize,

    /// Maximum number of balancing passes after every projection.
    pub balance_passes: usize,

    /// Maximum number of FM refinement passes after every projection.
    pub refine_passes: usize,
}

impl Default for RecursiveBisection {
    fn default() -> Self {
        let bisection = BisectionConfig::default();
        RecursiveBisection {
            num_of_partitions: 2,
            seed: None,
            coarsen_to: bisection.coarsen_to,
            balance_passes: bisection.balance_passes,
            refine_passes: bisection.refine_passes,
        }
    }
}

impl<'a> Partition<(&'a Graph, &'a [f64])> for RecursiveBisection {
    type Metadata = PartitionMetadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [usize],
        (adjacency, weights): (&'a Graph, &'a [f64]),
    ) -> Result<Self::Metadata, Self::Error> {

        if part_ids.len() != weights.len() {
            return Err(Error::InputLenMismatch {
                expected: part_ids.len(),
                actual: weights.len(),
            });
        }
        if part_ids.len() != adjacency.len() {
            return Err(Error::InputLenMismatch {
                expected: part_ids.len(),
                actual: adjacency.len(),
            });
        }
        if weights.iter().any(|weight| !(*weight >= 0.0)) {
            return Err(Error::NegativeValues);
        }
        if self.num_of_partitions < 2 || self.num_of_partitions > adjacency.len() {
            return Err(Error::InvalidPartitionCount {
                requested: self.num_of_partitions,
                vertices: adjacency.len(),
            });
        }

        let config = BisectionConfig {
            coarsen_to: self.coarsen_to,
            balance_passes: self.balance_passes,
            refine_passes: self.refine_passes,
        };
        let mut rng = seeded_rng(self.seed);
        let labels: Vec<usize> = (0..adjacency.len()).collect();
        let target_ratios = vec![1.0 / self.num_of_partitions as f64; self.num_of_partitions];
        let mut assignment = vec![0; adjacency.len()];

        let bisection_cut = recursive_bisection(
            adjacency,
            weights,
            self.num_of_partitions,
            &target_ratios,
            0,
            &labels,
            &mut assignment,
            &config,
            &mut rng,
        );

        // Copy over the final partition to the partition array which is passed as input.
        part_ids.copy_from_slice(&assignment);
        let edge_cut = adjacency.edge_cut(part_ids);
        let part_weights = compute_parts_load(part_ids, self.num_of_partitions, weights);
        info!(
            vertices = adjacency.len(),
            parts = self.num_of_partitions,
            edge_cut,
            bisection_cut,
            "partitioning finished"
        );

        Ok(PartitionMetadata { edge_cut, part_weights })
    }
}
