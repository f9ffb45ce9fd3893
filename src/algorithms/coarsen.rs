use rand::Rng;
use rustc_hash::FxHashMap;
use sprs::TriMat;
use tracing::debug;

use crate::graph::Graph;
use crate::random::chunked_permutation;

/// Coarsening stops once a level has at most this many vertices.
pub(crate) const COARSEN_TO: usize = 20;

/// One coarsening step: the coarse graph and how the finer level maps onto it.
#[derive(Debug, Clone)]
pub(crate) struct CoarseLevel {
    pub(crate) graph: Graph,
    pub(crate) weights: Vec<f64>,

    // Coarse vertex of every vertex of the finer level.
    pub(crate) fine_to_coarse: Vec<usize>,

    // Matched partner of every vertex of the finer level, itself when unmatched.
    pub(crate) partner: Vec<usize>,
}

/// Heaviest vertex a matching may create: `1.5 * total / COARSEN_TO`.
pub(crate) fn max_vertex_weight(total_weight: f64) -> f64 {
    1.5 * total_weight / COARSEN_TO as f64
}

/// Coarsen the graph level by level until it has at most `coarsen_to`
/// vertices or a step fails to shrink it.
///
/// The returned levels go from finest to coarsest; the first level maps the
/// vertices of `graph` itself.
pub(crate) fn coarsen_graph<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    coarsen_to: usize,
    rng: &mut R,
) -> Vec<CoarseLevel> {
    let max_weight = max_vertex_weight(weights.iter().sum());
    let mut levels: Vec<CoarseLevel> = Vec::new();

    loop {
        let (current_graph, current_weights) = match levels.last() {
            Some(level) => (&level.graph, level.weights.as_slice()),
            None => (graph, weights),
        };
        if current_graph.len() <= coarsen_to {
            break;
        }

        let level = heavy_edge_matching_coarse(current_graph, current_weights, max_weight, rng);
        let matched = level.partner.iter().enumerate().filter(|&(vertex, &mate)| vertex != mate).count();
        debug!(
            level = levels.len(),
            fine_vertices = current_graph.len(),
            coarse_vertices = level.graph.len(),
            matched,
            "coarsening step"
        );

        if level.graph.len() >= current_graph.len() {
            break;
        }
        levels.push(level);
    }

    levels
}

// This function coarsens the graph using heavy edge matching algorithm.
pub(crate) fn heavy_edge_matching_coarse<R: Rng + ?Sized>(
    graph: &Graph,
    weights: &[f64],
    max_weight: f64,
    rng: &mut R,
) -> CoarseLevel {
    let num_of_vertices = graph.len();
    let mut partner: Vec<Option<usize>> = vec![None; num_of_vertices];
    let mut fine_vertex_to_coarse_vertex = vec![0; num_of_vertices];
    let mut super_vertex = 0usize;

    // Iterate over the vertices of the graph in a shuffled order.
    for vertex in chunked_permutation(num_of_vertices, num_of_vertices / 8, rng) {
        // If already matched, then ignore
        if partner[vertex].is_some() {
            continue;
        }

        // For each vertex, find its most connected unmatched neighbor whose
        // combined weight stays under the limit.
        let mut heaviest: Option<(usize, f64)> = None;
        for (neighbor_vertex, edge_weight) in graph.neighbors(vertex) {
            if partner[neighbor_vertex].is_some() || weights[vertex] + weights[neighbor_vertex] >= max_weight {
                continue;
            }
            if heaviest.map_or(true, |(_, heaviest_weight)| edge_weight > heaviest_weight) {
                heaviest = Some((neighbor_vertex, edge_weight));
            }
        }

        let mate = heaviest.map_or(vertex, |(neighbor_vertex, _)| neighbor_vertex);
        partner[vertex] = Some(mate);
        partner[mate] = Some(vertex);
        fine_vertex_to_coarse_vertex[vertex] = super_vertex;
        fine_vertex_to_coarse_vertex[mate] = super_vertex;
        super_vertex += 1;
    }

    // We combine the edges of a vertex whose neighbors are merged in the coarse graph.
    // Eg. If vertex 0 is connected to vertex 2 and vertex 3 which are merged into vertex 1 in the
    // coarse graph, then in the coarse graph vertex 0 will be connected to vertex 1 with
    // an edge weight that is the sum of the edges 0-2 and 0-3.
    let mut edge_to_weight_mapping: FxHashMap<(usize, usize), f64> =
        FxHashMap::with_capacity_and_hasher(graph.graph_csr.nnz(), Default::default());

    for vertex in 0..num_of_vertices {
        for (neighbor, edge_weight) in graph.neighbors(vertex) {
            if fine_vertex_to_coarse_vertex[vertex] != fine_vertex_to_coarse_vertex[neighbor] {
                let key = (fine_vertex_to_coarse_vertex[vertex], fine_vertex_to_coarse_vertex[neighbor]);
                *edge_to_weight_mapping.entry(key).or_insert(0.0) += edge_weight;
            }
        }
    }

    // Construction of the coarse graph. First construct a TriMat and then convert it to CSR format.
    let mut triplet_matrix = TriMat::with_capacity((super_vertex, super_vertex), edge_to_weight_mapping.len());
    for (&(vertex1, vertex2), &weight) in edge_to_weight_mapping.iter() {
        triplet_matrix.add_triplet(vertex1, vertex2, weight);
    }
    let coarse_graph = Graph { graph_csr: triplet_matrix.to_csr() };

    // Determine the new weights of the vertices.
    let mut weights_coarse_graph = vec![0.0; super_vertex];
    for vertex in 0..num_of_vertices {
        weights_coarse_graph[fine_vertex_to_coarse_vertex[vertex]] += weights[vertex];
    }

    CoarseLevel {
        graph: coarse_graph,
        weights: weights_coarse_graph,
        fine_to_coarse: fine_vertex_to_coarse_vertex,
        partner: partner.into_iter().enumerate().map(|(vertex, mate)| mate.unwrap_or(vertex)).collect(),
    }
}
