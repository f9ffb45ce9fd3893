use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator};
use rayon::iter::ParallelIterator as _;
use std::iter::{Cloned, Zip};
use std::ops::Range;
use std::slice::Iter;
use sprs::{CsMat, TriMat};

/// Struct that represents an undirected weighted graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// The CsMat (from sprs) is used to store the graph as a symmetric sparse matrix in CSR format
    pub graph_csr: CsMat<f64>
}

impl Graph {

    /// Build a graph from an undirected edge list.
    ///
    /// Both directions are stored, self-loops are dropped, negative weights are
    /// clamped to zero and duplicate edges are merged by summing their weights.
    /// Every endpoint must be smaller than `num_vertices`.
    pub fn from_edges<I>(num_vertices: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut triplet_matrix = TriMat::new((num_vertices, num_vertices));

        for (vertex1, vertex2, edge_weight) in edges {
            if vertex1 == vertex2 {
                continue;
            }
            let edge_weight = edge_weight.max(0.0);
            triplet_matrix.add_triplet(vertex1, vertex2, edge_weight);
            triplet_matrix.add_triplet(vertex2, vertex1, edge_weight);
        }

        Self {
            graph_csr: triplet_matrix.to_csr()
        }
    }

    /// The number of vertices in the graph.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.graph_csr.rows(), self.graph_csr.cols());
        self.graph_csr.rows()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn row_range(&self, vertex: usize) -> Range<usize> {
        let indptr = self.graph_csr.indptr().into_raw_storage();
        indptr[vertex]..indptr[vertex + 1]
    }

    /// An iterator over the neighbors of the given vertex, sorted by vertex id.
    pub fn neighbors(&self, vertex: usize) -> Zip<Cloned<Iter<'_, usize>>, Cloned<Iter<'_, f64>>> {
        let range = self.row_range(vertex);
        let indices = &self.graph_csr.indices()[range.clone()];
        let data = &self.graph_csr.data()[range];
        indices.iter().cloned().zip(data.iter().cloned())
    }

    /// Number of distinct neighbors of a vertex.
    pub fn degree(&self, vertex: usize) -> usize {
        self.row_range(vertex).len()
    }

    /// Get edge weight for a pair of vertices.
    pub fn get_edge_weight(&self, vertex1: usize, vertex2: usize) -> Option<f64> {
        self.graph_csr.get(vertex1, vertex2).cloned()
    }

    /// Every undirected edge once, as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.len()).flat_map(move |vertex| {
            self.neighbors(vertex)
                .filter(move |(neighbor, _)| *neighbor > vertex)
                .map(move |(neighbor, edge_weight)| (vertex, neighbor, edge_weight))
        })
    }

    /// Sum of the weights of all undirected edges.
    pub fn total_edge_weight(&self) -> f64 {
        self.graph_csr.data().iter().sum::<f64>() / 2.0
    }

    /// The edge cut of a partition.
    ///
    /// Given a partition and a weighted graph, the edge cut of a partition is
    /// defined as the total weight of the edges that link vertices of
    /// different parts.
    ///
    /// # Example
    ///
    /// A partition with two parts (0 and 1)
    /// ```text,ignore
    ///          0
    ///    1*──┆─*────* 0
    ///    ╱ ╲ ┆╱    ╱
    ///  1*  1*┆ <┈┈╱┈┈┈ Dotted line passes through edges that contribute to edge cut.
    ///    ╲ ╱ ┆   ╱     If all edges have a weight of 1 then edge_cut = 3
    ///    1*  ┆╲ ╱
    ///          * 0
    /// ```
    pub fn edge_cut(&self, partition: &[usize]) -> f64
    {
        debug_assert_eq!(self.len(), partition.len());

        let indptr = self.graph_csr.indptr().into_raw_storage();
        let indices = self.graph_csr.indices();
        let data = self.graph_csr.data();
        indptr
            .par_iter()
            .zip(&indptr[1..])
            .enumerate()
            .map(|(vertex, (start, end))| {
                let neighbors = &indices[*start..*end];
                let edge_weights = &data[*start..*end];
                let vertex_part = partition[vertex];
                neighbors
                    .iter()
                    .zip(edge_weights)
                    .take_while(|(neighbor, _edge_weight)| **neighbor < vertex)
                    .filter(|(neighbor, _edge_weight)| vertex_part != partition[**neighbor])
                    .map(|(_neighbor, edge_weight)| *edge_weight)
                    .sum::<f64>()
            })
            .sum()
    }

    /// The subgraph induced by `vertices`.
    ///
    /// Vertex `i` of the result is `vertices[i]` of `self`. Edges with an
    /// endpoint outside of `vertices` are dropped.
    pub fn induced_subgraph(&self, vertices: &[usize]) -> Graph {
        let mut local_index = vec![None; self.len()];
        for (index, &vertex) in vertices.iter().enumerate() {
            local_index[vertex] = Some(index);
        }

        let mut triplet_matrix = TriMat::new((vertices.len(), vertices.len()));
        for (index, &vertex) in vertices.iter().enumerate() {
            for (neighbor, edge_weight) in self.neighbors(vertex) {
                if let Some(neighbor_index) = local_index[neighbor] {
                    triplet_matrix.add_triplet(index, neighbor_index, edge_weight);
                }
            }
        }

        Graph {
            graph_csr: triplet_matrix.to_csr()
        }
    }
}
