// Two-way partition state shared by the balancer and the FM refiner.

use crate::algorithms::gain_queue::GainQueues;
use crate::graph::Graph;

/// Tolerance for comparing accumulated float weights.
pub(crate) const WEIGHT_EPSILON: f64 = 1e-9;

pub(crate) fn is_zero(value: f64) -> bool {
    value.abs() <= WEIGHT_EPSILON
}

/// Index set of boundary vertices with O(1) insertion and removal.
#[derive(Debug, Clone)]
pub(crate) struct BoundarySet {
    indices: Vec<usize>,
    position: Vec<Option<usize>>,
}

impl BoundarySet {
    pub(crate) fn new(num_vertices: usize) -> Self {
        BoundarySet {
            indices: Vec::new(),
            position: vec![None; num_vertices],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub(crate) fn contains(&self, vertex: usize) -> bool {
        self.position[vertex].is_some()
    }

    pub(crate) fn vertices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn insert(&mut self, vertex: usize) {
        if self.contains(vertex) {
            return;
        }
        self.indices.push(vertex);
        self.position[vertex] = Some(self.indices.len() - 1);
    }

    pub(crate) fn delete(&mut self, vertex: usize) {
        let Some(index) = self.position[vertex].take() else {
            return;
        };
        self.indices.swap_remove(index);
        if let Some(&moved) = self.indices.get(index) {
            self.position[moved] = Some(index);
        }
    }
}

/// Complete state of a bisection: side labels, internal/external degrees,
/// boundary, side weights and edge cut.
#[derive(Debug, Clone)]
pub(crate) struct RefinementState {
    pub(crate) partition: Vec<usize>,

    // Weight of the edges to vertices on the same side.
    pub(crate) id: Vec<f64>,

    // Weight of the edges to vertices on the other side.
    pub(crate) ed: Vec<f64>,

    pub(crate) boundary: BoundarySet,
    pub(crate) part_weights: [f64; 2],
    pub(crate) cut: f64,
}

impl RefinementState {
    /// Derive the whole state of `partition` from scratch.
    pub(crate) fn compute(graph: &Graph, weights: &[f64], partition: Vec<usize>) -> Self {
        debug_assert_eq!(graph.len(), partition.len());
        debug_assert_eq!(graph.len(), weights.len());

        let num_of_vertices = graph.len();
        let mut id = vec![0.0; num_of_vertices];
        let mut ed = vec![0.0; num_of_vertices];
        let mut boundary = BoundarySet::new(num_of_vertices);
        let mut part_weights = [0.0; 2];
        let mut cut = 0.0;

        for vertex in 0..num_of_vertices {
            let side = partition[vertex];
            part_weights[side] += weights[vertex];

            for (neighbor, edge_weight) in graph.neighbors(vertex) {
                if partition[neighbor] == side {
                    id[vertex] += edge_weight;
                } else {
                    ed[vertex] += edge_weight;
                }
            }

            // Isolated vertices stay on the boundary so that the balancer can move them.
            if ed[vertex] > WEIGHT_EPSILON || graph.degree(vertex) == 0 {
                boundary.insert(vertex);
                cut += ed[vertex];
            }
        }

        RefinementState {
            partition,
            id,
            ed,
            boundary,
            part_weights,
            cut: cut / 2.0,
        }
    }

    /// Reduction of the edge cut obtained by moving `vertex` to the other side.
    pub(crate) fn gain(&self, vertex: usize) -> f64 {
        self.ed[vertex] - self.id[vertex]
    }

    /// Move `vertex` to the other side and update every derived value.
    ///
    /// When `queues` is given, each neighbor that is not `locked` is deleted
    /// from, updated in or inserted into the queue of its side so that the
    /// queues keep holding exactly the unlocked boundary vertices.
    pub(crate) fn apply_move(
        &mut self,
        graph: &Graph,
        weights: &[f64],
        vertex: usize,
        mut queues: Option<&mut GainQueues>,
        locked: &[bool],
    ) {
        let from = self.partition[vertex];
        let to = 1 - from;

        self.cut -= self.gain(vertex);
        self.part_weights[from] -= weights[vertex];
        self.part_weights[to] += weights[vertex];
        self.partition[vertex] = to;
        std::mem::swap(&mut self.id[vertex], &mut self.ed[vertex]);

        let has_neighbors = graph.degree(vertex) > 0;
        if is_zero(self.ed[vertex]) && has_neighbors {
            self.boundary.delete(vertex);
        } else if self.ed[vertex] > WEIGHT_EPSILON {
            self.boundary.insert(vertex);
        }

        for (neighbor, edge_weight) in graph.neighbors(vertex) {
            let signed_weight = if self.partition[neighbor] == to { edge_weight } else { -edge_weight };
            self.id[neighbor] += signed_weight;
            self.ed[neighbor] -= signed_weight;

            let neighbor_side = self.partition[neighbor];
            let neighbor_gain = self.gain(neighbor);
            let queue = match queues.as_deref_mut() {
                Some(queues) if !locked[neighbor] => Some(&mut queues.sides[neighbor_side]),
                _ => None,
            };

            if self.boundary.contains(neighbor) {
                if is_zero(self.ed[neighbor]) {
                    self.boundary.delete(neighbor);
                    if let Some(queue) = queue {
                        queue.delete(neighbor);
                    }
                } else if let Some(queue) = queue {
                    queue.update(neighbor, neighbor_gain);
                }
            } else if self.ed[neighbor] > WEIGHT_EPSILON {
                self.boundary.insert(neighbor);
                if let Some(queue) = queue {
                    queue.insert(neighbor, neighbor_gain);
                }
            }
        }
    }
}

/// Slack allowed around the target weight of a side: `min(total / 20, 2 * total / n)`.
pub(crate) fn average_part_weight_slack(total_weight: f64, num_of_vertices: usize) -> f64 {
    if num_of_vertices == 0 {
        return 0.0;
    }
    (total_weight / 20.0).min(2.0 * total_weight / num_of_vertices as f64)
}

/// Distance between the weight of side 0 and its target.
pub(crate) fn deviation(part_weights: [f64; 2], targets: [f64; 2]) -> f64 {
    (targets[0] - part_weights[0]).abs()
}
