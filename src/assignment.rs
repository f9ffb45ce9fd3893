use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::algorithms::{Error, GraphDefect, RecursiveBisection};
use crate::imbalance::{compute_imbalance_from_part_loads, compute_parts_load};
use crate::topology::{NodeId, SplitRecord, Topology, TopologyGraph};
use crate::Partition;

/// Size of one part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSummary {
    pub part: usize,
    pub num_nodes: usize,
    pub weight: f64,
}

/// A pseudo split link whose two ends landed in different parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryLink {
    pub a: NodeId,
    pub b: NodeId,
    pub part_a: usize,
    pub part_b: usize,
    pub weight: f64,
}

/// Partition labels of a topology, keyed by node id. Only real nodes are labelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionReport {
    pub assignments: BTreeMap<NodeId, usize>,
    pub parts: Vec<PartSummary>,
    pub boundary_links: Vec<BoundaryLink>,
    pub edge_cut: f64,
    pub imbalance: f64,
}

/// Write the labels of `part_ids` back onto the nodes of `topology_graph`.
///
/// Pseudo nodes were merged away by [`Topology::prepare`] and have no entry in
/// `assignments`; the links they carried show up in `boundary_links` instead.
/// Boundary links follow the order of `splits`. Nothing is built when a split
/// names a node that is not in the graph.
pub fn apply_partition(
    topology_graph: &TopologyGraph,
    part_ids: &[usize],
    num_parts: usize,
    splits: &[SplitRecord],
) -> Result<PartitionReport, Error> {
    if part_ids.len() != topology_graph.len() {
        return Err(Error::InputLenMismatch {
            expected: topology_graph.len(),
            actual: part_ids.len(),
        });
    }

    let mut boundary_links = Vec::new();
    for split in splits {
        let endpoint = |node: NodeId| {
            topology_graph
                .index_of(node)
                .ok_or(Error::InvalidGraph(GraphDefect::UnknownEndpoint { node }))
        };
        let part_a = part_ids[endpoint(split.a)?];
        let part_b = part_ids[endpoint(split.b)?];
        if part_a != part_b {
            boundary_links.push(BoundaryLink {
                a: split.a,
                b: split.b,
                part_a,
                part_b,
                weight: split.weight,
            });
        }
    }

    let assignments: BTreeMap<NodeId, usize> = topology_graph
        .node_ids
        .iter()
        .copied()
        .zip(part_ids.iter().copied())
        .collect();

    let loads = compute_parts_load(part_ids, num_parts, &topology_graph.weights);
    let mut counts = vec![0; num_parts];
    for &part in part_ids {
        if part < num_parts {
            counts[part] += 1;
        }
    }
    let parts = loads
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(part, (&weight, &num_nodes))| PartSummary { part, num_nodes, weight })
        .collect();

    Ok(PartitionReport {
        assignments,
        parts,
        boundary_links,
        edge_cut: topology_graph.graph.edge_cut(part_ids),
        imbalance: compute_imbalance_from_part_loads(num_parts, &loads),
    })
}

/// Merge the pseudo nodes of `topology`, partition it and report the result.
pub fn partition_topology(
    topology: &Topology,
    partitioner: &mut RecursiveBisection,
) -> Result<PartitionReport, Error> {
    let (topology_graph, splits) = topology.prepare()?;
    let mut part_ids = vec![0; topology_graph.len()];
    partitioner.partition(&mut part_ids, (&topology_graph.graph, topology_graph.weights.as_slice()))?;

    let report = apply_partition(&topology_graph, &part_ids, partitioner.num_of_partitions, &splits)?;
    info!(
        nodes = topology_graph.len(),
        splits = splits.len(),
        boundary_links = report.boundary_links.len(),
        edge_cut = report.edge_cut,
        "topology partitioned"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use crate::topology::{Link, Node, NodeKind};
    use super::*;

    fn node(id: NodeId, kind: NodeKind) -> Node {
        Node { id, kind, weight: None }
    }

    fn link(a: NodeId, b: NodeId) -> Link {
        Link { a, b, bandwidth: 1_000_000.0 }
    }

    // Two host rings of four joined through the pseudo node 100.
    fn split_rings() -> Topology {
        let mut nodes: Vec<Node> = (1..=8).map(|id| node(id, NodeKind::Host)).collect();
        nodes.push(node(100, NodeKind::Pseudo));
        let links = vec![
            link(1, 2), link(2, 3), link(3, 4), link(4, 1),
            link(5, 6), link(6, 7), link(7, 8), link(8, 5),
            link(4, 100), link(100, 5),
        ];
        Topology { nodes, links }
    }

    #[test]
    fn test_apply_partition_reports_parts_and_boundary_links() {
        // Arrange
        let (topology_graph, splits) = split_rings().prepare().unwrap();
        let part_ids = [0, 0, 0, 0, 1, 1, 1, 1];

        // Act
        let report = apply_partition(&topology_graph, &part_ids, 2, &splits).unwrap();

        // Assert
        assert_eq!(report.assignments.len(), 8);
        assert_eq!(report.assignments[&4], 0);
        assert_eq!(report.assignments[&5], 1);
        assert_eq!(
            report.parts,
            vec![
                PartSummary { part: 0, num_nodes: 4, weight: 4.0 },
                PartSummary { part: 1, num_nodes: 4, weight: 4.0 },
            ]
        );
        assert_eq!(
            report.boundary_links,
            vec![BoundaryLink { a: 4, b: 5, part_a: 0, part_b: 1, weight: 1.0 }]
        );
        assert_ulps_eq!(report.edge_cut, 1.0);
        assert_ulps_eq!(report.imbalance, 0.0);
    }

    #[test]
    fn test_pseudo_nodes_are_not_assigned() {
        // Arrange
        let (topology_graph, splits) = split_rings().prepare().unwrap();
        let part_ids = [0, 0, 0, 0, 1, 1, 1, 1];

        // Act
        let report = apply_partition(&topology_graph, &part_ids, 2, &splits).unwrap();

        // Assert
        assert!(!report.assignments.contains_key(&100));
        assert!(report.assignments.keys().copied().eq(1..=8));
        assert_eq!(report.parts.iter().map(|part| part.num_nodes).sum::<usize>(), 8);
    }

    #[test]
    fn test_split_inside_a_part_is_not_a_boundary_link() {
        // Arrange
        let (topology_graph, splits) = split_rings().prepare().unwrap();
        let part_ids = [0, 0, 1, 1, 1, 1, 0, 0];

        // Act
        let report = apply_partition(&topology_graph, &part_ids, 2, &splits).unwrap();

        // Assert
        assert!(report.boundary_links.is_empty());
    }

    #[test]
    fn test_apply_partition_is_idempotent() {
        // Arrange
        let (topology_graph, splits) = split_rings().prepare().unwrap();
        let part_ids = [1, 0, 1, 0, 1, 0, 1, 0];

        // Act
        let first = apply_partition(&topology_graph, &part_ids, 2, &splits).unwrap();
        let second = apply_partition(&topology_graph, &part_ids, 2, &splits).unwrap();

        // Assert
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_partition_validates_input() {
        // Arrange
        let (topology_graph, _) = split_rings().prepare().unwrap();
        let stale_split = [SplitRecord { a: 1, b: 100, weight: 1.0 }];

        // Act
        let short = apply_partition(&topology_graph, &[0, 1], 2, &[]);
        let stale = apply_partition(&topology_graph, &[0; 8], 2, &stale_split);

        // Assert
        assert_eq!(short, Err(Error::InputLenMismatch { expected: 8, actual: 2 }));
        assert_eq!(stale, Err(Error::InvalidGraph(GraphDefect::UnknownEndpoint { node: 100 })));
    }

    #[test]
    fn test_partition_topology_cuts_the_bridge() {
        // Arrange
        let topology = split_rings();
        let mut partitioner = RecursiveBisection { num_of_partitions: 2, seed: Some(5), ..Default::default() };

        // Act
        let report = partition_topology(&topology, &mut partitioner).unwrap();

        // Assert
        assert_ulps_eq!(report.edge_cut, 1.0);
        assert_eq!(report.assignments.len(), 8);
        assert_ne!(report.assignments[&4], report.assignments[&5]);
        assert_eq!(report.boundary_links.len(), 1);
        assert!(report.parts.iter().all(|part| part.num_nodes == 4));
    }

    #[test]
    fn test_partition_topology_rejects_bad_part_count() {
        // Arrange
        let topology = split_rings();
        let mut partitioner = RecursiveBisection { num_of_partitions: 9, seed: Some(5), ..Default::default() };

        // Act
        let result = partition_topology(&topology, &mut partitioner);

        // Assert
        assert_eq!(result, Err(Error::InvalidPartitionCount { requested: 9, vertices: 8 }));
    }

    #[test]
    fn test_malformed_pseudo_node_is_rejected() {
        // Arrange
        let mut topology = split_rings();
        topology.links.push(link(100, 1));
        let mut partitioner = RecursiveBisection::default();

        // Act
        let result = partition_topology(&topology, &mut partitioner);

        // Assert
        assert_eq!(result, Err(Error::InvalidGraph(GraphDefect::PseudoDegree { node: 100, degree: 3 })));
    }
}
