use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::{Error, GraphDefect};
use crate::graph::Graph;

/// Stable external identifier of a topology node.
pub type NodeId = u32;

/// Link bandwidths are divided by this to get edge weights.
pub const BANDWIDTH_NORMALIZATION: f64 = 1_000_000.0;

/// Category of an emulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Host,
    Router,
    Switch,
    Hub,
    /// Placeholder for a link drawn across two canvases. Merged away before partitioning.
    Pseudo,
}

impl NodeKind {
    /// Emulation cost of a node that does not carry its own weight.
    pub fn default_weight(self) -> f64 {
        match self {
            NodeKind::Router => 2.0,
            NodeKind::Host | NodeKind::Switch | NodeKind::Hub => 1.0,
            NodeKind::Pseudo => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    #[serde(default)]
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Node {
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or_else(|| self.kind.default_weight())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub a: NodeId,
    pub b: NodeId,

    /// Bandwidth in bits per second.
    #[serde(default)]
    pub bandwidth: f64,
}

impl Link {
    /// Edge weight of the link. Zero or negative bandwidth gives zero.
    pub fn weight(&self) -> f64 {
        if self.bandwidth > 0.0 {
            self.bandwidth / BANDWIDTH_NORMALIZATION
        } else {
            0.0
        }
    }
}

/// A topology document: `{ "nodes": [...], "links": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub links: Vec<Link>,
}

/// Two nodes that were joined through a pseudo node and whose link has to be
/// rebuilt when they end up in different parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: f64,
}

/// The partitioning graph of a topology, with the external id of every vertex.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    pub graph: Graph,
    pub weights: Vec<f64>,
    pub node_ids: Vec<NodeId>,
    index: FxHashMap<NodeId, usize>,
}

fn index_node_ids(node_ids: &[NodeId]) -> FxHashMap<NodeId, usize> {
    node_ids.iter().enumerate().map(|(vertex, &id)| (id, vertex)).collect()
}

impl TopologyGraph {
    /// Build the graph of the given nodes and links. Vertex `i` is `nodes[i]`.
    pub fn build(nodes: &[Node], links: &[Link]) -> Result<Self, Error> {
        let mut index = FxHashMap::with_capacity_and_hasher(nodes.len(), Default::default());
        let mut weights = Vec::with_capacity(nodes.len());

        for (vertex, node) in nodes.iter().enumerate() {
            if index.insert(node.id, vertex).is_some() {
                return Err(GraphDefect::DuplicateNode { node: node.id }.into());
            }
            let weight = node.weight();
            if !(weight >= 0.0) {
                return Err(Error::NegativeValues);
            }
            weights.push(weight);
        }

        let mut edges = Vec::with_capacity(links.len());
        for link in links {
            let endpoint = |node: NodeId| {
                index
                    .get(&node)
                    .copied()
                    .ok_or(Error::InvalidGraph(GraphDefect::UnknownEndpoint { node }))
            };
            edges.push((endpoint(link.a)?, endpoint(link.b)?, link.weight()));
        }

        Ok(TopologyGraph {
            graph: Graph::from_edges(nodes.len(), edges),
            weights,
            node_ids: nodes.iter().map(|node| node.id).collect(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Vertex of the node with the given id.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Remove the pseudo node `pseudo` and link its two neighbors directly.
    ///
    /// The new link carries the heavier of the two half links. Vertices after
    /// the removed one shift down by one. On error the graph is left as is.
    pub fn merge_pseudo(&mut self, pseudo: NodeId) -> Result<SplitRecord, Error> {
        let removed = self
            .index_of(pseudo)
            .ok_or(Error::InvalidGraph(GraphDefect::UnknownNode { node: pseudo }))?;

        let half_links: Vec<(usize, f64)> = self.graph.neighbors(removed).collect();
        let &[(vertex1, weight1), (vertex2, weight2)] = half_links.as_slice() else {
            return Err(GraphDefect::PseudoDegree { node: pseudo, degree: half_links.len() }.into());
        };
        let weight = weight1.max(weight2);

        let reindex = |vertex: usize| if vertex > removed { vertex - 1 } else { vertex };
        let edges: Vec<(usize, usize, f64)> = self
            .graph
            .edges()
            .filter(|&(u, v, _)| u != removed && v != removed)
            .map(|(u, v, edge_weight)| (reindex(u), reindex(v), edge_weight))
            .chain(std::iter::once((reindex(vertex1), reindex(vertex2), weight)))
            .collect();

        let record = SplitRecord {
            a: self.node_ids[vertex1],
            b: self.node_ids[vertex2],
            weight,
        };

        self.graph = Graph::from_edges(self.graph.len() - 1, edges);
        self.weights.remove(removed);
        self.node_ids.remove(removed);
        self.index = index_node_ids(&self.node_ids);

        debug!(pseudo, a = record.a, b = record.b, weight, "merged pseudo node");
        Ok(record)
    }
}

impl Topology {
    /// Build the partitioning graph and merge every pseudo node, in id order.
    ///
    /// A chain of pseudo nodes collapses into one split record between the
    /// real nodes at its ends.
    pub fn prepare(&self) -> Result<(TopologyGraph, Vec<SplitRecord>), Error> {
        let mut topology_graph = TopologyGraph::build(&self.nodes, &self.links)?;

        let mut pseudo_nodes: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Pseudo)
            .map(|node| node.id)
            .collect();
        pseudo_nodes.sort_unstable();

        let mut splits: Vec<SplitRecord> = Vec::with_capacity(pseudo_nodes.len());
        for pseudo in pseudo_nodes {
            let record = topology_graph.merge_pseudo(pseudo)?;
            splits.retain(|split| split.a != pseudo && split.b != pseudo);
            splits.push(record);
        }

        Ok((topology_graph, splits))
    }
}
