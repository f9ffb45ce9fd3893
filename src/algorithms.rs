use std::fmt;

use crate::topology::NodeId;

mod balance;
mod coarsen;
mod fm_refiner;
mod gain_queue;
mod initial_bisection;
mod multilevel_bisection;
mod recursive_bisection;
mod refinement;

pub use recursive_bisection::{PartitionMetadata, RecursiveBisection};

/// Reasons a topology cannot be turned into a partitionable graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphDefect {
    /// A pseudo node must join exactly two neighbors.
    PseudoDegree { node: NodeId, degree: usize },

    /// The requested node does not exist.
    UnknownNode { node: NodeId },

    /// A link references a node that does not exist.
    UnknownEndpoint { node: NodeId },

    /// Two nodes share the same id.
    DuplicateNode { node: NodeId },
}

impl fmt::Display for GraphDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphDefect::PseudoDegree { node, degree } => write!(
                f,
                "pseudo node {node} has {degree} neighbors, expected 2",
            ),
            GraphDefect::UnknownNode { node } => write!(f, "node {node} does not exist"),
            GraphDefect::UnknownEndpoint { node } => write!(f, "link endpoint {node} does not exist"),
            GraphDefect::DuplicateNode { node } => write!(f, "node id {node} is used more than once"),
        }
    }
}

/// Common errors thrown by algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The number of parts is below two or above the number of vertices.
    InvalidPartitionCount { requested: usize, vertices: usize },

    /// The input graph is malformed.
    InvalidGraph(GraphDefect),

    /// Input sets don't have matching lengths.
    InputLenMismatch { expected: usize, actual: usize },

    /// Input contains negative values and such values are not supported.
    NegativeValues,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPartitionCount { requested, vertices } => write!(
                f,
                "cannot split {vertices} nodes into {requested} partitions (need 2 <= partitions <= nodes)",
            ),
            Error::InvalidGraph(defect) => write!(f, "invalid topology: {defect}"),
            Error::InputLenMismatch { expected, actual } => write!(
                f,
                "input sets don't have the same length (expected {expected} items, got {actual})",
            ),
            Error::NegativeValues => write!(f, "input contains negative values"),
        }
    }
}

impl std::error::Error for Error {}

impl From<GraphDefect> for Error {
    fn from(defect: GraphDefect) -> Self {
        Error::InvalidGraph(defect)
    }
}
