//! Error types for the graph engine.

use thiserror::Error;

//-----------------------------------------------------------------------------

/// Invalid arguments to a windowed query.
///
/// Queries report these errors before changing any state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("centre node {centre} is out of range (graph has {nodes} nodes)")]
    CentreOutOfRange { centre: usize, nodes: usize },

    #[error("centre node {0} is a sentinel")]
    SentinelCentre(usize),
}

/// Errors from the global layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Some nodes never had all of their predecessors placed, which means that the graph contains a cycle.
    #[error("{count} nodes could not be placed; the graph is not a directed acyclic graph")]
    Unplaced { count: usize },
}

/// Errors from operations on a [`crate::Subgraph`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubgraphError {
    #[error("node {0} is not in the subgraph")]
    NoSuchNode(usize),

    #[error("edge {0} is not in the subgraph")]
    NoSuchEdge(usize),

    /// The operation is not available for synthetic node kinds.
    #[error("{operation} is not supported for {kind} node {node}")]
    Unsupported { node: usize, kind: &'static str, operation: &'static str },

    /// A node reached in topological order has no genome set.
    #[error("node {0} has no genome set")]
    MissingGenomes(usize),
}

//-----------------------------------------------------------------------------
