//! # Seqgraph-view: a graph engine for interactive sequence graph viewers.
//!
//! This crate keeps a large directed sequence graph compactly in memory and answers the two questions a viewer asks all the time:
//! where each node should be drawn, and which nodes lie within a number of hops of the current centre.
//! Parsing the source file, rendering, and user interaction are left to the application.
//!
//! ### Basic concepts
//!
//! The whole graph is stored in a [`CompactGraph`], which is built once with [`CompactGraphBuilder`] and then frozen.
//! Nodes are identified by integers.
//! Node `0` is a synthetic source sentinel and the last node is a synthetic sink sentinel.
//! Every node without predecessors is connected to the source, and every node without successors is connected to the sink.
//! Each node and edge remembers a byte offset in the source file, which can be used for retrieving metadata later.
//!
//! [`GraphIterator`] provides the traversal primitives over the frozen graph.
//! [`FafospLayout`] assigns global coordinates to every node once, after the graph has been built.
//!
//! ### Windows
//!
//! [`WindowedQuery`] maintains a cache of the nodes within a radius of a centre node.
//! The cache is a [`Subgraph`]: a mutable object graph with segment nodes for the nodes of the global graph.
//! Small changes to the centre or the radius grow the cache incrementally using a [`DistanceIndex`].
//! A window-local layout ([`WindowLayout`]) is computed on a background thread, and the application is notified through [`QueryEvent`]s.
//!
//! Before rendering, [`BubbleAggregator`] can fold simple bubbles into aggregate nodes, and [`PathAttributor`] can attribute each edge with the genomes traversing it.
//! Genome information comes from segment metadata, which [`metadata::MetadataFetcher`] retrieves in the background.

pub mod aggregate;
pub mod compact;
pub mod distance;
pub mod error;
pub mod fafosp;
pub mod metadata;
pub mod paths;
pub mod query;
pub mod subgraph;
pub mod traversal;
pub mod utils;
pub mod window;

pub use aggregate::BubbleAggregator;
pub use compact::{CompactGraph, CompactGraphBuilder, Direction, EdgeEntry, EdgeIter};
pub use distance::DistanceIndex;
pub use error::{LayoutError, QueryError, SubgraphError};
pub use fafosp::FafospLayout;
pub use paths::PathAttributor;
pub use query::{EventSink, QueryEvent, QueryPolicy, WindowedQuery};
pub use subgraph::Subgraph;
pub use traversal::GraphIterator;
pub use window::WindowLayout;

#[cfg(test)]
mod internal;
