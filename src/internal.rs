use crate::{CompactGraph, CompactGraphBuilder};
use crate::subgraph::{Segment, SegmentMetadata, Subgraph, NodeKey, EdgeKind};

use std::collections::BTreeSet;

//-----------------------------------------------------------------------------

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//-----------------------------------------------------------------------------

// Compact graphs.

// Node `i` in `lengths` gets identifier `i + 1`.
// Node file offsets are `100 * id` and edge file offsets are `1000 + edge index`.
pub(crate) fn build_graph(lengths: &[usize], edges: &[(usize, usize)]) -> CompactGraph {
    let mut builder = CompactGraphBuilder::new();
    for (i, len) in lengths.iter().enumerate() {
        let id = builder.add_node(Some(100 * (i as u64 + 1)), *len);
        assert_eq!(id, i + 1, "Unexpected node identifier");
    }
    for (i, (from, to)) in edges.iter().enumerate() {
        let result = builder.add_edge(*from, *to, Some(1000 + i as u64));
        assert!(result.is_ok(), "Failed to add edge ({}, {}): {}", from, to, result.unwrap_err());
    }
    let graph = builder.build();
    assert!(graph.is_ok(), "Failed to build the graph: {}", graph.unwrap_err());
    graph.unwrap()
}

// 1 -> 2 -> ... -> n with unit lengths.
pub(crate) fn linear_graph(n: usize) -> CompactGraph {
    let lengths = vec![1; n];
    let edges: Vec<(usize, usize)> = (1..n).map(|i| (i, i + 1)).collect();
    build_graph(&lengths, &edges)
}

// 1 -> {2, 3} -> 4, where 2 and 3 have length 1.
pub(crate) fn diamond_graph() -> CompactGraph {
    build_graph(&[5, 1, 1, 7], &[(1, 2), (1, 3), (2, 4), (3, 4)])
}

// A chain of `count` diamonds sharing their boundary nodes.
// Boundary nodes have length 3 and branch nodes length 1.
pub(crate) fn diamond_chain(count: usize) -> CompactGraph {
    let mut lengths = vec![3];
    let mut edges = Vec::new();
    for i in 0..count {
        let start = 3 * i + 1;
        lengths.extend_from_slice(&[1, 1, 3]);
        edges.push((start, start + 1));
        edges.push((start, start + 2));
        edges.push((start + 1, start + 3));
        edges.push((start + 2, start + 3));
    }
    build_graph(&lengths, &edges)
}

//-----------------------------------------------------------------------------

// Subgraphs.

pub(crate) fn genomes(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub(crate) fn metadata(names: &[&str]) -> SegmentMetadata {
    SegmentMetadata::new(genomes(names))
}

// Segment `i` in `lengths` gets global identifier `i + 1`.
// Returns the subgraph and the keys of the segment nodes in the same order.
pub(crate) fn build_subgraph(lengths: &[usize], edges: &[(usize, usize)]) -> (Subgraph, Vec<NodeKey>) {
    let mut subgraph = Subgraph::new();
    let mut keys = Vec::with_capacity(lengths.len());
    for (i, len) in lengths.iter().enumerate() {
        let id = i + 1;
        keys.push(subgraph.add_segment(Segment::new(id, Some(100 * id as u64), *len)));
    }
    for (i, (from, to)) in edges.iter().enumerate() {
        let kind = EdgeKind::link(Some(1000 + i as u64));
        let result = subgraph.add_edge(keys[from - 1], keys[to - 1], kind);
        assert!(result.is_ok(), "Failed to add edge ({}, {}): {}", from, to, result.unwrap_err());
    }
    (subgraph, keys)
}

//-----------------------------------------------------------------------------
