use super::*;

use crate::internal;

//-----------------------------------------------------------------------------

fn neighbours(graph: &CompactGraph, id: usize, direction: Direction) -> Vec<usize> {
    graph.edges(id, direction).map(|edge| edge.node).collect()
}

fn check_symmetry(graph: &CompactGraph) {
    let mut total = 0;
    for from in 0..graph.node_count() {
        assert_eq!(graph.outgoing(from).len(), graph.out_degree(from), "Wrong number of outgoing edges for node {}", from);
        assert_eq!(graph.incoming(from).len(), graph.in_degree(from), "Wrong number of incoming edges for node {}", from);
        for edge in graph.outgoing(from) {
            let reverse = graph.incoming(edge.node).find(|entry| entry.node == from);
            assert!(reverse.is_some(), "Edge ({}, {}) has no incoming entry", from, edge.node);
            assert_eq!(reverse.unwrap().file_offset, edge.file_offset, "Wrong file offset for the incoming entry of ({}, {})", from, edge.node);
            total += 1;
        }
    }
    assert_eq!(total, graph.edge_count(), "Wrong total number of edges");
}

//-----------------------------------------------------------------------------

#[test]
fn empty_graph() {
    let graph = CompactGraphBuilder::new().build().unwrap();
    assert_eq!(graph.node_count(), 2, "Empty graph should only have the sentinels");
    assert_eq!(graph.source(), 0, "Wrong source");
    assert_eq!(graph.sink(), 1, "Wrong sink");
    assert!(graph.has_edge(0, 1), "The source is not connected to the sink");
    assert_eq!(graph.edge_count(), 1, "Wrong number of edges");
    assert_eq!(graph.file_offset(0), None, "The source has a file offset");
    assert_eq!(graph.sequence_len(1), 0, "The sink has a sequence");
    check_symmetry(&graph);
}

#[test]
fn node_records() {
    let graph = internal::diamond_graph();
    assert_eq!(graph.node_count(), 6, "Wrong number of nodes");
    assert_eq!(graph.sink(), 5, "Wrong sink");
    for (id, len) in [(1, 5), (2, 1), (3, 1), (4, 7)] {
        assert_eq!(graph.sequence_len(id), len, "Wrong sequence length for node {}", id);
        assert_eq!(graph.file_offset(id), Some(100 * id as u64), "Wrong file offset for node {}", id);
        assert!(!graph.is_sentinel(id), "Node {} is a sentinel", id);
    }
    assert!(graph.is_sentinel(0) && graph.is_sentinel(5), "Sentinels are not recognized");
    assert!(graph.contains(5) && !graph.contains(6), "Wrong node range");
}

#[test]
fn edges_in_insertion_order() {
    let graph = internal::diamond_graph();
    assert_eq!(neighbours(&graph, 1, Direction::Right), vec![2, 3], "Wrong successors for node 1");
    assert_eq!(neighbours(&graph, 4, Direction::Left), vec![2, 3], "Wrong predecessors for node 4");
    assert_eq!(neighbours(&graph, 0, Direction::Right), vec![1], "Wrong successors for the source");
    assert_eq!(neighbours(&graph, 5, Direction::Left), vec![4], "Wrong predecessors for the sink");

    let offsets: Vec<Option<u64>> = graph.outgoing(1).map(|edge| edge.file_offset).collect();
    assert_eq!(offsets, vec![Some(1000), Some(1001)], "Wrong edge file offsets");
    let sentinel: Vec<Option<u64>> = graph.incoming(1).map(|edge| edge.file_offset).collect();
    assert_eq!(sentinel, vec![None], "Sentinel edges should have no file offset");
    check_symmetry(&graph);
}

#[test]
fn sentinels_are_wired() {
    // Nodes 1 and 2 are roots; nodes 4 and 5 are leaves; node 6 is isolated.
    let graph = internal::build_graph(&[1, 1, 1, 1, 1, 1], &[(1, 3), (2, 3), (3, 4), (3, 5)]);
    let sink = graph.sink();
    assert_eq!(neighbours(&graph, 0, Direction::Right), vec![1, 2, 6], "Wrong roots");
    assert_eq!(neighbours(&graph, sink, Direction::Left), vec![4, 5, 6], "Wrong leaves");
    assert!(!graph.has_edge(0, sink), "The source is connected to the sink in a non-empty graph");
    for id in 1..sink {
        assert!(graph.in_degree(id) > 0, "Node {} has no predecessors", id);
        assert!(graph.out_degree(id) > 0, "Node {} has no successors", id);
    }
    check_symmetry(&graph);
}

#[test]
fn invalid_edges() {
    let mut builder = CompactGraphBuilder::new();
    let a = builder.add_node(None, 1);
    assert!(builder.add_edge(0, a, None).is_err(), "Accepted an edge from the source");
    assert!(builder.add_edge(a, 2, None).is_err(), "Accepted an edge to a missing node");
    assert!(builder.add_edge(a, a, None).is_ok(), "Rejected a self-loop");
    assert_eq!(builder.node_count(), 1, "Wrong number of nodes in the builder");
}

#[test]
fn has_edge() {
    let graph = internal::diamond_chain(3);
    assert!(graph.has_edge(1, 2), "Missing edge (1, 2)");
    assert!(graph.has_edge(3, 4), "Missing edge (3, 4)");
    assert!(!graph.has_edge(2, 1), "Edge (2, 1) should not exist");
    assert!(!graph.has_edge(1, 4), "Edge (1, 4) should not exist");
    check_symmetry(&graph);
}

#[test]
fn large_values() {
    let mut builder = CompactGraphBuilder::new();
    let a = builder.add_node(Some(u32::MAX as u64 * 4), 1_000_000);
    let b = builder.add_node(Some(0), 1);
    builder.add_edge(a, b, Some(12345678901)).unwrap();
    let graph = builder.build().unwrap();
    assert_eq!(graph.file_offset(a), Some(u32::MAX as u64 * 4), "Wrong large file offset");
    assert_eq!(graph.file_offset(b), Some(0), "Offset 0 was confused with a missing offset");
    assert_eq!(graph.sequence_len(a), 1_000_000, "Wrong large sequence length");
    assert_eq!(graph.outgoing(a).next().unwrap().file_offset, Some(12345678901), "Wrong large edge offset");
    assert!(graph.size_in_bytes() > 0, "Zero memory usage");
}

#[test]
fn layout_is_unset() {
    let graph = internal::linear_graph(4);
    for id in 0..graph.node_count() {
        assert_eq!(graph.x(id), CompactGraph::UNSET, "Node {} has a horizontal coordinate", id);
        assert_eq!(graph.y(id), None, "Node {} has a vertical coordinate", id);
    }
}

//-----------------------------------------------------------------------------
