use super::*;

use crate::{internal, CompactGraphBuilder};

//-----------------------------------------------------------------------------

fn run_layout(graph: &mut CompactGraph) -> FafospLayout {
    let layout = FafospLayout::run(graph);
    assert!(layout.is_ok(), "Failed to lay out the graph: {}", layout.unwrap_err());
    layout.unwrap()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn check_horizontal(graph: &CompactGraph, name: &str) {
    for from in 0..graph.node_count() {
        assert_ne!(graph.x(from), CompactGraph::UNSET, "Node {} was not placed in {}", from, name);
        for edge in graph.outgoing(from) {
            let to = edge.node;
            let start = graph.x(to) - graph.sequence_len(to) as i64;
            assert!(start > graph.x(from), "Node {} starts before the end of node {} in {}", to, from, name);
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn horizontal_linear() {
    let mut graph = internal::build_graph(&[2, 3, 4], &[(1, 2), (2, 3)]);
    run_layout(&mut graph);
    assert_eq!(graph.x(graph.source()), 0, "Wrong position for the source");
    assert_eq!(graph.x(1), 3, "Wrong position for node 1");
    assert_eq!(graph.x(2), 7, "Wrong position for node 2");
    assert_eq!(graph.x(3), 12, "Wrong position for node 3");
    assert_eq!(graph.x(graph.sink()), 13, "Wrong position for the sink");
    check_horizontal(&graph, "linear graph");
}

#[test]
fn horizontal_waits_for_all_predecessors() {
    // The long branch 2 -> 3 reaches node 4 later than the short branch 1 -> 4.
    let mut graph = internal::build_graph(&[1, 1, 10, 1], &[(1, 2), (2, 3), (3, 4), (1, 4)]);
    run_layout(&mut graph);
    assert_eq!(graph.x(3), 15, "Wrong position for the long node");
    assert_eq!(graph.x(4), 17, "Node 4 was not placed after its last predecessor");
    check_horizontal(&graph, "graph with a shortcut");
}

#[test]
fn horizontal_monotonicity() {
    let mut graph = internal::diamond_chain(10);
    run_layout(&mut graph);
    check_horizontal(&graph, "diamond chain");

    // Multiple roots and leaves are connected to the sentinels.
    let mut graph = internal::build_graph(&[4, 1, 2, 8, 3], &[(1, 3), (2, 3), (3, 4), (3, 5)]);
    run_layout(&mut graph);
    check_horizontal(&graph, "graph with multiple roots");
}

#[test]
fn cycle_is_rejected() {
    let mut graph = internal::build_graph(&[1, 1, 1], &[(1, 2), (2, 3), (3, 2)]);
    let result = FafospLayout::run(&mut graph);
    assert_eq!(result, Err(LayoutError::Unplaced { count: 3 }), "Cycle was not reported");
    for id in 0..graph.node_count() {
        assert_eq!(graph.x(id), CompactGraph::UNSET, "Node {} has a coordinate after a failed layout", id);
        assert!(graph.y(id).is_none(), "Node {} has a vertical position after a failed layout", id);
    }
}

#[test]
fn empty_graph() {
    let builder = CompactGraphBuilder::new();
    let mut graph = builder.build().unwrap();
    run_layout(&mut graph);
    assert_eq!(graph.node_count(), 2, "Wrong number of nodes in an empty graph");
    assert_eq!(graph.x(graph.sink()), 1, "Wrong position for the sink");
}

//-----------------------------------------------------------------------------

#[test]
fn heights_in_diamond() {
    let mut graph = internal::diamond_graph();
    let layout = run_layout(&mut graph);

    let left: Vec<f64> = (0..graph.node_count()).map(|id| layout.left_height(id)).collect();
    assert_eq!(left, vec![2.0, 2.0, 1.0, 1.0, 2.0, 2.0], "Wrong left heights");
    let right: Vec<f64> = (0..graph.node_count()).map(|id| layout.right_height(id)).collect();
    assert_eq!(right, vec![2.0, 2.0, 1.0, 1.0, 2.0, 2.0], "Wrong right heights");
}

#[test]
fn heights_stay_bounded() {
    let mut graph = internal::diamond_chain(200);
    let layout = run_layout(&mut graph);
    for id in 0..graph.node_count() {
        assert!(layout.left_height(id) <= FafospLayout::BASE_HEIGHT, "Left height of node {} grew along the chain", id);
        assert!(layout.right_height(id) <= FafospLayout::BASE_HEIGHT, "Right height of node {} grew along the chain", id);
    }
}

#[test]
fn vertical_diamond() {
    let mut graph = internal::diamond_graph();
    let layout = run_layout(&mut graph);

    let source = graph.y(graph.source()).unwrap();
    assert_eq!(source, layout.right_height(graph.source()) / 2.0, "Wrong vertical position for the source");
    assert_eq!(graph.y(1), Some(source), "A 1:1 chain changed the vertical position");

    // The branches do not overlap before the merge point.
    let top = graph.y(2).unwrap();
    let bottom = graph.y(3).unwrap();
    assert!(top < bottom, "Branches are in the wrong order");
    let top_end = top + layout.right_height(2) / 2.0;
    let bottom_start = bottom - layout.right_height(3) / 2.0;
    assert!(top_end <= bottom_start, "Branches overlap: {} > {}", top_end, bottom_start);

    // The merge point is centred between the branches.
    assert_eq!(graph.y(4), Some((top + bottom) / 2.0), "Merge point is not centred");
    assert_eq!(graph.y(4), graph.y(1), "Merge point is not aligned with the branch point");
}

#[test]
fn vertical_three_branches() {
    let mut graph = internal::build_graph(&[1, 1, 1, 1, 1], &[(1, 2), (1, 3), (1, 4), (2, 5), (3, 5), (4, 5)]);
    let layout = run_layout(&mut graph);

    let mut previous_end = f64::NEG_INFINITY;
    for branch in 2..=4 {
        let y = graph.y(branch).unwrap();
        let half = layout.right_height(branch) / 2.0;
        assert!(y - half >= previous_end - 1e-9, "Branch {} overlaps the previous branch", branch);
        previous_end = y + half;
    }
    let merge = graph.y(5).unwrap();
    let middle = graph.y(3).unwrap();
    assert!(approx_eq(merge, middle), "Merge point {} is not aligned with the middle branch {}", merge, middle);
}

#[test]
fn every_node_has_a_vertical_position() {
    let mut graph = internal::build_graph(&[4, 1, 2, 8, 3, 1], &[(1, 3), (2, 3), (3, 4), (3, 5), (4, 6), (1, 6)]);
    run_layout(&mut graph);
    for id in 0..graph.node_count() {
        assert!(graph.y(id).is_some(), "Node {} has no vertical position", id);
    }
}

//-----------------------------------------------------------------------------
