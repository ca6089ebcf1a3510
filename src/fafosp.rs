//! FAFOSP: one-shot global coordinate assignment for a [`CompactGraph`].
//!
//! The horizontal pass places every node strictly to the right of all of its predecessors.
//! The vertical pass packs the branches of the graph as trees that share their merge points.
//! Both passes assume that the graph is a directed acyclic graph rooted at the source sentinel.
//! [`CompactGraphBuilder::build`](crate::CompactGraphBuilder::build) guarantees that every node without predecessors is connected to the source.
//! A cycle is reported as [`LayoutError::Unplaced`] and leaves the graph without coordinates.

use crate::{CompactGraph, Direction, GraphIterator};
use crate::error::LayoutError;

use std::collections::VecDeque;

use log::info;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Result of the FAFOSP layout.
///
/// The coordinates are written into the [`CompactGraph`].
/// This structure keeps the node heights computed by the vertical pass.
///
/// Node heights describe how much vertical space the branches on either side of the node need.
/// A node without predecessors has left height [`FafospLayout::BASE_HEIGHT`].
/// Otherwise each predecessor contributes its own left height divided evenly between its successors.
/// Right heights are computed symmetrically from the successors.
/// Splitting the height at branch points and summing it at merge points keeps the heights bounded along chains of bubbles.
///
/// # Examples
///
/// ```
/// use seqgraph_view::{CompactGraphBuilder, FafospLayout};
///
/// let mut builder = CompactGraphBuilder::new();
/// let a = builder.add_node(None, 3);
/// let b = builder.add_node(None, 2);
/// builder.add_edge(a, b, None).unwrap();
/// let mut graph = builder.build().unwrap();
///
/// let layout = FafospLayout::run(&mut graph).unwrap();
/// assert_eq!(graph.x(a), 4);
/// assert_eq!(graph.x(b), 7);
/// assert_eq!(graph.y(a), graph.y(b));
/// assert_eq!(layout.left_height(b), FafospLayout::BASE_HEIGHT);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FafospLayout {
    // Topological order produced by the horizontal pass.
    order: Vec<usize>,
    left_heights: Vec<f64>,
    right_heights: Vec<f64>,
}

impl FafospLayout {
    /// Height of a node without neighbours on the relevant side.
    pub const BASE_HEIGHT: f64 = 2.0;

    /// Runs both passes and writes the coordinates into the graph.
    ///
    /// Any existing coordinates are cleared first.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Unplaced`] if the graph contains a cycle.
    /// The graph is left without coordinates in that case.
    pub fn run(graph: &mut CompactGraph) -> Result<Self, LayoutError> {
        graph.clear_layout();
        let order = Self::horizontal(graph)?;
        let mut layout = FafospLayout {
            order,
            left_heights: Vec::new(),
            right_heights: Vec::new(),
        };
        layout.init_heights(graph);
        layout.vertical(graph);
        info!("FAFOSP placed {} nodes; graph width {}", graph.node_count(), graph.x(graph.sink()));
        Ok(layout)
    }

    /// Returns the left height of the node.
    #[inline]
    pub fn left_height(&self, id: usize) -> f64 {
        self.left_heights[id]
    }

    /// Returns the right height of the node.
    #[inline]
    pub fn right_height(&self, id: usize) -> f64 {
        self.right_heights[id]
    }

    /// Returns the nodes in the order the horizontal pass placed them.
    ///
    /// This is a topological order of the graph.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    //-------------------------------------------------------------------------

    /// Horizontal pass.
    ///
    /// The source is placed at `0`.
    /// Once all predecessors of a node have been placed, the node is placed at `max(x(pred) + 1) + sequence_len`.
    /// The coordinate is the right end of the node, so the node starts strictly after the end of every predecessor.
    ///
    /// Returns the order in which the nodes were placed.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Unplaced`] if some nodes could not be placed.
    pub fn horizontal(graph: &mut CompactGraph) -> Result<Vec<usize>, LayoutError> {
        let node_count = graph.node_count();
        let source = graph.source();
        let mut x = vec![CompactGraph::UNSET; node_count];
        x[source] = graph.sequence_len(source) as i64;
        let mut order = Vec::with_capacity(node_count);

        {
            let view: &CompactGraph = graph;
            let iter = GraphIterator::new(view);
            let mut queue: VecDeque<usize> = VecDeque::new();
            queue.push_back(source);
            while let Some(node) = queue.pop_front() {
                order.push(node);
                for edge in view.outgoing(node) {
                    let next = edge.node;
                    if x[next] != CompactGraph::UNSET {
                        continue;
                    }
                    // The last predecessor to be placed places the node.
                    let mut rightmost = i64::MIN;
                    let ready = iter.visit_direct_neighbours_while(
                        next, Direction::Left,
                        |pred| x[pred] != CompactGraph::UNSET,
                        None,
                        |pred| rightmost = rightmost.max(x[pred] + 1)
                    );
                    if ready {
                        x[next] = rightmost + view.sequence_len(next) as i64;
                        queue.push_back(next);
                    }
                }
            }
        }

        if order.len() < node_count {
            return Err(LayoutError::Unplaced { count: node_count - order.len() });
        }
        for (id, value) in x.into_iter().enumerate() {
            graph.set_x(id, value);
        }
        Ok(order)
    }

    //-------------------------------------------------------------------------

    // Share of the height of `from` that flows to each of its neighbours in the given direction.
    fn share(graph: &CompactGraph, heights: &[f64], from: usize, direction: Direction) -> f64 {
        heights[from] / graph.degree(from, direction) as f64
    }

    // Height of `id` from its neighbours in the given direction, assuming they are all known.
    fn height(graph: &CompactGraph, heights: &[f64], id: usize, direction: Direction) -> f64 {
        let degree = graph.degree(id, direction);
        if degree == 0 {
            return Self::BASE_HEIGHT;
        }
        let mut edges = graph.edges(id, direction);
        if degree == 1 {
            // A 1:1 chain continues with the same height.
            if let Some(edge) = edges.next() {
                if graph.degree(edge.node, direction.flip()) == 1 {
                    return heights[edge.node];
                }
                return Self::share(graph, heights, edge.node, direction.flip());
            }
        }
        edges.map(|edge| Self::share(graph, heights, edge.node, direction.flip())).sum()
    }

    // Computes left heights in topological order and right heights in reverse topological order.
    fn init_heights(&mut self, graph: &CompactGraph) {
        let node_count = graph.node_count();
        self.left_heights = vec![Self::BASE_HEIGHT; node_count];
        for &id in self.order.iter() {
            self.left_heights[id] = Self::height(graph, &self.left_heights, id, Direction::Left);
        }
        self.right_heights = vec![Self::BASE_HEIGHT; node_count];
        for &id in self.order.iter().rev() {
            self.right_heights[id] = Self::height(graph, &self.right_heights, id, Direction::Right);
        }
    }

    //-------------------------------------------------------------------------

    // Vertical pass: assigns vertical centres in breadth-first order from the source.
    fn vertical(&self, graph: &mut CompactGraph) {
        let source = graph.source();
        let mut y: Vec<Option<f64>> = vec![None; graph.node_count()];
        y[source] = Some(self.right_heights[source] / 2.0);

        {
            let view: &CompactGraph = graph;
            let iter = GraphIterator::new(view);
            let left = &self.left_heights;
            let right = &self.right_heights;
            iter.visit_all(Direction::Right, |node| {
                let position = match y[node] {
                    Some(position) => position,
                    None => return,
                };
                let out_degree = view.out_degree(node);
                if out_degree == 1 {
                    let next = match view.outgoing(node).next() {
                        Some(edge) => edge.node,
                        None => return,
                    };
                    if y[next].is_some() {
                        return;
                    }
                    if view.in_degree(next) == 1 {
                        y[next] = Some(position);
                    } else {
                        // Merge point: find the top of the merged band from the predecessors before this one.
                        let mut earlier = 0.0;
                        iter.visit_direct_neighbours_until(
                            next, Direction::Left,
                            |pred| pred == node,
                            None,
                            |pred| earlier += Self::share(view, left, pred, Direction::Right)
                        );
                        let own = Self::share(view, left, node, Direction::Right);
                        y[next] = Some(position - earlier + (left[next] - own) / 2.0);
                    }
                } else if out_degree > 1 {
                    let mut relative_height = position - right[node] / 2.0;
                    for edge in view.outgoing(node) {
                        let next = edge.node;
                        let slot = Self::share(view, right, next, Direction::Left);
                        match y[next] {
                            Some(known) => relative_height = known + slot / 2.0,
                            None => {
                                y[next] = Some(relative_height + slot / 2.0);
                                relative_height += slot;
                            },
                        }
                    }
                }
            });
        }

        for (id, value) in y.into_iter().enumerate() {
            if let Some(value) = value {
                graph.set_y(id, value);
            }
        }
    }
}

//-----------------------------------------------------------------------------
