//! Traversal primitives over a frozen [`CompactGraph`].
//!
//! All operations are read-only and run to completion on the calling thread.
//! Node identifiers are not validated; that is the responsibility of the caller.

use crate::{CompactGraph, Direction};

use simple_sds::raw_vector::{AccessRaw, RawVector};

use rustc_hash::FxHashSet;

use std::collections::VecDeque;


//-----------------------------------------------------------------------------

/// Stateless traversal operations over a [`CompactGraph`].
///
/// Neighbours are always visited in the order the edges were added to the graph.
/// Early-stopping walks such as [`GraphIterator::visit_direct_neighbours_while`] therefore depend on the construction order:
/// if the edges were not added in a canonical order, the neighbour that stops the walk may differ between otherwise identical graphs.
///
/// Breadth-first walks report the starting node first.
/// By default, each node is reported once.
/// The `_with` variants take a predicate that returns `true` for nodes that should be considered visited.
/// The predicate is called once for each discovered edge, and it is responsible for remembering the visited nodes.
/// A predicate that always returns `false` reports a node once for each path reaching it.
///
/// # Examples
///
/// ```
/// use seqgraph_view::{CompactGraphBuilder, Direction, GraphIterator};
///
/// let mut builder = CompactGraphBuilder::new();
/// for _ in 0..3 {
///     builder.add_node(None, 1);
/// }
/// builder.add_edge(1, 2, None).unwrap();
/// builder.add_edge(2, 3, None).unwrap();
/// let graph = builder.build().unwrap();
///
/// let iter = GraphIterator::new(&graph);
/// let mut found = Vec::new();
/// iter.visit_indirect_neighbours_within_range(2, 1, |depth, node| found.push((depth, node)));
/// found.sort();
/// assert_eq!(found, vec![(0, 2), (1, 1), (1, 3)]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GraphIterator<'a> {
    graph: &'a CompactGraph,
}

impl<'a> GraphIterator<'a> {
    /// Creates an iterator over the given graph.
    pub fn new(graph: &'a CompactGraph) -> Self {
        GraphIterator { graph }
    }

    /// Returns the underlying graph.
    #[inline]
    pub fn graph(&self) -> &'a CompactGraph {
        self.graph
    }

    // Returns the sentinel a whole-graph walk in the given direction starts from.
    fn start_sentinel(&self, direction: Direction) -> usize {
        match direction {
            Direction::Right => self.graph.source(),
            Direction::Left => self.graph.sink(),
        }
    }

    //-------------------------------------------------------------------------

    /// Applies `action` to each immediate neighbour in the given direction.
    pub fn visit_direct_neighbours<F: FnMut(usize)>(&self, id: usize, direction: Direction, mut action: F) {
        for edge in self.graph.edges(id, direction) {
            action(edge.node);
        }
    }

    /// Applies `action` to immediate neighbours as long as `predicate` holds.
    ///
    /// The walk stops at the first neighbour for which `predicate` returns `false`.
    /// If `catch` is given, it is called once with the stopping neighbour.
    /// Returns `true` if the walk went through all neighbours.
    pub fn visit_direct_neighbours_while<P, F>(
        &self,
        id: usize,
        direction: Direction,
        mut predicate: P,
        catch: Option<&mut dyn FnMut(usize)>,
        mut action: F
    ) -> bool where P: FnMut(usize) -> bool, F: FnMut(usize) {
        for edge in self.graph.edges(id, direction) {
            if !predicate(edge.node) {
                if let Some(catch) = catch {
                    catch(edge.node);
                }
                return false;
            }
            action(edge.node);
        }
        true
    }

    /// Applies `action` to immediate neighbours until `predicate` holds.
    ///
    /// The walk stops at the first neighbour for which `predicate` returns `true`.
    /// If `catch` is given, it is called once with the stopping neighbour.
    /// Returns `true` if the walk went through all neighbours.
    pub fn visit_direct_neighbours_until<P, F>(
        &self,
        id: usize,
        direction: Direction,
        mut predicate: P,
        catch: Option<&mut dyn FnMut(usize)>,
        action: F
    ) -> bool where P: FnMut(usize) -> bool, F: FnMut(usize) {
        self.visit_direct_neighbours_while(id, direction, |node| !predicate(node), catch, action)
    }

    //-------------------------------------------------------------------------

    /// Breadth-first walk over the whole graph in the given direction.
    ///
    /// The walk starts from the source sentinel when going right and from the sink sentinel when going left.
    pub fn visit_all<F: FnMut(usize)>(&self, direction: Direction, action: F) {
        let mut visited = RawVector::with_len(self.graph.node_count(), false);
        let start = self.start_sentinel(direction);
        visited.set_bit(start, true);
        self.visit_all_with(direction, default_visited(&mut visited), action);
    }

    /// Breadth-first walk over the whole graph with a caller-supplied visited predicate.
    pub fn visit_all_with<V, F>(&self, direction: Direction, visited: V, action: F)
        where V: FnMut(usize) -> bool, F: FnMut(usize)
    {
        let start = self.start_sentinel(direction);
        self.visit_indirect_neighbours_with(start, direction, visited, action);
    }

    /// Breadth-first walk from the appropriate sentinel, limited to `max_depth` hops.
    ///
    /// The action receives the depth at which the node was discovered and the node identifier.
    pub fn visit_all_within_range<F: FnMut(usize, usize)>(&self, direction: Direction, max_depth: usize, mut action: F) {
        let start = self.start_sentinel(direction);
        let mut visited = RawVector::with_len(self.graph.node_count(), false);
        visited.set_bit(start, true);
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        queue.push_back((start, 0));
        while let Some((node, depth)) = queue.pop_front() {
            action(depth, node);
            if depth >= max_depth {
                continue;
            }
            for edge in self.graph.edges(node, direction) {
                if !visited.bit(edge.node) {
                    visited.set_bit(edge.node, true);
                    queue.push_back((edge.node, depth + 1));
                }
            }
        }
    }

    //-------------------------------------------------------------------------

    /// Breadth-first walk from `id` in the given direction.
    pub fn visit_indirect_neighbours<F: FnMut(usize)>(&self, id: usize, direction: Direction, action: F) {
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        visited.insert(id);
        self.visit_indirect_neighbours_with(id, direction, |node| !visited.insert(node), action);
    }

    /// Breadth-first walk from `id` in the given direction with a caller-supplied visited predicate.
    ///
    /// The starting node is always reported.
    pub fn visit_indirect_neighbours_with<V, F>(&self, id: usize, direction: Direction, mut visited: V, mut action: F)
        where V: FnMut(usize) -> bool, F: FnMut(usize)
    {
        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(id);
        while let Some(node) = queue.pop_front() {
            action(node);
            for edge in self.graph.edges(node, direction) {
                if !visited(edge.node) {
                    queue.push_back(edge.node);
                }
            }
        }
    }

    /// Breadth-first walk from `id` in both directions, limited to `radius` hops.
    ///
    /// The action receives the discovery depth and the node identifier.
    /// Each node is reported once, at its hop distance from `id`.
    pub fn visit_indirect_neighbours_within_range<F: FnMut(usize, usize)>(&self, id: usize, radius: usize, action: F) {
        self.visit_indirect_neighbours_within_range_where(id, radius, |_| true, action);
    }

    /// Like [`Self::visit_indirect_neighbours_within_range`], but only enters nodes for which `admit` returns `true`.
    ///
    /// The starting node is always reported.
    /// Nodes that are not admitted are neither reported nor expanded.
    pub fn visit_indirect_neighbours_within_range_where<A, F>(&self, id: usize, radius: usize, mut admit: A, mut action: F)
        where A: FnMut(usize) -> bool, F: FnMut(usize, usize)
    {
        let mut visited: FxHashSet<usize> = FxHashSet::default();
        visited.insert(id);
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        queue.push_back((id, 0));
        while let Some((node, depth)) = queue.pop_front() {
            action(depth, node);
            if depth >= radius {
                continue;
            }
            for direction in [Direction::Left, Direction::Right] {
                for edge in self.graph.edges(node, direction) {
                    if !visited.contains(&edge.node) && admit(edge.node) {
                        visited.insert(edge.node);
                        queue.push_back((edge.node, depth + 1));
                    }
                }
            }
        }
    }
}

// Marks nodes in the bitmap on first discovery.
fn default_visited(visited: &mut RawVector) -> impl FnMut(usize) -> bool + '_ {
    move |node| {
        if visited.bit(node) {
            true
        } else {
            visited.set_bit(node, true);
            false
        }
    }
}

//-----------------------------------------------------------------------------
