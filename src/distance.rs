//! A bidirectional index between nodes and their distances from a centre node.

use rustc_hash::{FxHashMap, FxHashSet};

use std::collections::BTreeMap;

//-----------------------------------------------------------------------------

/// Maps nodes to distances and distances to node sets.
///
/// The two directions are always consistent with each other.
/// A recorded distance can only decrease: [`DistanceIndex::set_distance`] ignores distances that are not smaller than the current one.
///
/// # Examples
///
/// ```
/// use seqgraph_view::DistanceIndex;
///
/// let mut index = DistanceIndex::new();
/// assert_eq!(index.set_distance(7, 3), None);
/// assert_eq!(index.set_distance(7, 5), Some(3));
/// assert_eq!(index.distance(7), Some(3));
/// assert_eq!(index.set_distance(7, 1), Some(3));
/// assert_eq!(index.distance(7), Some(1));
/// assert!(index.nodes_at_distance(3).is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceIndex {
    distances: FxHashMap<usize, usize>,
    nodes: BTreeMap<usize, FxHashSet<usize>>,
}

impl DistanceIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        DistanceIndex::default()
    }

    /// Returns the number of nodes in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Records distance `distance` for node `node`, unless a smaller or equal distance is already recorded.
    ///
    /// Returns the distance recorded before the call, or [`None`] if the node was not in the index.
    /// The distance was updated if the return value is [`None`] or greater than `distance`.
    pub fn set_distance(&mut self, node: usize, distance: usize) -> Option<usize> {
        let previous = self.distances.get(&node).copied();
        if let Some(old) = previous {
            if old <= distance {
                return previous;
            }
            self.remove_pair(old, node);
        }
        self.distances.insert(node, distance);
        self.nodes.entry(distance).or_default().insert(node);
        previous
    }

    /// Returns the distance for the node, or [`None`] if the node is not in the index.
    #[inline]
    pub fn distance(&self, node: usize) -> Option<usize> {
        self.distances.get(&node).copied()
    }

    /// Returns `true` if the node is in the index.
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        self.distances.contains_key(&node)
    }

    /// Returns the nodes at the given distance in arbitrary order.
    pub fn nodes_at_distance(&self, distance: usize) -> Vec<usize> {
        self.nodes.get(&distance).map_or(Vec::new(), |nodes| nodes.iter().copied().collect())
    }

    /// Returns the largest recorded distance, or [`None`] if the index is empty.
    pub fn max_distance(&self) -> Option<usize> {
        self.nodes.keys().next_back().copied()
    }

    /// Removes the node from the index and returns its distance.
    pub fn remove_node(&mut self, node: usize) -> Option<usize> {
        let distance = self.distances.remove(&node)?;
        self.remove_pair(distance, node);
        Some(distance)
    }

    /// Removes all nodes from the index.
    pub fn clear(&mut self) {
        self.distances.clear();
        self.nodes.clear();
    }

    /// Returns an iterator over the nodes in the index in arbitrary order.
    pub fn node_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.distances.keys().copied()
    }

    /// Returns an iterator over the distinct recorded distances in increasing order.
    pub fn recorded_distances(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.keys().copied()
    }

    // Removes the pair from the inverse map, dropping empty sets.
    fn remove_pair(&mut self, distance: usize, node: usize) {
        if let Some(nodes) = self.nodes.get_mut(&distance) {
            nodes.remove(&node);
            if nodes.is_empty() {
                self.nodes.remove(&distance);
            }
        }
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
