//! Window-local layout of a materialized [`Subgraph`].
//!
//! The global FAFOSP coordinates are good for positioning the window, but the renderer needs a layered drawing of the nodes inside it.
//! [`WindowLayout::run`] assigns every node to a layer and a row.
//! Edges spanning several layers are routed through chains of diversion nodes, and short layers are padded with filler nodes.
//! [`WindowLayout::strip`] removes the artifacts again.

use crate::error::LayoutError;
use crate::subgraph::{EdgeKind, NodeKey, NodeKind, Placement, Subgraph};

use rustc_hash::FxHashMap;

use std::collections::VecDeque;

use log::debug;

//-----------------------------------------------------------------------------

/// Layers of a laid out subgraph.
///
/// Layer `0` contains the source-adjacent nodes, and every other node is one layer after its furthest predecessor.
/// Each layer is ordered by the vertical coordinates of the nodes and has the same number of rows.
///
/// # Examples
///
/// ```
/// use seqgraph_view::WindowLayout;
/// use seqgraph_view::subgraph::{EdgeKind, Segment, Subgraph};
///
/// let mut subgraph = Subgraph::new();
/// let keys: Vec<_> = (1..=3).map(|id| subgraph.add_segment(Segment::new(id, None, 1))).collect();
/// for (from, to) in [(0, 1), (1, 2), (0, 2)] {
///     subgraph.add_edge(keys[from], keys[to], EdgeKind::link(None)).unwrap();
/// }
///
/// let layout = WindowLayout::run(&mut subgraph).unwrap();
/// assert_eq!(layout.layer_count(), 3);
/// assert_eq!(layout.height(), 2);
/// assert_eq!(layout.diversion_count(), 1);
///
/// WindowLayout::strip(&mut subgraph);
/// assert_eq!(subgraph.node_count(), 3);
/// assert_eq!(subgraph.edge_count(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowLayout {
    layers: Vec<Vec<NodeKey>>,
    diversions: usize,
    fillers: usize,
}

impl WindowLayout {
    /// Lays out the subgraph, replacing any earlier window layout.
    ///
    /// Segment and aggregate nodes keep their coordinates.
    /// Diversion nodes interpolate the coordinates of the nodes they divert between, and filler nodes are stacked below the last node of their layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Unplaced`] if the subgraph contains a cycle.
    /// Earlier layout artifacts have been removed in that case.
    pub fn run(subgraph: &mut Subgraph) -> Result<Self, LayoutError> {
        Self::strip(subgraph);
        let mut layer_of = Self::assign_layers(subgraph)?;
        let diversions = Self::insert_diversions(subgraph, &mut layer_of);
        let mut layers = Self::order_layers(subgraph, &layer_of);
        let fillers = Self::pad_layers(subgraph, &mut layers);

        for (layer, nodes) in layers.iter().enumerate() {
            for (row, key) in nodes.iter().enumerate() {
                let _ = subgraph.set_placement(*key, Some(Placement { layer, row }));
            }
        }
        let result = WindowLayout { layers, diversions, fillers };
        debug!(
            "Window layout: {} layers, height {}, {} diversion nodes, {} filler nodes",
            result.layer_count(), result.height(), diversions, fillers
        );
        Ok(result)
    }

    /// Removes all diversion and filler nodes, restores the original edges, and clears the placements.
    ///
    /// Original edges whose endpoints have been removed in the meantime are dropped.
    /// Returns the number of removed nodes.
    pub fn strip(subgraph: &mut Subgraph) -> usize {
        let artifacts: Vec<NodeKey> = subgraph.nodes()
            .filter(|node| node.kind().is_layout_artifact())
            .map(|node| node.key())
            .collect();
        for key in artifacts.iter() {
            subgraph.remove_node(*key);
        }
        for key in subgraph.detached_keys() {
            if subgraph.reattach_edge(key).is_err() {
                subgraph.discard_detached(key);
            }
        }
        for key in subgraph.node_keys() {
            let _ = subgraph.set_placement(key, None);
        }
        artifacts.len()
    }

    /// Returns the layers from left to right, each ordered from top to bottom.
    #[inline]
    pub fn layers(&self) -> &[Vec<NodeKey>] {
        &self.layers
    }

    /// Returns the number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns the number of rows in each layer.
    pub fn height(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.len())
    }

    /// Returns the number of diversion nodes inserted.
    #[inline]
    pub fn diversion_count(&self) -> usize {
        self.diversions
    }

    /// Returns the number of filler nodes inserted.
    #[inline]
    pub fn filler_count(&self) -> usize {
        self.fillers
    }

    //-------------------------------------------------------------------------

    // Longest-path layering in topological order.
    fn assign_layers(subgraph: &Subgraph) -> Result<FxHashMap<NodeKey, usize>, LayoutError> {
        let mut pending: FxHashMap<NodeKey, usize> = FxHashMap::default();
        for node in subgraph.nodes() {
            if !matches!(node.kind(), NodeKind::Filler) {
                pending.insert(node.key(), node.incoming().len());
            }
        }

        let mut layer_of: FxHashMap<NodeKey, usize> = FxHashMap::default();
        let mut queue: VecDeque<NodeKey> = subgraph.source_adjacent().iter().copied().collect();
        for key in queue.iter() {
            layer_of.insert(*key, 0);
        }
        let mut placed = 0;
        while let Some(node) = queue.pop_front() {
            placed += 1;
            let layer = layer_of.get(&node).copied().unwrap_or(0);
            for next in subgraph.successors(node) {
                let entry = layer_of.entry(next).or_insert(0);
                *entry = (*entry).max(layer + 1);
                if let Some(count) = pending.get_mut(&next) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if placed < pending.len() {
            return Err(LayoutError::Unplaced { count: pending.len() - placed });
        }
        Ok(layer_of)
    }

    // Replaces edges spanning more than one layer with chains of diversion nodes.
    fn insert_diversions(subgraph: &mut Subgraph, layer_of: &mut FxHashMap<NodeKey, usize>) -> usize {
        let mut inserted = 0;
        for original in subgraph.edge_keys() {
            let (from, to) = match subgraph.edge(original) {
                Some(edge) => (edge.from(), edge.to()),
                None => continue,
            };
            let (first, last) = match (layer_of.get(&from), layer_of.get(&to)) {
                (Some(first), Some(last)) => (*first, *last),
                _ => continue,
            };
            if last <= first + 1 {
                continue;
            }
            let (start, end) = match (subgraph.node(from), subgraph.node(to)) {
                (Some(start), Some(end)) => ((start.x(), start.y()), (end.x(), end.y())),
                _ => continue,
            };
            if subgraph.detach_edge(original).is_err() {
                continue;
            }

            // Both endpoints exist, so adding the edges cannot fail.
            let span = last - first;
            let mut previous = from;
            for step in 1..span {
                let t = step as f64 / span as f64;
                let diversion = subgraph.add_node(NodeKind::Diversion { from, to });
                let x = start.0 + ((end.0 - start.0) as f64 * t).round() as i64;
                let y = start.1 + (end.1 - start.1) * t;
                let _ = subgraph.set_position(diversion, x, y);
                let _ = subgraph.add_edge(previous, diversion, EdgeKind::Diversion { original });
                layer_of.insert(diversion, first + step);
                previous = diversion;
                inserted += 1;
            }
            let _ = subgraph.add_edge(previous, to, EdgeKind::Diversion { original });
        }
        inserted
    }

    // Groups the nodes by layer and orders each layer by vertical position.
    fn order_layers(subgraph: &Subgraph, layer_of: &FxHashMap<NodeKey, usize>) -> Vec<Vec<NodeKey>> {
        let layer_count = layer_of.values().max().map_or(0, |max| max + 1);
        let mut layers: Vec<Vec<NodeKey>> = vec![Vec::new(); layer_count];
        for (key, layer) in layer_of.iter() {
            layers[*layer].push(*key);
        }
        for layer in layers.iter_mut() {
            layer.sort_by(|a, b| {
                let a_y = subgraph.node(*a).map_or(0.0, |node| node.y());
                let b_y = subgraph.node(*b).map_or(0.0, |node| node.y());
                a_y.total_cmp(&b_y).then(a.cmp(b))
            });
        }
        layers
    }

    // Pads every layer with filler nodes to the height of the tallest layer.
    fn pad_layers(subgraph: &mut Subgraph, layers: &mut [Vec<NodeKey>]) -> usize {
        let height = layers.iter().map(|layer| layer.len()).max().unwrap_or(0);
        let mut inserted = 0;
        for layer in layers.iter_mut() {
            let x = layer.iter().filter_map(|key| subgraph.node(*key)).map(|node| node.x()).max().unwrap_or(crate::CompactGraph::UNSET);
            let mut y = layer.last().and_then(|key| subgraph.node(*key)).map_or(0.0, |node| node.y());
            while layer.len() < height {
                let filler = subgraph.add_node(NodeKind::Filler);
                y += 1.0;
                let _ = subgraph.set_position(filler, x, y);
                layer.push(filler);
                inserted += 1;
            }
        }
        inserted
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
