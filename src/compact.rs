//! A compact, frozen adjacency store for the whole sequence graph.
//!
//! The graph is built once with [`CompactGraphBuilder`] and then frozen into a [`CompactGraph`].
//! Node records are concatenated into a single bit-packed [`IntVector`], which keeps the memory footprint small even for graphs with hundreds of thousands of nodes.
//! The only fields that can change after construction are the layout coordinates written by [`crate::FafospLayout`].

use crate::utils;

use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, Push, Vector};
use simple_sds::serialize::Serialize;

use std::fmt::Display;
use std::iter::FusedIterator;
use std::mem;

use log::info;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Direction of traversal.
///
/// [`Direction::Left`] follows incoming edges and [`Direction::Right`] follows outgoing edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Towards predecessors (incoming edges).
    Left,
    /// Towards successors (outgoing edges).
    Right,
}

impl Direction {
    /// Returns the opposite direction.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// An edge entry stored in a node record.
///
/// `node` is the neighbour at the other end of the edge.
/// `file_offset` locates the metadata of the edge in the source file, or is [`None`] for edges created for the sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeEntry {
    pub node: usize,
    pub file_offset: Option<u64>,
}

//-----------------------------------------------------------------------------

/// An append-only builder for [`CompactGraph`].
///
/// Node identifiers are assigned in insertion order starting from `1`.
/// Identifier `0` is reserved for the source sentinel and the sink sentinel receives the identifier after the last node.
/// Edges are stored in insertion order, which later determines the order in which traversals see the neighbours of a node.
///
/// # Examples
///
/// ```
/// use seqgraph_view::{CompactGraphBuilder, Direction};
///
/// let mut builder = CompactGraphBuilder::new();
/// let a = builder.add_node(Some(10), 4);
/// let b = builder.add_node(Some(20), 1);
/// assert!(builder.add_edge(a, b, Some(30)).is_ok());
///
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.sink(), 3);
/// assert_eq!(graph.sequence_len(a), 4);
/// let successors: Vec<usize> = graph.edges(a, Direction::Right).map(|edge| edge.node).collect();
/// assert_eq!(successors, vec![b]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactGraphBuilder {
    // (file offset, sequence length) for each node, including the source.
    nodes: Vec<(Option<u64>, usize)>,
    outgoing: Vec<Vec<EdgeEntry>>,
    incoming: Vec<Vec<EdgeEntry>>,
    edges: usize,
}

impl CompactGraphBuilder {
    /// Creates an empty builder containing only the source sentinel.
    pub fn new() -> Self {
        CompactGraphBuilder {
            nodes: vec![(None, 0)],
            outgoing: vec![Vec::new()],
            incoming: vec![Vec::new()],
            edges: 0,
        }
    }

    /// Returns the number of nodes added so far, excluding the sentinels.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Adds a node and returns its identifier.
    ///
    /// # Arguments
    ///
    /// * `file_offset`: Byte offset of the node metadata in the source file.
    /// * `sequence_len`: Length of the node sequence in bp.
    pub fn add_node(&mut self, file_offset: Option<u64>, sequence_len: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push((file_offset, sequence_len));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Adds an edge from `from` to `to`.
    ///
    /// Both endpoints must be nodes added with [`Self::add_node`].
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint does not exist or is the source sentinel.
    pub fn add_edge(&mut self, from: usize, to: usize, file_offset: Option<u64>) -> Result<(), String> {
        for id in [from, to] {
            if id == 0 || id >= self.nodes.len() {
                return Err(format!("Invalid edge endpoint {} (nodes 1..={})", id, self.node_count()));
            }
        }
        self.push_edge(from, to, file_offset);
        Ok(())
    }

    fn push_edge(&mut self, from: usize, to: usize, file_offset: Option<u64>) {
        self.outgoing[from].push(EdgeEntry { node: to, file_offset });
        self.incoming[to].push(EdgeEntry { node: from, file_offset });
        self.edges += 1;
    }

    /// Freezes the graph.
    ///
    /// Appends the sink sentinel, connects the source to every node without predecessors and every node without successors to the sink.
    /// Then packs the node records.
    ///
    /// # Errors
    ///
    /// Passes through errors from creating the packed vectors.
    pub fn build(mut self) -> Result<CompactGraph, String> {
        let sink = self.nodes.len();
        self.nodes.push((None, 0));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        for id in 1..sink {
            if self.incoming[id].is_empty() {
                self.push_edge(0, id, None);
            }
            if self.outgoing[id].is_empty() {
                self.push_edge(id, sink, None);
            }
        }
        if self.outgoing[0].is_empty() {
            self.push_edge(0, sink, None);
        }

        // Determine the width of the packed records.
        let mut max_value: u64 = 0;
        for (id, (file_offset, len)) in self.nodes.iter().enumerate() {
            max_value = max_value.max(encode_offset(*file_offset)).max(*len as u64);
            max_value = max_value.max(self.outgoing[id].len() as u64);
            for edge in self.outgoing[id].iter().chain(self.incoming[id].iter()) {
                max_value = max_value.max(edge.node as u64).max(encode_offset(edge.file_offset));
            }
        }
        let total = self.nodes.len() * CompactGraph::HEADER_LEN + 4 * self.edges;
        let width = bits::bit_len(max_value).max(1);

        let mut records = IntVector::with_capacity(total, width).map_err(String::from)?;
        let mut index = IntVector::with_capacity(self.nodes.len() + 1, bits::bit_len(total as u64).max(1)).map_err(String::from)?;
        for (id, (file_offset, len)) in self.nodes.iter().enumerate() {
            index.push(records.len() as u64);
            records.push(encode_offset(*file_offset));
            records.push(*len as u64);
            records.push(self.outgoing[id].len() as u64);
            for edge in self.outgoing[id].iter().chain(self.incoming[id].iter()) {
                records.push(edge.node as u64);
                records.push(encode_offset(edge.file_offset));
            }
        }
        index.push(records.len() as u64);

        let node_count = self.nodes.len();
        let graph = CompactGraph {
            records,
            index,
            edges: self.edges,
            x: vec![CompactGraph::UNSET; node_count],
            y: vec![None; node_count],
        };
        info!(
            "Built a compact graph with {} nodes and {} edges ({})",
            graph.node_count(), graph.edge_count(), utils::human_readable_size(graph.size_in_bytes())
        );
        Ok(graph)
    }
}

impl Default for CompactGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// File offsets are stored as `offset + 1`, with `0` meaning no offset.
fn encode_offset(offset: Option<u64>) -> u64 {
    offset.map_or(0, |x| x + 1)
}

fn decode_offset(value: u64) -> Option<u64> {
    value.checked_sub(1)
}

//-----------------------------------------------------------------------------

/// An immutable, densely packed adjacency store.
///
/// Nodes are numbered `0..node_count()`.
/// Node `0` is the source sentinel and node `node_count() - 1` is the sink sentinel.
/// Each node record stores a file offset for the node metadata, the sequence length, the number of outgoing edges, and the edge entries.
/// Outgoing entries come first, followed by incoming entries.
/// Every outgoing entry `a -> b` has a matching incoming entry at `b`.
///
/// Accessors do not validate node identifiers.
/// Passing an identifier outside `0..node_count()` panics or returns meaningless data.
///
/// Horizontal and vertical coordinates are unset until [`crate::FafospLayout`] has been run.
#[derive(Clone, Debug, PartialEq)]
pub struct CompactGraph {
    // Concatenated node records.
    records: IntVector,

    // Start of each record in `records`, with a final entry for the total length.
    index: IntVector,

    edges: usize,

    // Unscaled horizontal positions, `UNSET` if not laid out.
    x: Vec<i64>,

    // Unscaled vertical centres.
    y: Vec<Option<f64>>,
}

impl CompactGraph {
    /// Value of an unset horizontal coordinate.
    pub const UNSET: i64 = -1;

    const HEADER_LEN: usize = 3;
    const FILE_OFFSET: usize = 0;
    const SEQUENCE_LEN: usize = 1;
    const OUT_DEGREE: usize = 2;

    /// Returns the number of nodes, including the sentinels.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.index.len() - 1
    }

    /// Returns the number of edges, including the edges incident to the sentinels.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Returns the identifier of the source sentinel.
    #[inline]
    pub fn source(&self) -> usize {
        0
    }

    /// Returns the identifier of the sink sentinel.
    #[inline]
    pub fn sink(&self) -> usize {
        self.node_count() - 1
    }

    /// Returns `true` if the node is the source or the sink sentinel.
    #[inline]
    pub fn is_sentinel(&self, id: usize) -> bool {
        id == self.source() || id == self.sink()
    }

    /// Returns `true` if the identifier is a valid node identifier.
    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        id < self.node_count()
    }

    #[inline]
    fn record_start(&self, id: usize) -> usize {
        self.index.get(id) as usize
    }

    #[inline]
    fn record_end(&self, id: usize) -> usize {
        self.index.get(id + 1) as usize
    }

    /// Returns the byte offset of the node metadata in the source file.
    ///
    /// Sentinels have no file offset.
    #[inline]
    pub fn file_offset(&self, id: usize) -> Option<u64> {
        decode_offset(self.records.get(self.record_start(id) + Self::FILE_OFFSET))
    }

    /// Returns the sequence length of the node in bp.
    #[inline]
    pub fn sequence_len(&self, id: usize) -> usize {
        self.records.get(self.record_start(id) + Self::SEQUENCE_LEN) as usize
    }

    /// Returns the number of outgoing edges.
    #[inline]
    pub fn out_degree(&self, id: usize) -> usize {
        self.records.get(self.record_start(id) + Self::OUT_DEGREE) as usize
    }

    /// Returns the number of incoming edges.
    ///
    /// The value is derived from the length of the record.
    #[inline]
    pub fn in_degree(&self, id: usize) -> usize {
        let entries = (self.record_end(id) - self.record_start(id) - Self::HEADER_LEN) / 2;
        entries - self.out_degree(id)
    }

    /// Returns the number of edges in the given direction.
    #[inline]
    pub fn degree(&self, id: usize, direction: Direction) -> usize {
        match direction {
            Direction::Left => self.in_degree(id),
            Direction::Right => self.out_degree(id),
        }
    }

    /// Returns an iterator over the edges in the given direction, in insertion order.
    pub fn edges(&self, id: usize, direction: Direction) -> EdgeIter<'_> {
        let start = self.record_start(id) + Self::HEADER_LEN;
        let out_end = start + 2 * self.out_degree(id);
        match direction {
            Direction::Right => EdgeIter { parent: self, next: start, limit: out_end },
            Direction::Left => EdgeIter { parent: self, next: out_end, limit: self.record_end(id) },
        }
    }

    /// Returns an iterator over the outgoing edges.
    #[inline]
    pub fn outgoing(&self, id: usize) -> EdgeIter<'_> {
        self.edges(id, Direction::Right)
    }

    /// Returns an iterator over the incoming edges.
    #[inline]
    pub fn incoming(&self, id: usize) -> EdgeIter<'_> {
        self.edges(id, Direction::Left)
    }

    /// Returns `true` if there is an edge from `from` to `to`.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        if self.out_degree(from) <= self.in_degree(to) {
            self.outgoing(from).any(|edge| edge.node == to)
        } else {
            self.incoming(to).any(|edge| edge.node == from)
        }
    }

    /// Returns the horizontal coordinate of the right end of the node, or [`Self::UNSET`].
    #[inline]
    pub fn x(&self, id: usize) -> i64 {
        self.x[id]
    }

    /// Returns the vertical centre of the node, or [`None`] if it has not been laid out.
    #[inline]
    pub fn y(&self, id: usize) -> Option<f64> {
        self.y[id]
    }

    #[inline]
    pub(crate) fn set_x(&mut self, id: usize, value: i64) {
        self.x[id] = value;
    }

    #[inline]
    pub(crate) fn set_y(&mut self, id: usize, value: f64) {
        self.y[id] = Some(value);
    }

    pub(crate) fn clear_layout(&mut self) {
        self.x.iter_mut().for_each(|x| *x = Self::UNSET);
        self.y.iter_mut().for_each(|y| *y = None);
    }

    /// Returns the approximate memory usage of the graph in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.records.size_in_bytes() + self.index.size_in_bytes()
            + self.x.capacity() * mem::size_of::<i64>()
            + self.y.capacity() * mem::size_of::<Option<f64>>()
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the edge entries of a node in one direction.
#[derive(Clone, Debug)]
pub struct EdgeIter<'a> {
    parent: &'a CompactGraph,
    next: usize,
    limit: usize,
}

impl<'a> Iterator for EdgeIter<'a> {
    type Item = EdgeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.limit {
            return None;
        }
        let node = self.parent.records.get(self.next) as usize;
        let file_offset = decode_offset(self.parent.records.get(self.next + 1));
        self.next += 2;
        Some(EdgeEntry { node, file_offset })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.limit - self.next) / 2;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for EdgeIter<'a> {}

impl<'a> FusedIterator for EdgeIter<'a> {}

//-----------------------------------------------------------------------------
