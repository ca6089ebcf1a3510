//! A materialized, mutable view of a part of the graph.
//!
//! Unlike [`crate::CompactGraph`], a [`Subgraph`] is an object graph.
//! Nodes and edges are identified by keys that are independent of their contents, because synthetic layout artifacts may otherwise be indistinguishable.
//! Segment nodes correspond to nodes of the global graph.
//! Diversion, filler, and aggregate nodes, as well as diversion and aggregate edges, are created and discarded by window-local passes.
//!
//! All structural changes go through the methods of [`Subgraph`], which keep the source-adjacent and sink-adjacent node sets up to date.

use crate::error::SubgraphError;

use rustc_hash::FxHashMap;

use std::collections::BTreeSet;
use std::fmt::Display;


//-----------------------------------------------------------------------------

/// Identifier of a node in a [`Subgraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    /// Returns the raw value of the key.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of an edge in a [`Subgraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(usize);

impl EdgeKey {
    /// Returns the raw value of the key.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

//-----------------------------------------------------------------------------

/// Metadata retrieved for a segment node from the source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentMetadata {
    genomes: BTreeSet<String>,
}

impl SegmentMetadata {
    /// Creates metadata with the given set of genomes visiting the node.
    pub fn new(genomes: BTreeSet<String>) -> Self {
        SegmentMetadata { genomes }
    }

    /// Returns the names of the genomes visiting the node.
    #[inline]
    pub fn genomes(&self) -> &BTreeSet<String> {
        &self.genomes
    }

    /// Returns the number of genomes visiting the node.
    #[inline]
    pub fn genome_count(&self) -> usize {
        self.genomes.len()
    }
}

/// A node of the global graph materialized in a subgraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    id: usize,
    file_offset: Option<u64>,
    sequence_len: usize,
    metadata: Option<SegmentMetadata>,
}

impl Segment {
    /// Creates a segment without metadata.
    pub fn new(id: usize, file_offset: Option<u64>, sequence_len: usize) -> Self {
        Segment { id, file_offset, sequence_len, metadata: None }
    }

    /// Returns the identifier of the node in the global graph.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the byte offset of the node metadata in the source file.
    #[inline]
    pub fn file_offset(&self) -> Option<u64> {
        self.file_offset
    }

    /// Returns the sequence length in bp.
    #[inline]
    pub fn sequence_len(&self) -> usize {
        self.sequence_len
    }

    /// Returns the metadata, or [`None`] if it has not been retrieved yet.
    #[inline]
    pub fn metadata(&self) -> Option<&SegmentMetadata> {
        self.metadata.as_ref()
    }
}

//-----------------------------------------------------------------------------

/// The kind of a subgraph node with its kind-specific payload.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A node of the global graph.
    Segment(Segment),

    /// A zero-length placeholder routing an edge around other nodes.
    /// `from` and `to` are the original non-diversion endpoints of the routed edge.
    Diversion { from: NodeKey, to: NodeKey },

    /// A zero-length placeholder without edges occupying vertical space.
    Filler,

    /// A bubble folded into a single node.
    /// The members are the removed segment nodes.
    Aggregate { members: Vec<Node> },
}

impl NodeKind {
    /// Returns a short name for the kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Segment(_) => "segment",
            NodeKind::Diversion { .. } => "diversion",
            NodeKind::Filler => "filler",
            NodeKind::Aggregate { .. } => "aggregate",
        }
    }

    /// Returns `true` if this kind is created by window-local layout.
    pub fn is_layout_artifact(&self) -> bool {
        matches!(self, NodeKind::Diversion { .. } | NodeKind::Filler)
    }
}

/// Position of a node in the window-local layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placement {
    pub layer: usize,
    pub row: usize,
}

/// A node in a [`Subgraph`].
///
/// Two nodes are equal if they have the same key.
#[derive(Clone, Debug)]
pub struct Node {
    key: NodeKey,
    kind: NodeKind,
    x: i64,
    y: f64,
    placement: Option<Placement>,
    outgoing: Vec<EdgeKey>,
    incoming: Vec<EdgeKey>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Node {}

impl Node {
    fn new(key: NodeKey, kind: NodeKind) -> Self {
        Node {
            key,
            kind,
            x: crate::CompactGraph::UNSET,
            y: 0.0,
            placement: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Returns the key of the node.
    #[inline]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Returns the kind of the node.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the segment payload, or [`None`] for synthetic nodes.
    pub fn segment(&self) -> Option<&Segment> {
        match &self.kind {
            NodeKind::Segment(segment) => Some(segment),
            _ => None,
        }
    }

    /// Returns `true` if the node is a diversion node.
    #[inline]
    pub fn is_diversion(&self) -> bool {
        matches!(self.kind, NodeKind::Diversion { .. })
    }

    /// Returns the sequence length of the node.
    ///
    /// Synthetic placeholders have length 0 and aggregate nodes the length of their longest member.
    pub fn sequence_len(&self) -> usize {
        match &self.kind {
            NodeKind::Segment(segment) => segment.sequence_len(),
            NodeKind::Aggregate { members } => members.iter().map(|member| member.sequence_len()).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Returns the genomes visiting the node, or [`None`] if not known.
    ///
    /// Aggregate nodes report the union over their members, if all members have metadata.
    /// Diversion and filler nodes never have genomes of their own.
    pub fn genomes(&self) -> Option<BTreeSet<String>> {
        match &self.kind {
            NodeKind::Segment(segment) => segment.metadata().map(|metadata| metadata.genomes().clone()),
            NodeKind::Aggregate { members } => {
                let mut result = BTreeSet::new();
                for member in members.iter() {
                    result.extend(member.genomes()?);
                }
                Some(result)
            },
            _ => None,
        }
    }

    /// Returns the horizontal coordinate of the node.
    #[inline]
    pub fn x(&self) -> i64 {
        self.x
    }

    /// Returns the vertical coordinate of the node.
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the window-local placement, if the node has been laid out.
    #[inline]
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Returns the outgoing edges in insertion order.
    #[inline]
    pub fn outgoing(&self) -> &[EdgeKey] {
        &self.outgoing
    }

    /// Returns the incoming edges in insertion order.
    #[inline]
    pub fn incoming(&self) -> &[EdgeKey] {
        &self.incoming
    }
}

//-----------------------------------------------------------------------------

/// The kind of a subgraph edge with its kind-specific payload.
#[derive(Clone, Debug)]
pub enum EdgeKind {
    /// An edge of the global graph.
    /// `genomes` is the set of genomes traversing the edge, once computed.
    Link { file_offset: Option<u64>, genomes: Option<BTreeSet<String>> },

    /// Part of a chain of diversion edges substituting for a detached link.
    Diversion { original: EdgeKey },

    /// Replaces a bundle of edges removed by aggregation.
    Aggregate { bundle: Vec<Edge> },
}

impl EdgeKind {
    /// Creates a link edge without genome information.
    pub fn link(file_offset: Option<u64>) -> Self {
        EdgeKind::Link { file_offset, genomes: None }
    }

    /// Returns a short name for the kind.
    pub fn name(&self) -> &'static str {
        match self {
            EdgeKind::Link { .. } => "link",
            EdgeKind::Diversion { .. } => "diversion",
            EdgeKind::Aggregate { .. } => "aggregate",
        }
    }
}

/// An edge in a [`Subgraph`].
///
/// Two edges are equal if they have the same key.
#[derive(Clone, Debug)]
pub struct Edge {
    key: EdgeKey,
    from: NodeKey,
    to: NodeKey,
    kind: EdgeKind,
    // Genomes attributed to the edge by path computation.
    genomes: Option<BTreeSet<String>>,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Edge {}

impl Edge {
    /// Returns the key of the edge.
    #[inline]
    pub fn key(&self) -> EdgeKey {
        self.key
    }

    /// Returns the source node of the edge.
    #[inline]
    pub fn from(&self) -> NodeKey {
        self.from
    }

    /// Returns the destination node of the edge.
    #[inline]
    pub fn to(&self) -> NodeKey {
        self.to
    }

    /// Returns the kind of the edge.
    #[inline]
    pub fn kind(&self) -> &EdgeKind {
        &self.kind
    }

    /// Returns the genomes attributed to the edge, or [`None`] if paths have not been computed.
    #[inline]
    pub fn genomes(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            EdgeKind::Link { genomes, .. } => genomes.as_ref(),
            _ => self.genomes.as_ref(),
        }
    }

    pub(crate) fn set_genomes(&mut self, value: BTreeSet<String>) {
        match &mut self.kind {
            EdgeKind::Link { genomes, .. } => *genomes = Some(value),
            _ => self.genomes = Some(value),
        }
    }
}

//-----------------------------------------------------------------------------

/// A materialized, mutable set of nodes and edges.
///
/// The subgraph tracks two derived node sets: source-adjacent nodes have no incoming edges inside the subgraph, and sink-adjacent nodes have no outgoing edges.
/// Filler nodes have no edges but are not included in either set.
///
/// # Examples
///
/// ```
/// use seqgraph_view::subgraph::{EdgeKind, Segment, Subgraph};
///
/// let mut subgraph = Subgraph::new();
/// let a = subgraph.add_segment(Segment::new(1, None, 3));
/// let b = subgraph.add_segment(Segment::new(2, None, 1));
/// assert!(subgraph.source_adjacent().contains(&b));
///
/// let edge = subgraph.add_edge(a, b, EdgeKind::link(None)).unwrap();
/// assert!(subgraph.source_adjacent().contains(&a));
/// assert!(!subgraph.source_adjacent().contains(&b));
/// assert!(subgraph.sink_adjacent().contains(&b));
///
/// subgraph.remove_edge(edge);
/// assert!(subgraph.source_adjacent().contains(&b));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Subgraph {
    nodes: FxHashMap<NodeKey, Node>,
    edges: FxHashMap<EdgeKey, Edge>,

    // Global node identifier to segment node.
    segments: FxHashMap<usize, NodeKey>,

    // Links substituted by chains of diversion edges.
    detached: FxHashMap<EdgeKey, Edge>,

    source_adjacent: BTreeSet<NodeKey>,
    sink_adjacent: BTreeSet<NodeKey>,

    next_node: usize,
    next_edge: usize,
}

//-----------------------------------------------------------------------------

/// Construction and modification.
impl Subgraph {
    /// Creates an empty subgraph.
    pub fn new() -> Self {
        Subgraph::default()
    }

    /// Removes all nodes and edges.
    ///
    /// Keys are not reused after clearing.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.segments.clear();
        self.detached.clear();
        self.source_adjacent.clear();
        self.sink_adjacent.clear();
    }

    /// Adds a segment node and returns its key.
    ///
    /// If the subgraph already contains a segment with the same global identifier, returns the existing key.
    pub fn add_segment(&mut self, segment: Segment) -> NodeKey {
        if let Some(key) = self.segments.get(&segment.id()) {
            return *key;
        }
        let id = segment.id();
        let key = self.add_node_internal(NodeKind::Segment(segment));
        self.segments.insert(id, key);
        key
    }

    /// Adds a node of any kind and returns its key.
    ///
    /// Segment nodes are added with [`Self::add_segment`].
    pub fn add_node(&mut self, kind: NodeKind) -> NodeKey {
        match kind {
            NodeKind::Segment(segment) => self.add_segment(segment),
            kind => self.add_node_internal(kind),
        }
    }

    fn add_node_internal(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_node);
        self.next_node += 1;
        self.insert_node(Node::new(key, kind));
        key
    }

    // Inserts a node with an existing key and no edges.
    fn insert_node(&mut self, mut node: Node) {
        node.outgoing.clear();
        node.incoming.clear();
        let key = node.key;
        if let NodeKind::Segment(segment) = &node.kind {
            self.segments.insert(segment.id(), key);
        }
        if !matches!(node.kind, NodeKind::Filler) {
            self.source_adjacent.insert(key);
            self.sink_adjacent.insert(key);
        }
        self.nodes.insert(key, node);
    }

    /// Removes the node and all edges incident to it.
    ///
    /// Returns the removed node without edges, or [`None`] if the node did not exist.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        let (outgoing, incoming) = {
            let node = self.nodes.get(&key)?;
            (node.outgoing.clone(), node.incoming.clone())
        };
        for edge in outgoing.into_iter().chain(incoming) {
            self.remove_edge(edge);
        }
        let mut node = self.nodes.remove(&key)?;
        node.outgoing.clear();
        node.incoming.clear();
        if let NodeKind::Segment(segment) = &node.kind {
            self.segments.remove(&segment.id());
        }
        self.source_adjacent.remove(&key);
        self.sink_adjacent.remove(&key);
        Some(node)
    }

    /// Removes the segment node with the given global identifier.
    pub fn remove_segment(&mut self, id: usize) -> Option<Node> {
        let key = *self.segments.get(&id)?;
        self.remove_node(key)
    }

    /// Adds an edge and returns its key.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is not in the subgraph or is a filler node.
    pub fn add_edge(&mut self, from: NodeKey, to: NodeKey, kind: EdgeKind) -> Result<EdgeKey, SubgraphError> {
        self.check_endpoint(from)?;
        self.check_endpoint(to)?;
        let key = EdgeKey(self.next_edge);
        self.next_edge += 1;
        self.insert_edge(Edge { key, from, to, kind, genomes: None });
        Ok(key)
    }

    fn check_endpoint(&self, key: NodeKey) -> Result<(), SubgraphError> {
        match self.nodes.get(&key) {
            None => Err(SubgraphError::NoSuchNode(key.index())),
            Some(node) if matches!(node.kind, NodeKind::Filler) => Err(SubgraphError::Unsupported {
                node: key.index(), kind: "filler", operation: "adding an edge",
            }),
            Some(_) => Ok(()),
        }
    }

    // Inserts an edge with an existing key. The endpoints must exist.
    fn insert_edge(&mut self, edge: Edge) {
        let (key, from, to) = (edge.key, edge.from, edge.to);
        if let Some(node) = self.nodes.get_mut(&from) {
            node.outgoing.push(key);
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            node.incoming.push(key);
        }
        self.sink_adjacent.remove(&from);
        self.source_adjacent.remove(&to);
        self.edges.insert(key, edge);
    }

    /// Removes the edge and returns it, or [`None`] if the edge did not exist.
    pub fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        let edge = self.edges.remove(&key)?;
        if let Some(node) = self.nodes.get_mut(&edge.from) {
            node.outgoing.retain(|x| *x != key);
            if node.outgoing.is_empty() {
                self.sink_adjacent.insert(edge.from);
            }
        }
        if let Some(node) = self.nodes.get_mut(&edge.to) {
            node.incoming.retain(|x| *x != key);
            if node.incoming.is_empty() {
                self.source_adjacent.insert(edge.to);
            }
        }
        Some(edge)
    }

    /// Removes a set of edges and adds another set of edges as a single operation.
    ///
    /// Returns the keys of the added edges in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error without changing the subgraph if any removed edge or any endpoint of an added edge does not exist.
    /// Endpoints must survive the removals, which only remove edges.
    pub fn rewire(&mut self, remove: &[EdgeKey], add: Vec<(NodeKey, NodeKey, EdgeKind)>) -> Result<Vec<EdgeKey>, SubgraphError> {
        for key in remove.iter() {
            if !self.edges.contains_key(key) {
                return Err(SubgraphError::NoSuchEdge(key.index()));
            }
        }
        for (from, to, _) in add.iter() {
            self.check_endpoint(*from)?;
            self.check_endpoint(*to)?;
        }
        for key in remove.iter() {
            self.remove_edge(*key);
        }
        let mut result = Vec::with_capacity(add.len());
        for (from, to, kind) in add {
            result.push(self.add_edge(from, to, kind)?);
        }
        Ok(result)
    }

    /// Detaches a link edge from the subgraph but keeps it available for [`Self::reattach_edge`].
    ///
    /// # Errors
    ///
    /// Returns an error if the edge does not exist.
    pub fn detach_edge(&mut self, key: EdgeKey) -> Result<(), SubgraphError> {
        let edge = self.remove_edge(key).ok_or(SubgraphError::NoSuchEdge(key.index()))?;
        self.detached.insert(key, edge);
        Ok(())
    }

    /// Reattaches a detached edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge has not been detached or its endpoints no longer exist.
    pub fn reattach_edge(&mut self, key: EdgeKey) -> Result<(), SubgraphError> {
        let edge = self.detached.get(&key).ok_or(SubgraphError::NoSuchEdge(key.index()))?;
        self.check_endpoint(edge.from)?;
        self.check_endpoint(edge.to)?;
        if let Some(edge) = self.detached.remove(&key) {
            self.insert_edge(edge);
        }
        Ok(())
    }

    /// Drops a detached edge for good and returns it.
    pub fn discard_detached(&mut self, key: EdgeKey) -> Option<Edge> {
        self.detached.remove(&key)
    }

    /// Returns a detached edge.
    pub fn detached_edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.detached.get(&key)
    }

    /// Returns the keys of all detached edges in sorted order.
    pub fn detached_keys(&self) -> Vec<EdgeKey> {
        let mut result: Vec<EdgeKey> = self.detached.keys().copied().collect();
        result.sort_unstable();
        result
    }

    // Reinserts a node removed earlier, together with edges removed earlier.
    // Used for reversing aggregation.
    pub(crate) fn restore(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        for node in nodes {
            self.insert_node(node);
        }
        for edge in edges {
            if self.nodes.contains_key(&edge.from) && self.nodes.contains_key(&edge.to) {
                self.insert_edge(edge);
            }
        }
    }

    /// Sets the coordinates of the node.
    pub fn set_position(&mut self, key: NodeKey, x: i64, y: f64) -> Result<(), SubgraphError> {
        let node = self.nodes.get_mut(&key).ok_or(SubgraphError::NoSuchNode(key.index()))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Sets the window-local placement of the node.
    pub fn set_placement(&mut self, key: NodeKey, placement: Option<Placement>) -> Result<(), SubgraphError> {
        let node = self.nodes.get_mut(&key).ok_or(SubgraphError::NoSuchNode(key.index()))?;
        node.placement = placement;
        Ok(())
    }

    /// Attaches metadata to a segment node.
    ///
    /// # Errors
    ///
    /// Returns [`SubgraphError::Unsupported`] if the node is not a segment node.
    pub fn set_metadata(&mut self, key: NodeKey, metadata: SegmentMetadata) -> Result<(), SubgraphError> {
        let node = self.nodes.get_mut(&key).ok_or(SubgraphError::NoSuchNode(key.index()))?;
        match &mut node.kind {
            NodeKind::Segment(segment) => {
                segment.metadata = Some(metadata);
                Ok(())
            },
            kind => Err(SubgraphError::Unsupported {
                node: key.index(), kind: kind.name(), operation: "setting metadata",
            }),
        }
    }

    pub(crate) fn edge_mut(&mut self, key: EdgeKey) -> Option<&mut Edge> {
        self.edges.get_mut(&key)
    }
}

//-----------------------------------------------------------------------------

/// Queries.
impl Subgraph {
    /// Returns the number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges, excluding detached edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the subgraph has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given key.
    #[inline]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    /// Returns the edge with the given key.
    #[inline]
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(&key)
    }

    /// Returns `true` if the node is in the subgraph.
    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Returns the key of the segment node with the given global identifier.
    #[inline]
    pub fn segment(&self, id: usize) -> Option<NodeKey> {
        self.segments.get(&id).copied()
    }

    /// Returns `true` if the subgraph contains a segment node with the given global identifier.
    #[inline]
    pub fn contains_segment(&self, id: usize) -> bool {
        self.segments.contains_key(&id)
    }

    /// Returns the global identifiers of the segment nodes in sorted order.
    pub fn segment_ids(&self) -> BTreeSet<usize> {
        self.segments.keys().copied().collect()
    }

    /// Returns the keys of all nodes in sorted order.
    pub fn node_keys(&self) -> Vec<NodeKey> {
        let mut result: Vec<NodeKey> = self.nodes.keys().copied().collect();
        result.sort_unstable();
        result
    }

    /// Returns the keys of all edges in sorted order.
    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        let mut result: Vec<EdgeKey> = self.edges.keys().copied().collect();
        result.sort_unstable();
        result
    }

    /// Returns an iterator over the nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over the edges in arbitrary order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Returns the successors of the node in edge order.
    pub fn successors(&self, key: NodeKey) -> Vec<NodeKey> {
        self.nodes.get(&key).map_or(Vec::new(), |node| {
            node.outgoing.iter().filter_map(|edge| self.edges.get(edge)).map(|edge| edge.to).collect()
        })
    }

    /// Returns the predecessors of the node in edge order.
    pub fn predecessors(&self, key: NodeKey) -> Vec<NodeKey> {
        self.nodes.get(&key).map_or(Vec::new(), |node| {
            node.incoming.iter().filter_map(|edge| self.edges.get(edge)).map(|edge| edge.from).collect()
        })
    }

    /// Returns the first edge from `from` to `to`, if any.
    pub fn find_edge(&self, from: NodeKey, to: NodeKey) -> Option<EdgeKey> {
        let node = self.nodes.get(&from)?;
        node.outgoing.iter().copied().find(|key| self.edges.get(key).is_some_and(|edge| edge.to == to))
    }

    /// Returns the nodes without incoming edges inside the subgraph.
    #[inline]
    pub fn source_adjacent(&self) -> &BTreeSet<NodeKey> {
        &self.source_adjacent
    }

    /// Returns the nodes without outgoing edges inside the subgraph.
    #[inline]
    pub fn sink_adjacent(&self) -> &BTreeSet<NodeKey> {
        &self.sink_adjacent
    }

    /// Returns `true` if every segment node, including the members of aggregate nodes, has metadata.
    pub fn has_complete_metadata(&self) -> bool {
        self.nodes.values().all(|node| match &node.kind {
            NodeKind::Segment(segment) => segment.metadata.is_some(),
            NodeKind::Aggregate { .. } => node.genomes().is_some(),
            _ => true,
        })
    }
}

//-----------------------------------------------------------------------------
