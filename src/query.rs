//! Windowed queries: an incrementally maintained cache of the nodes near a centre node.
//!
//! [`WindowedQuery`] answers "which nodes lie within `radius` hops of `centre`" for a frozen [`CompactGraph`].
//! Hops follow edges in both directions, and the global sentinels are never part of a window.
//! The cache is approximate: it always contains the requested window, but it may contain extra nodes until the next full rebuild.
//!
//! Membership changes are synchronous.
//! The window-local layout is recomputed on a background thread, at most once per [`QueryPolicy::throttle`] interval.
//! Callers learn about new layouts through [`QueryEvent::LayoutDone`] events.

use crate::{BubbleAggregator, CompactGraph, DistanceIndex, GraphIterator, WindowLayout};
use crate::error::{LayoutError, QueryError};
use crate::metadata::{FetchSummary, MetadataFetcher, MetadataSource};
use crate::subgraph::{EdgeKind, Segment, SegmentMetadata, Subgraph};

use crossbeam::channel::{self, Receiver, Sender};

use std::fmt::Display;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};


//-----------------------------------------------------------------------------

/// Tunable thresholds for maintaining the windowed cache.
///
/// # Examples
///
/// ```
/// use seqgraph_view::QueryPolicy;
/// use std::time::Duration;
///
/// let policy = QueryPolicy::new();
/// assert_eq!(policy.recentre_ratio(), QueryPolicy::DEFAULT_RECENTRE_RATIO);
/// assert_eq!(policy.throttle(), QueryPolicy::DEFAULT_THROTTLE);
///
/// let policy = policy.with_max_increment(2).with_throttle(Duration::from_millis(10));
/// assert_eq!(policy.max_increment(), 2);
/// assert_eq!(policy.throttle(), Duration::from_millis(10));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryPolicy {
    recentre_ratio: usize,
    max_increment: usize,
    max_slack: usize,
    throttle: Duration,
    aggregate: bool,
}

impl QueryPolicy {
    /// Default value for the re-centring ratio.
    pub const DEFAULT_RECENTRE_RATIO: usize = 2;

    /// Default value for the largest radius increase handled incrementally.
    pub const DEFAULT_MAX_INCREMENT: usize = 5;

    /// Default value for the largest tolerated difference between the cached and the requested radius.
    pub const DEFAULT_MAX_SLACK: usize = 10;

    /// Default value for the minimum interval between window layouts.
    pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(50);

    /// Default value for the bubble aggregation flag.
    pub const DEFAULT_AGGREGATE: bool = false;

    /// Creates a policy with the default values.
    pub fn new() -> Self {
        QueryPolicy {
            recentre_ratio: Self::DEFAULT_RECENTRE_RATIO,
            max_increment: Self::DEFAULT_MAX_INCREMENT,
            max_slack: Self::DEFAULT_MAX_SLACK,
            throttle: Self::DEFAULT_THROTTLE,
            aggregate: Self::DEFAULT_AGGREGATE,
        }
    }

    /// Returns an updated policy with the given re-centring ratio.
    ///
    /// When the centre moves and the cached radius exceeds `ratio * radius`, the cache is rebuilt.
    pub fn with_recentre_ratio(self, recentre_ratio: usize) -> Self {
        QueryPolicy { recentre_ratio, ..self }
    }

    /// Returns an updated policy with the given maximum increment.
    ///
    /// Radius increases larger than this rebuild the cache.
    pub fn with_max_increment(self, max_increment: usize) -> Self {
        QueryPolicy { max_increment, ..self }
    }

    /// Returns an updated policy with the given maximum slack.
    ///
    /// When the radius decreases and the cached radius exceeds the requested radius by more than this, the cache is rebuilt.
    pub fn with_max_slack(self, max_slack: usize) -> Self {
        QueryPolicy { max_slack, ..self }
    }

    /// Returns an updated policy with the given minimum interval between window layouts.
    pub fn with_throttle(self, throttle: Duration) -> Self {
        QueryPolicy { throttle, ..self }
    }

    /// Returns an updated policy with the given bubble aggregation flag.
    ///
    /// If set, simple bubbles are folded into aggregate nodes before each window layout.
    pub fn with_aggregate(self, aggregate: bool) -> Self {
        QueryPolicy { aggregate, ..self }
    }

    /// Returns the re-centring ratio.
    pub fn recentre_ratio(&self) -> usize {
        self.recentre_ratio
    }

    /// Returns the largest radius increase handled incrementally.
    pub fn max_increment(&self) -> usize {
        self.max_increment
    }

    /// Returns the largest tolerated slack before a shrinking rebuild.
    pub fn max_slack(&self) -> usize {
        self.max_slack
    }

    /// Returns the minimum interval between window layouts.
    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Returns `true` if bubbles are aggregated before window layout.
    pub fn aggregate(&self) -> bool {
        self.aggregate
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QueryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f, "(ratio {}, increment {}, slack {}, throttle {} ms{})",
            self.recentre_ratio, self.max_increment, self.max_slack, self.throttle.as_millis(),
            if self.aggregate { ", aggregate" } else { "" }
        )
    }
}

//-----------------------------------------------------------------------------

/// Notifications emitted by a [`WindowedQuery`].
#[derive(Clone, Debug)]
pub enum QueryEvent {
    /// The window changed. Emitted synchronously by the call that changed it.
    QueryChanged { generation: u64, centre: usize, radius: usize, cached_radius: usize },

    /// A window layout finished for the snapshot taken at the given generation.
    LayoutDone { generation: u64, subgraph: Box<Subgraph>, layout: WindowLayout },

    /// A window layout failed.
    LayoutFailed { generation: u64, error: LayoutError },
}

/// A receiver for [`QueryEvent`]s.
///
/// Layout events are published from the layout thread.
pub trait EventSink: Send + Sync {
    /// Delivers the event.
    fn publish(&self, event: QueryEvent);
}

impl EventSink for Sender<QueryEvent> {
    fn publish(&self, event: QueryEvent) {
        // A disconnected receiver is not interested in further events.
        let _ = self.send(event);
    }
}

//-----------------------------------------------------------------------------

struct LayoutRequest {
    generation: u64,
    subgraph: Subgraph,
}

// Background thread that lays out the newest snapshot, at most once per throttle interval.
struct LayoutWorker {
    sender: Option<Sender<LayoutRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutWorker {
    fn spawn(policy: QueryPolicy, sink: Arc<dyn EventSink>) -> Self {
        let (sender, receiver) = channel::unbounded();
        let handle = thread::spawn(move || Self::run(receiver, policy, sink));
        LayoutWorker { sender: Some(sender), handle: Some(handle) }
    }

    fn request(&self, generation: u64, subgraph: Subgraph) {
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send(LayoutRequest { generation, subgraph });
        }
    }

    fn run(receiver: Receiver<LayoutRequest>, policy: QueryPolicy, sink: Arc<dyn EventSink>) {
        let mut last_run: Option<Instant> = None;
        while let Ok(mut request) = receiver.recv() {
            if let Some(last_run) = last_run {
                let elapsed = last_run.elapsed();
                if elapsed < policy.throttle() {
                    thread::sleep(policy.throttle() - elapsed);
                }
            }
            let mut coalesced = 0;
            while let Ok(newer) = receiver.try_recv() {
                request = newer;
                coalesced += 1;
            }
            if coalesced > 0 {
                debug!("Coalesced {} layout requests into generation {}", coalesced, request.generation);
            }

            let generation = request.generation;
            let mut subgraph = request.subgraph;
            if policy.aggregate() {
                BubbleAggregator::aggregate_all(&mut subgraph);
            }
            let event = match WindowLayout::run(&mut subgraph) {
                Ok(layout) => QueryEvent::LayoutDone { generation, subgraph: Box::new(subgraph), layout },
                Err(error) => {
                    warn!("Window layout for generation {} failed: {}", generation, error);
                    QueryEvent::LayoutFailed { generation, error }
                },
            };
            last_run = Some(Instant::now());
            sink.publish(event);
        }
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        // Disconnecting the channel stops the thread once the pending requests are done.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//-----------------------------------------------------------------------------

/// An incrementally maintained window of nodes within `radius` hops of `centre`.
///
/// The cached window is a [`Subgraph`] with a segment node for every cached node of the graph and a link edge for every graph edge between cached nodes.
/// Segment nodes are positioned at their global FAFOSP coordinates.
/// A [`DistanceIndex`] records the distance of each cached node from the centre of the last full rebuild.
///
/// Every call that changes the window validates its arguments first and fails without changing any state.
/// On success, it emits [`QueryEvent::QueryChanged`] and schedules a window layout.
///
/// # Examples
///
/// ```
/// use seqgraph_view::{CompactGraphBuilder, FafospLayout, QueryEvent, QueryPolicy, WindowedQuery};
/// use std::sync::Arc;
///
/// let mut builder = CompactGraphBuilder::new();
/// for _ in 0..5 {
///     builder.add_node(None, 1);
/// }
/// for id in 1..5 {
///     builder.add_edge(id, id + 1, None).unwrap();
/// }
/// let mut graph = builder.build().unwrap();
/// FafospLayout::run(&mut graph).unwrap();
///
/// let (sender, receiver) = crossbeam::channel::unbounded();
/// let mut query = WindowedQuery::new(Arc::new(graph), QueryPolicy::new(), Arc::new(sender));
/// query.query(3, 1).unwrap();
/// assert_eq!(query.cached_subgraph().segment_ids().into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
/// assert!(matches!(receiver.recv().unwrap(), QueryEvent::QueryChanged { centre: 3, radius: 1, .. }));
///
/// query.set_center(4).unwrap();
/// assert!(query.cached_subgraph().contains_segment(5));
/// ```
pub struct WindowedQuery {
    graph: Arc<CompactGraph>,
    policy: QueryPolicy,

    centre: Option<usize>,
    radius: usize,
    cached_centre: Option<usize>,
    cached_radius: usize,

    subgraph: Subgraph,
    distances: DistanceIndex,
    generation: u64,

    sink: Arc<dyn EventSink>,
    worker: LayoutWorker,
    fetcher: Option<MetadataFetcher>,
}

/// Construction and configuration.
impl WindowedQuery {
    /// Creates a query over the graph with an empty window.
    ///
    /// Starts the layout thread.
    pub fn new(graph: Arc<CompactGraph>, policy: QueryPolicy, sink: Arc<dyn EventSink>) -> Self {
        let worker = LayoutWorker::spawn(policy, sink.clone());
        WindowedQuery {
            graph,
            policy,
            centre: None,
            radius: 0,
            cached_centre: None,
            cached_radius: 0,
            subgraph: Subgraph::new(),
            distances: DistanceIndex::new(),
            generation: 0,
            sink,
            worker,
            fetcher: None,
        }
    }

    /// Returns an updated query that retrieves segment metadata for each window in the background.
    pub fn with_metadata(self, source: Arc<dyn MetadataSource>) -> Self {
        WindowedQuery { fetcher: Some(MetadataFetcher::new(source)), ..self }
    }
}

//-----------------------------------------------------------------------------

/// Window changes.
impl WindowedQuery {
    /// Rebuilds the window around `centre` with the given radius.
    ///
    /// # Errors
    ///
    /// Returns an error if `centre` is not a node of the graph or is a sentinel.
    pub fn query(&mut self, centre: usize, radius: usize) -> Result<(), QueryError> {
        self.validate(centre)?;
        self.rebuild(centre, radius);
        self.changed();
        Ok(())
    }

    /// Moves the window to a new centre, keeping the radius.
    ///
    /// If the new centre is in the cache and the cache is not too large, the cache is grown incrementally until it covers the new window.
    /// Otherwise the cache is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns an error if `centre` is not a node of the graph or is a sentinel.
    pub fn set_center(&mut self, centre: usize) -> Result<(), QueryError> {
        self.validate(centre)?;
        let radius = self.radius;
        match self.distances.distance(centre) {
            Some(distance) if self.cached_radius <= self.policy.recentre_ratio().saturating_mul(radius) => {
                debug!("Re-centring from {:?} to {} incrementally", self.centre, centre);
                self.centre = Some(centre);
                self.extend_cache(distance + radius);
            },
            _ => self.rebuild(centre, radius),
        }
        self.changed();
        Ok(())
    }

    /// Changes the radius of the window, keeping the centre.
    ///
    /// Small increases grow the cache incrementally and larger increases rebuild it.
    /// Decreases keep the cache unless it becomes too large compared to the requested radius.
    /// Without a centre, this only stores the radius for the next [`Self::set_center`].
    ///
    /// # Errors
    ///
    /// Currently never fails, but returns a [`Result`] for consistency with the other window changes.
    pub fn set_radius(&mut self, radius: usize) -> Result<(), QueryError> {
        let centre = match self.centre {
            Some(centre) => centre,
            None => {
                self.radius = radius;
                return Ok(());
            },
        };
        let offset = self.distances.distance(centre).unwrap_or(0);
        if radius > self.radius {
            if radius - self.radius > self.policy.max_increment() {
                self.rebuild(centre, radius);
            } else {
                self.radius = radius;
                self.extend_cache(offset + radius);
            }
        } else {
            self.radius = radius;
            if self.cached_radius.saturating_sub(radius) > self.policy.max_slack() {
                self.rebuild(centre, radius);
            }
        }
        self.changed();
        Ok(())
    }

    /// Grows the cache by one hop around the centre of the last rebuild.
    ///
    /// Does nothing if there is no cache.
    pub fn increment_cache_radius(&mut self) {
        if self.cached_centre.is_none() {
            return;
        }
        let mut frontier = self.distances.nodes_at_distance(self.cached_radius);
        frontier.sort_unstable();
        let next = self.cached_radius + 1;
        let graph = self.graph.clone();
        let iter = GraphIterator::new(&graph);
        for node in frontier {
            let mut found: Vec<usize> = Vec::new();
            for direction in [crate::Direction::Left, crate::Direction::Right] {
                iter.visit_direct_neighbours(node, direction, |neighbour| {
                    if !graph.is_sentinel(neighbour) {
                        found.push(neighbour);
                    }
                });
            }
            for neighbour in found {
                if self.distances.set_distance(neighbour, next).is_none() {
                    self.materialize(neighbour);
                    self.connect(neighbour);
                }
            }
        }
        self.cached_radius = next;
    }

    // Invalid-argument checks, done before any state changes.
    fn validate(&self, centre: usize) -> Result<(), QueryError> {
        if !self.graph.contains(centre) {
            return Err(QueryError::CentreOutOfRange { centre, nodes: self.graph.node_count() });
        }
        if self.graph.is_sentinel(centre) {
            return Err(QueryError::SentinelCentre(centre));
        }
        Ok(())
    }

    // Full rebuild: bounded breadth-first search that does not enter the sentinels.
    fn rebuild(&mut self, centre: usize, radius: usize) {
        self.subgraph.clear();
        self.distances.clear();

        let graph = self.graph.clone();
        let iter = GraphIterator::new(&graph);
        let mut nodes: Vec<usize> = Vec::new();
        let distances = &mut self.distances;
        iter.visit_indirect_neighbours_within_range_where(
            centre, radius,
            |node| !graph.is_sentinel(node),
            |depth, node| {
                distances.set_distance(node, depth);
                nodes.push(node);
            }
        );
        for node in nodes.iter() {
            self.materialize(*node);
        }
        for from in nodes.iter() {
            let from_key = self.subgraph.segment(*from);
            for edge in graph.outgoing(*from) {
                if let (Some(from_key), Some(to_key)) = (from_key, self.subgraph.segment(edge.node)) {
                    let _ = self.subgraph.add_edge(from_key, to_key, EdgeKind::link(edge.file_offset));
                }
            }
        }

        self.centre = Some(centre);
        self.radius = radius;
        self.cached_centre = Some(centre);
        self.cached_radius = radius;
        debug!("Rebuilt the window around node {} with radius {}: {} nodes", centre, radius, nodes.len());
    }

    // Grows the cache until the cached radius is at least `target`.
    fn extend_cache(&mut self, target: usize) {
        let start = self.cached_radius;
        while self.cached_radius < target {
            self.increment_cache_radius();
        }
        if self.cached_radius > start {
            debug!("Extended the cached radius from {} to {}", start, self.cached_radius);
        }
    }

    // Adds a segment node for the graph node at its global coordinates.
    fn materialize(&mut self, node: usize) {
        let segment = Segment::new(node, self.graph.file_offset(node), self.graph.sequence_len(node));
        let key = self.subgraph.add_segment(segment);
        let _ = self.subgraph.set_position(key, self.graph.x(node), self.graph.y(node).unwrap_or(0.0));
        if let Some(metadata) = self.metadata(node) {
            let _ = self.subgraph.set_metadata(key, metadata);
        }
    }

    // Adds link edges between a newly materialized node and the cached nodes.
    fn connect(&mut self, node: usize) {
        let key = match self.subgraph.segment(node) {
            Some(key) => key,
            None => return,
        };
        for edge in self.graph.outgoing(node) {
            if let Some(to) = self.subgraph.segment(edge.node) {
                let _ = self.subgraph.add_edge(key, to, EdgeKind::link(edge.file_offset));
            }
        }
        for edge in self.graph.incoming(node) {
            if edge.node == node {
                continue;
            }
            if let Some(from) = self.subgraph.segment(edge.node) {
                let _ = self.subgraph.add_edge(from, key, EdgeKind::link(edge.file_offset));
            }
        }
    }

    // Notifies the sink, schedules a layout, and schedules metadata retrieval for the window.
    fn changed(&mut self) {
        self.generation += 1;
        self.refresh_metadata();
        if let Some(fetcher) = self.fetcher.as_mut() {
            let mut missing: Vec<(usize, Option<u64>)> = self.subgraph.segment_ids().into_iter()
                .map(|id| (id, self.graph.file_offset(id)))
                .collect();
            missing.retain(|(id, _)| fetcher.get(*id).is_none());
            fetcher.schedule(missing);
        }
        self.sink.publish(QueryEvent::QueryChanged {
            generation: self.generation,
            centre: self.centre.unwrap_or(0),
            radius: self.radius,
            cached_radius: self.cached_radius,
        });
        self.worker.request(self.generation, self.subgraph.clone());
    }
}

//-----------------------------------------------------------------------------

/// Metadata.
impl WindowedQuery {
    /// Returns the metadata for the node, or [`None`] if it is not available yet.
    pub fn metadata(&self, node: usize) -> Option<SegmentMetadata> {
        self.fetcher.as_ref()?.get(node)
    }

    /// Copies retrieved metadata into the cached window and returns the number of updated nodes.
    pub fn refresh_metadata(&mut self) -> usize {
        let fetcher = match self.fetcher.as_ref() {
            Some(fetcher) => fetcher,
            None => return 0,
        };
        let mut updated = 0;
        for id in self.subgraph.segment_ids() {
            let key = match self.subgraph.segment(id) {
                Some(key) => key,
                None => continue,
            };
            let missing = self.subgraph.node(key).and_then(|node| node.segment()).is_some_and(|segment| segment.metadata().is_none());
            if !missing {
                continue;
            }
            if let Some(metadata) = fetcher.get(id) {
                if self.subgraph.set_metadata(key, metadata).is_ok() {
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Waits for the current metadata task, copies the results into the cached window, and returns the task summary.
    ///
    /// Returns [`None`] if metadata retrieval is not enabled or no task is running.
    pub fn wait_for_metadata(&mut self) -> Option<FetchSummary> {
        let summary = self.fetcher.as_mut()?.wait();
        self.refresh_metadata();
        summary
    }
}

//-----------------------------------------------------------------------------

/// Accessors.
impl WindowedQuery {
    /// Returns the graph.
    #[inline]
    pub fn graph(&self) -> &CompactGraph {
        &self.graph
    }

    /// Returns the policy.
    #[inline]
    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Returns the requested centre, or [`None`] before the first query.
    #[inline]
    pub fn centre(&self) -> Option<usize> {
        self.centre
    }

    /// Returns the requested radius.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Returns the centre of the last full rebuild.
    ///
    /// Cached distances are relative to this node.
    #[inline]
    pub fn cached_centre(&self) -> Option<usize> {
        self.cached_centre
    }

    /// Returns the radius covered by the cache around [`Self::cached_centre`].
    #[inline]
    pub fn cached_radius(&self) -> usize {
        self.cached_radius
    }

    /// Returns the current cache, which contains at least the requested window.
    #[inline]
    pub fn cached_subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    /// Returns the distances of the cached nodes from [`Self::cached_centre`].
    #[inline]
    pub fn distances(&self) -> &DistanceIndex {
        &self.distances
    }

    /// Returns the number of window changes so far.
    ///
    /// Events carry the generation they belong to.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

//-----------------------------------------------------------------------------
