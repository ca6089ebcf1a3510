//! Folding simple bubbles of a [`Subgraph`] into aggregate nodes.

use crate::error::SubgraphError;
use crate::subgraph::{Edge, EdgeKind, Node, NodeKey, NodeKind, Subgraph};

use log::debug;

//-----------------------------------------------------------------------------

/// Detects and folds simple insertion/deletion bubbles.
///
/// A bubble starts at a node `N` and matches the following pattern:
///
/// * `N` has exactly two outgoing edges to distinct nodes `A` and `B`.
/// * `A` and `B` are segment nodes of sequence length 1.
/// * `A` and `B` have exactly one incoming edge each, from `N`.
/// * `A` and `B` have exactly one outgoing edge each, to the same node `S`.
/// * `S` has exactly two incoming edges.
///
/// Aggregation replaces `A` and `B` with a single aggregate node that owns them.
/// The edges from `N` and the edges into `S` are replaced with one aggregate edge each, which owns the original edges.
/// [`BubbleAggregator::expand`] reverses the aggregation.
///
/// # Examples
///
/// ```
/// use seqgraph_view::BubbleAggregator;
/// use seqgraph_view::subgraph::{EdgeKind, NodeKind, Segment, Subgraph};
///
/// let mut subgraph = Subgraph::new();
/// let keys: Vec<_> = [3, 1, 1, 3].iter().enumerate()
///     .map(|(i, len)| subgraph.add_segment(Segment::new(i + 1, None, *len)))
///     .collect();
/// for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
///     subgraph.add_edge(keys[from], keys[to], EdgeKind::link(None)).unwrap();
/// }
///
/// let aggregate = BubbleAggregator::aggregate(&mut subgraph, keys[0]).unwrap();
/// assert_eq!(subgraph.node_count(), 3);
/// assert_eq!(subgraph.successors(keys[0]), vec![aggregate]);
/// assert!(matches!(subgraph.node(aggregate).unwrap().kind(), NodeKind::Aggregate { .. }));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BubbleAggregator;

impl BubbleAggregator {
    /// Returns the branch nodes and the shared successor if a bubble starts at `start`.
    pub fn find_bubble(subgraph: &Subgraph, start: NodeKey) -> Option<([NodeKey; 2], NodeKey)> {
        let node = subgraph.node(start)?;
        if node.outgoing().len() != 2 {
            return None;
        }
        let branches = subgraph.successors(start);
        if branches.len() != 2 || branches[0] == branches[1] || branches.contains(&start) {
            return None;
        }

        let mut merge: Option<NodeKey> = None;
        for branch in branches.iter() {
            let branch_node = subgraph.node(*branch)?;
            let is_unit = branch_node.segment().is_some_and(|segment| segment.sequence_len() == 1);
            if !is_unit || branch_node.incoming().len() != 1 || branch_node.outgoing().len() != 1 {
                return None;
            }
            let next = *subgraph.successors(*branch).first()?;
            match merge {
                Some(previous) if previous != next => return None,
                _ => merge = Some(next),
            }
        }

        let merge = merge?;
        if merge == start || branches.contains(&merge) {
            return None;
        }
        if subgraph.node(merge)?.incoming().len() != 2 {
            return None;
        }
        Some(([branches[0], branches[1]], merge))
    }

    /// Folds the bubble starting at `start` into an aggregate node.
    ///
    /// Returns the key of the aggregate node, or [`None`] if the pattern does not match.
    /// The subgraph is not modified if there is no match.
    pub fn aggregate(subgraph: &mut Subgraph, start: NodeKey) -> Option<NodeKey> {
        let (branches, merge) = Self::find_bubble(subgraph, start)?;

        // Detach the bundles before removing the branch nodes.
        let mut entering: Vec<Edge> = Vec::with_capacity(2);
        let mut leaving: Vec<Edge> = Vec::with_capacity(2);
        for branch in branches {
            let (incoming, outgoing) = {
                let node = subgraph.node(branch)?;
                (node.incoming().to_vec(), node.outgoing().to_vec())
            };
            entering.extend(incoming.into_iter().filter_map(|edge| subgraph.remove_edge(edge)));
            leaving.extend(outgoing.into_iter().filter_map(|edge| subgraph.remove_edge(edge)));
        }
        let members: Vec<Node> = branches.iter().filter_map(|branch| subgraph.remove_node(*branch)).collect();

        let x = members.iter().map(|member| member.x()).max().unwrap_or(crate::CompactGraph::UNSET);
        let y = members.iter().map(|member| member.y()).sum::<f64>() / members.len() as f64;
        let aggregate = subgraph.add_node(NodeKind::Aggregate { members });
        let _ = subgraph.set_position(aggregate, x, y);

        // Both endpoints exist, so adding the edges cannot fail.
        let _ = subgraph.add_edge(start, aggregate, EdgeKind::Aggregate { bundle: entering });
        let _ = subgraph.add_edge(aggregate, merge, EdgeKind::Aggregate { bundle: leaving });
        Some(aggregate)
    }

    /// Applies [`Self::aggregate`] to every node of the subgraph once.
    ///
    /// Nodes are tried in key order, and overlapping bubbles are skipped.
    /// Bubbles that only appear after this pass require another pass.
    /// Returns the keys of the new aggregate nodes.
    pub fn aggregate_all(subgraph: &mut Subgraph) -> Vec<NodeKey> {
        let mut result = Vec::new();
        for key in subgraph.node_keys() {
            if let Some(aggregate) = Self::aggregate(subgraph, key) {
                result.push(aggregate);
            }
        }
        debug!("Aggregated {} bubbles in a subgraph of {} nodes", result.len(), subgraph.node_count());
        result
    }

    /// Reverses an aggregation and returns the keys of the restored nodes.
    ///
    /// The restored nodes and edges keep their original keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist, is not an aggregate node, or has edges that are not aggregate edges.
    /// The subgraph is not modified in that case.
    pub fn expand(subgraph: &mut Subgraph, aggregate: NodeKey) -> Result<Vec<NodeKey>, SubgraphError> {
        let node = subgraph.node(aggregate).ok_or(SubgraphError::NoSuchNode(aggregate.index()))?;
        if !matches!(node.kind(), NodeKind::Aggregate { .. }) {
            return Err(SubgraphError::Unsupported {
                node: aggregate.index(), kind: node.kind().name(), operation: "expanding",
            });
        }
        let incident: Vec<_> = node.incoming().iter().chain(node.outgoing().iter()).copied().collect();
        for key in incident.iter() {
            let edge = subgraph.edge(*key).ok_or(SubgraphError::NoSuchEdge(key.index()))?;
            if !matches!(edge.kind(), EdgeKind::Aggregate { .. }) {
                return Err(SubgraphError::Unsupported {
                    node: aggregate.index(), kind: "aggregate", operation: "expanding with non-aggregate edges",
                });
            }
        }

        let mut edges: Vec<Edge> = Vec::new();
        for key in incident {
            if let Some(edge) = subgraph.remove_edge(key) {
                if let EdgeKind::Aggregate { bundle } = edge.kind() {
                    edges.extend(bundle.iter().cloned());
                }
            }
        }
        let members = match subgraph.remove_node(aggregate).map(|node| node.kind().clone()) {
            Some(NodeKind::Aggregate { members }) => members,
            _ => Vec::new(),
        };
        let keys: Vec<NodeKey> = members.iter().map(|member| member.key()).collect();
        subgraph.restore(members, edges);
        Ok(keys)
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::internal;

    // 1 -> {2, 3} -> 4 with unit-length branches.
    fn bubble() -> (Subgraph, Vec<NodeKey>) {
        internal::build_subgraph(&[3, 1, 1, 3], &[(1, 2), (1, 3), (2, 4), (3, 4)])
    }

    fn snapshot(subgraph: &Subgraph) -> (Vec<NodeKey>, Vec<(NodeKey, NodeKey)>) {
        let mut edges: Vec<(NodeKey, NodeKey)> = subgraph.edges().map(|edge| (edge.from(), edge.to())).collect();
        edges.sort();
        (subgraph.node_keys(), edges)
    }

    fn check_no_match(lengths: &[usize], edges: &[(usize, usize)], name: &str) {
        let (mut subgraph, keys) = internal::build_subgraph(lengths, edges);
        let before = snapshot(&subgraph);
        for key in keys.iter() {
            assert_eq!(BubbleAggregator::aggregate(&mut subgraph, *key), None, "Aggregated {} at node {}", name, key);
        }
        assert_eq!(snapshot(&subgraph), before, "Subgraph was modified for {}", name);
    }

    #[test]
    fn simple_bubble() {
        let (mut subgraph, keys) = bubble();
        let aggregate = BubbleAggregator::aggregate(&mut subgraph, keys[0]);
        assert!(aggregate.is_some(), "Failed to aggregate a bubble");
        let aggregate = aggregate.unwrap();

        let node = subgraph.node(aggregate).unwrap();
        let mut members: Vec<usize> = match node.kind() {
            NodeKind::Aggregate { members } => members.iter().filter_map(|member| member.segment()).map(|segment| segment.id()).collect(),
            _ => panic!("The new node is not an aggregate node"),
        };
        members.sort();
        assert_eq!(members, vec![2, 3], "Wrong members in the aggregate node");
        assert!(!subgraph.contains(keys[1]) && !subgraph.contains(keys[2]), "Branch nodes are still in the subgraph");

        assert_eq!(subgraph.successors(keys[0]), vec![aggregate], "Start node should have a single edge to the aggregate");
        assert_eq!(subgraph.predecessors(keys[3]), vec![aggregate], "Merge node should have a single edge from the aggregate");
        for key in subgraph.node(aggregate).unwrap().incoming().iter().chain(subgraph.node(aggregate).unwrap().outgoing()) {
            match subgraph.edge(*key).unwrap().kind() {
                EdgeKind::Aggregate { bundle } => assert_eq!(bundle.len(), 2, "Wrong number of bundled edges"),
                kind => panic!("Edge {} is a {} edge", key, kind.name()),
            }
        }
        assert_eq!(subgraph.node(aggregate).unwrap().sequence_len(), 1, "Wrong sequence length for the aggregate");
    }

    #[test]
    fn non_matching_patterns() {
        check_no_match(&[3, 1, 1, 1, 3], &[(1, 2), (1, 3), (1, 4), (2, 5), (3, 5), (4, 5)], "three branches");
        check_no_match(&[3, 2, 1, 3], &[(1, 2), (1, 3), (2, 4), (3, 4)], "a long branch");
        check_no_match(&[3, 1, 1, 3, 3], &[(1, 2), (1, 3), (2, 4), (3, 5)], "diverging branches");
        check_no_match(&[3, 1, 1, 3, 3], &[(1, 2), (1, 3), (2, 4), (3, 4), (5, 4)], "a third path into the merge");
        check_no_match(&[3, 1, 1, 3, 3], &[(1, 2), (1, 3), (2, 4), (3, 4), (5, 2)], "a branch with two predecessors");
        check_no_match(&[3, 1, 3], &[(1, 2), (1, 3), (2, 3)], "a deletion edge");
    }

    #[test]
    fn aggregate_all_chain() {
        // Two consecutive bubbles sharing node 4.
        let (mut subgraph, keys) = internal::build_subgraph(
            &[3, 1, 1, 3, 1, 1, 3],
            &[(1, 2), (1, 3), (2, 4), (3, 4), (4, 5), (4, 6), (5, 7), (6, 7)]
        );
        let aggregates = BubbleAggregator::aggregate_all(&mut subgraph);
        assert_eq!(aggregates.len(), 2, "Wrong number of aggregated bubbles");
        assert_eq!(subgraph.node_count(), 5, "Wrong number of nodes after aggregation");
        assert_eq!(subgraph.successors(keys[3]), vec![aggregates[1]], "The second bubble was not aggregated");
        assert_eq!(BubbleAggregator::aggregate_all(&mut subgraph).len(), 0, "A second pass found more bubbles");
    }

    #[test]
    fn expand_reverses_aggregation() {
        let (mut subgraph, keys) = bubble();
        internal::init_logger();
        subgraph.set_metadata(keys[1], internal::metadata(&["A"])).unwrap();
        subgraph.set_metadata(keys[2], internal::metadata(&["B"])).unwrap();
        let before = snapshot(&subgraph);

        let aggregate = BubbleAggregator::aggregate(&mut subgraph, keys[0]).unwrap();
        assert_eq!(subgraph.node(aggregate).unwrap().genomes(), Some(internal::genomes(&["A", "B"])), "Wrong genomes for the aggregate");

        let result = BubbleAggregator::expand(&mut subgraph, aggregate);
        assert!(result.is_ok(), "Failed to expand the aggregate: {}", result.unwrap_err());
        let mut restored = result.unwrap();
        restored.sort();
        assert_eq!(restored, vec![keys[1], keys[2]], "Wrong restored nodes");
        assert_eq!(snapshot(&subgraph), before, "Expansion did not restore the subgraph");
        assert_eq!(subgraph.segment(2), Some(keys[1]), "Restored segment cannot be found by identifier");
        assert!(subgraph.source_adjacent().contains(&keys[0]) && subgraph.source_adjacent().len() == 1, "Wrong source-adjacent nodes");
        assert_eq!(subgraph.node(keys[2]).unwrap().genomes(), Some(internal::genomes(&["B"])), "Metadata was lost");
    }

    #[test]
    fn expand_rejects_segments() {
        let (mut subgraph, keys) = bubble();
        let result = BubbleAggregator::expand(&mut subgraph, keys[0]);
        assert!(matches!(result, Err(SubgraphError::Unsupported { .. })), "Expanded a segment node");
        assert_eq!(subgraph.node_count(), 4, "Failed expansion modified the subgraph");
    }
}

//-----------------------------------------------------------------------------
