//! Attributing the edges of a [`Subgraph`] with the genomes that traverse them.

use crate::error::SubgraphError;
use crate::subgraph::{NodeKey, NodeKind, Subgraph};

use rustc_hash::FxHashMap;

use std::collections::{BTreeSet, VecDeque};

use log::debug;

//-----------------------------------------------------------------------------

/// Computes edge genome sets in topological order.
///
/// Every segment node must carry metadata before the computation.
/// Aggregate nodes use the union of their members, and diversion nodes borrow the smaller genome set of the two nodes they divert between.
/// Filler nodes are ignored.
///
/// For each node in topological order, each incoming edge `u -> v` is attributed with the genomes still remaining at `u` that also visit `v`.
/// Those genomes are then consumed from `u`, so a genome leaves a node through at most one edge.
/// The nodes without predecessors are attached to a virtual origin, which starts with the union of their genome sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathAttributor;

impl PathAttributor {
    /// Attributes every edge reachable from the source-adjacent nodes and returns the genome set of the virtual origin.
    ///
    /// # Errors
    ///
    /// Returns [`SubgraphError::MissingGenomes`] if a node has no genome set.
    /// The subgraph is not modified in that case.
    pub fn compute_paths(subgraph: &mut Subgraph) -> Result<BTreeSet<String>, SubgraphError> {
        let genomes = Self::node_genomes(subgraph)?;

        let seeds: Vec<NodeKey> = subgraph.source_adjacent().iter().copied().collect();
        let mut origin: BTreeSet<String> = BTreeSet::new();
        for seed in seeds.iter() {
            if let Some(set) = genomes.get(seed) {
                origin.extend(set.iter().cloned());
            }
        }

        // Kahn's algorithm over the edges inside the subgraph.
        let mut pending: FxHashMap<NodeKey, usize> = FxHashMap::default();
        for key in genomes.keys() {
            if let Some(node) = subgraph.node(*key) {
                pending.insert(*key, node.incoming().len());
            }
        }
        let mut remaining: FxHashMap<NodeKey, BTreeSet<String>> = FxHashMap::default();
        let mut queue: VecDeque<NodeKey> = seeds.into_iter().collect();
        let mut attributed = 0;
        let mut visited = 0;
        while let Some(node) = queue.pop_front() {
            visited += 1;
            let own = match genomes.get(&node) {
                Some(set) => set,
                None => continue,
            };
            let (incoming, outgoing) = match subgraph.node(node) {
                Some(node) => (node.incoming().to_vec(), node.outgoing().to_vec()),
                None => continue,
            };
            for key in incoming {
                let from = match subgraph.edge(key) {
                    Some(edge) => edge.from(),
                    None => continue,
                };
                let available = remaining.entry(from).or_default();
                let attribution: BTreeSet<String> = available.intersection(own).cloned().collect();
                available.retain(|genome| !attribution.contains(genome));
                if let Some(edge) = subgraph.edge_mut(key) {
                    edge.set_genomes(attribution);
                    attributed += 1;
                }
            }
            remaining.insert(node, own.clone());
            for key in outgoing {
                let to = match subgraph.edge(key) {
                    Some(edge) => edge.to(),
                    None => continue,
                };
                if let Some(count) = pending.get_mut(&to) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(to);
                    }
                }
            }
        }

        debug!(
            "Attributed {} edges with {} genomes; {} of {} nodes in topological order",
            attributed, origin.len(), visited, genomes.len()
        );
        Ok(origin)
    }

    // Genome sets for all nodes that take part in the computation.
    fn node_genomes(subgraph: &Subgraph) -> Result<FxHashMap<NodeKey, BTreeSet<String>>, SubgraphError> {
        let mut result: FxHashMap<NodeKey, BTreeSet<String>> = FxHashMap::default();
        for node in subgraph.nodes() {
            let genomes = match node.kind() {
                NodeKind::Filler => continue,
                NodeKind::Diversion { from, to } => {
                    let from = Self::endpoint_genomes(subgraph, *from)?;
                    let to = Self::endpoint_genomes(subgraph, *to)?;
                    if to.len() < from.len() { to } else { from }
                },
                _ => node.genomes().ok_or(SubgraphError::MissingGenomes(node.key().index()))?,
            };
            result.insert(node.key(), genomes);
        }
        Ok(result)
    }

    fn endpoint_genomes(subgraph: &Subgraph, key: NodeKey) -> Result<BTreeSet<String>, SubgraphError> {
        subgraph.node(key).and_then(|node| node.genomes()).ok_or(SubgraphError::MissingGenomes(key.index()))
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::internal;
    use crate::subgraph::EdgeKind;

    fn annotate(subgraph: &mut Subgraph, keys: &[NodeKey], genomes: &[&[&str]]) {
        for (key, names) in keys.iter().zip(genomes.iter()) {
            let result = subgraph.set_metadata(*key, internal::metadata(names));
            assert!(result.is_ok(), "Failed to set metadata for {}: {}", key, result.unwrap_err());
        }
    }

    fn edge_genomes(subgraph: &Subgraph, from: NodeKey, to: NodeKey) -> Option<BTreeSet<String>> {
        let key = subgraph.find_edge(from, to)?;
        subgraph.edge(key)?.genomes().cloned()
    }

    fn check_conservation(subgraph: &Subgraph) {
        for node in subgraph.nodes() {
            if node.outgoing().is_empty() || node.segment().is_none() {
                continue;
            }
            let mut union: BTreeSet<String> = BTreeSet::new();
            for key in node.outgoing() {
                let genomes = subgraph.edge(*key).unwrap().genomes();
                assert!(genomes.is_some(), "Edge {} was not attributed", key);
                union.extend(genomes.unwrap().iter().cloned());
            }
            assert_eq!(Some(union), node.genomes(), "Genomes were not conserved at node {}", node.key());
        }
    }

    #[test]
    fn diamond() {
        let (mut subgraph, keys) = internal::build_subgraph(&[3, 1, 1, 3], &[(1, 2), (1, 3), (2, 4), (3, 4)]);
        annotate(&mut subgraph, &keys, &[&["A", "B"], &["A"], &["B"], &["A", "B"]]);
        let result = PathAttributor::compute_paths(&mut subgraph);
        assert!(result.is_ok(), "Failed to compute paths: {}", result.unwrap_err());
        assert_eq!(result.unwrap(), internal::genomes(&["A", "B"]), "Wrong genomes at the origin");

        assert_eq!(edge_genomes(&subgraph, keys[0], keys[1]), Some(internal::genomes(&["A"])), "Wrong genomes for (1, 2)");
        assert_eq!(edge_genomes(&subgraph, keys[0], keys[2]), Some(internal::genomes(&["B"])), "Wrong genomes for (1, 3)");
        assert_eq!(edge_genomes(&subgraph, keys[1], keys[3]), Some(internal::genomes(&["A"])), "Wrong genomes for (2, 4)");
        assert_eq!(edge_genomes(&subgraph, keys[2], keys[3]), Some(internal::genomes(&["B"])), "Wrong genomes for (3, 4)");
        check_conservation(&subgraph);
    }

    #[test]
    fn genome_consumed_once() {
        // Both successors of node 1 contain genome A, but A leaves node 1 only once.
        let (mut subgraph, keys) = internal::build_subgraph(&[1, 1, 1], &[(1, 2), (1, 3)]);
        annotate(&mut subgraph, &keys, &[&["A"], &["A"], &["A"]]);
        PathAttributor::compute_paths(&mut subgraph).unwrap();
        let first = edge_genomes(&subgraph, keys[0], keys[1]).unwrap();
        let second = edge_genomes(&subgraph, keys[0], keys[2]).unwrap();
        assert_eq!(first.len() + second.len(), 1, "Genome A left node 1 more than once");
        check_conservation(&subgraph);
    }

    #[test]
    fn multiple_roots() {
        let (mut subgraph, keys) = internal::build_subgraph(&[1, 1, 1], &[(1, 3), (2, 3)]);
        annotate(&mut subgraph, &keys, &[&["A"], &["B", "C"], &["A", "B"]]);
        let origin = PathAttributor::compute_paths(&mut subgraph).unwrap();
        assert_eq!(origin, internal::genomes(&["A", "B", "C"]), "Wrong genomes at the origin");
        assert_eq!(edge_genomes(&subgraph, keys[1], keys[2]), Some(internal::genomes(&["B"])), "Wrong genomes for (2, 3)");
    }

    #[test]
    fn missing_genomes() {
        let (mut subgraph, keys) = internal::build_subgraph(&[1, 1, 1], &[(1, 2), (2, 3)]);
        annotate(&mut subgraph, &[keys[0], keys[2]], &[&["A"], &["A"]]);
        let result = PathAttributor::compute_paths(&mut subgraph);
        assert_eq!(result, Err(SubgraphError::MissingGenomes(keys[1].index())), "Missing genomes were not reported");
        for edge in subgraph.edges() {
            assert!(edge.genomes().is_none(), "Edge {} was attributed after a failure", edge.key());
        }
    }

    #[test]
    fn diversions_and_fillers() {
        let (mut subgraph, keys) = internal::build_subgraph(&[1, 1], &[]);
        annotate(&mut subgraph, &keys, &[&["A", "B"], &["A"]]);
        let (from, to) = (keys[0], keys[1]);
        let original = subgraph.add_edge(from, to, EdgeKind::link(None)).unwrap();
        subgraph.detach_edge(original).unwrap();
        let diversion = subgraph.add_node(NodeKind::Diversion { from, to });
        subgraph.add_edge(from, diversion, EdgeKind::Diversion { original }).unwrap();
        subgraph.add_edge(diversion, to, EdgeKind::Diversion { original }).unwrap();
        subgraph.add_node(NodeKind::Filler);

        let result = PathAttributor::compute_paths(&mut subgraph);
        assert!(result.is_ok(), "Failed to compute paths: {}", result.unwrap_err());
        assert_eq!(edge_genomes(&subgraph, from, diversion), Some(internal::genomes(&["A"])), "Wrong genomes into the diversion");
        assert_eq!(edge_genomes(&subgraph, diversion, to), Some(internal::genomes(&["A"])), "Wrong genomes out of the diversion");
    }
}

//-----------------------------------------------------------------------------
