use std::collections::HashMap;

use log::{debug, warn};

use super::model::{Graph, GraphNode, GraphSnapshot, NodeId, Pin};

/// Pinned coordinates as loaded from the position store.
pub type PinnedPositions = HashMap<NodeId, Pin>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub nodes_added: usize,
    pub nodes_updated: usize,
    pub links_added: usize,
    pub links_duplicate: usize,
    pub links_dangling: usize,
}

/// Combines `incoming` with `current` into a new graph value.
///
/// Existing nodes take the incoming semantic fields but keep their pin; new
/// nodes pick up any pin recorded in `positions`. Links are keyed by
/// `(source, target, relation)`, and links naming an unknown node are dropped.
/// `current` is never touched, and merging the same input twice is a no-op
/// the second time.
pub fn merge(current: &Graph, incoming: &GraphSnapshot, positions: &PinnedPositions) -> Graph {
    merge_with_stats(current, incoming, positions).0
}

pub fn merge_with_stats(
    current: &Graph,
    incoming: &GraphSnapshot,
    positions: &PinnedPositions,
) -> (Graph, MergeStats) {
    let mut next = current.clone();
    let mut stats = MergeStats::default();

    for payload in &incoming.nodes {
        if payload.id.trim().is_empty() {
            warn!("dropping incoming node without an id (label {:?})", payload.label);
            continue;
        }

        let stored_pin = positions.get(&payload.id).copied();
        let node = match next.nodes.get(&payload.id) {
            Some(existing) => {
                let mut node = existing.overlay(payload);
                node.pin = existing.pin.or(stored_pin);
                stats.nodes_updated += 1;
                node
            }
            None => {
                let mut node = GraphNode::from_payload(payload);
                node.pin = stored_pin;
                stats.nodes_added += 1;
                node
            }
        };
        next.nodes.insert(node.id.clone(), node);
    }

    for link in &incoming.links {
        let source_known = next.nodes.contains_key(&link.source);
        let target_known = next.nodes.contains_key(&link.target);
        if !source_known || !target_known {
            warn!(
                "dropping link {} -[{}]-> {}: endpoint not in graph",
                link.source, link.relation, link.target
            );
            stats.links_dangling += 1;
            continue;
        }

        if next.links.insert(link.clone()) {
            stats.links_added += 1;
        } else {
            stats.links_duplicate += 1;
        }
    }

    debug!(
        "merged {} nodes ({} new) and {} links ({} new, {} duplicate, {} dangling)",
        incoming.nodes.len(),
        stats.nodes_added,
        incoming.links.len(),
        stats.links_added,
        stats.links_duplicate,
        stats.links_dangling
    );

    (next, stats)
}

/// Builds a graph from a full backend snapshot.
pub fn from_snapshot(snapshot: &GraphSnapshot, positions: &PinnedPositions) -> Graph {
    merge(&Graph::new(), snapshot, positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::model::{GraphLink, NodePayload};

    fn node(id: &str, level: Option<i32>) -> NodePayload {
        NodePayload {
            id: id.to_owned(),
            label: id.to_owned(),
            level,
            ..Default::default()
        }
    }

    fn snapshot(nodes: Vec<NodePayload>, links: Vec<GraphLink>) -> GraphSnapshot {
        GraphSnapshot { nodes, links }
    }

    #[test]
    fn empty_incoming_is_noop() {
        let base = from_snapshot(
            &snapshot(
                vec![node("topic_1", Some(0)), node("concept_1", Some(1))],
                vec![GraphLink::new("topic_1", "concept_1", "contains")],
            ),
            &PinnedPositions::new(),
        );

        let merged = merge(&base, &GraphSnapshot::default(), &PinnedPositions::new());
        assert_eq!(merged, base);
    }

    #[test]
    fn duplicate_links_collapse_by_key() {
        let incoming = snapshot(
            vec![node("a", None), node("b", None)],
            vec![
                GraphLink::new("a", "b", "rel"),
                GraphLink::new("a", "b", "rel"),
                GraphLink::new("b", "a", "rel"),
                GraphLink::new("a", "b", "other"),
            ],
        );

        let (graph, stats) = merge_with_stats(&Graph::new(), &incoming, &PinnedPositions::new());
        assert_eq!(graph.link_count(), 3);
        assert_eq!(stats.links_duplicate, 1);
    }

    #[test]
    fn dangling_links_are_dropped() {
        let incoming = snapshot(
            vec![node("a", None)],
            vec![GraphLink::new("a", "ghost", "rel")],
        );

        let (graph, stats) = merge_with_stats(&Graph::new(), &incoming, &PinnedPositions::new());
        assert_eq!(graph.link_count(), 0);
        assert_eq!(stats.links_dangling, 1);
    }

    #[test]
    fn links_may_reference_nodes_from_the_same_batch_or_the_current_graph() {
        let base = from_snapshot(&snapshot(vec![node("a", None)], vec![]), &PinnedPositions::new());
        let incoming = snapshot(vec![node("b", None)], vec![GraphLink::new("a", "b", "rel")]);

        let merged = merge(&base, &incoming, &PinnedPositions::new());
        assert_eq!(merged.link_count(), 1);
    }

    #[test]
    fn stored_pin_applies_to_new_nodes_only_when_no_pin_exists() {
        let mut positions = PinnedPositions::new();
        positions.insert("a".into(), Pin::new(1.0, 2.0));

        let fresh = from_snapshot(&snapshot(vec![node("a", None)], vec![]), &positions);
        assert_eq!(fresh.node("a").and_then(|n| n.pin), Some(Pin::new(1.0, 2.0)));

        let repinned = fresh.with_pin("a", Pin::new(9.0, 9.0)).expect("node exists");
        let merged = merge(&repinned, &snapshot(vec![node("a", None)], vec![]), &positions);
        assert_eq!(merged.node("a").and_then(|n| n.pin), Some(Pin::new(9.0, 9.0)));
    }

    #[test]
    fn merge_leaves_current_untouched() {
        let base = from_snapshot(&snapshot(vec![node("a", None)], vec![]), &PinnedPositions::new());
        let before = base.clone();
        let _ = merge(
            &base,
            &snapshot(vec![node("b", None)], vec![GraphLink::new("a", "b", "rel")]),
            &PinnedPositions::new(),
        );
        assert_eq!(base, before);
    }

    #[test]
    fn nodes_without_id_are_skipped() {
        let (graph, stats) = merge_with_stats(
            &Graph::new(),
            &snapshot(vec![node("  ", None)], vec![]),
            &PinnedPositions::new(),
        );
        assert!(graph.is_empty());
        assert_eq!(stats.nodes_added, 0);
    }
}
