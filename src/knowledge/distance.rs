use std::collections::{HashMap, VecDeque};

use log::trace;

use super::model::{Graph, NodeId};

/// Hop counts from one source node. Nodes missing from the table are
/// unreachable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceTable {
    hops: HashMap<NodeId, u32>,
}

impl DistanceTable {
    /// Breadth-first search from `source`, following links in both
    /// directions.
    pub fn from_source(graph: &Graph, source: &str) -> Self {
        let mut hops = HashMap::new();
        if !graph.contains(source) {
            return Self { hops };
        }

        let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::with_capacity(graph.node_count());
        for link in graph.links() {
            neighbors
                .entry(link.source.as_str())
                .or_default()
                .push(link.target.as_str());
            neighbors
                .entry(link.target.as_str())
                .or_default()
                .push(link.source.as_str());
        }

        let mut queue = VecDeque::from([(source, 0u32)]);
        hops.insert(source.to_owned(), 0);

        while let Some((current, depth)) = queue.pop_front() {
            let Some(next_ids) = neighbors.get(current) else {
                continue;
            };

            for &next in next_ids {
                if hops.contains_key(next) {
                    continue;
                }
                hops.insert(next.to_owned(), depth + 1);
                queue.push_back((next, depth + 1));
            }
        }

        Self { hops }
    }

    /// `None` when `id` cannot be reached from the source.
    pub fn get(&self, id: &str) -> Option<u32> {
        self.hops.get(id).copied()
    }

    pub fn reachable_count(&self) -> usize {
        self.hops.len()
    }
}

/// Shortest undirected hop count between two nodes; `None` is unreachable.
pub fn distance(graph: &Graph, from: &str, to: &str) -> Option<u32> {
    DistanceTable::from_source(graph, from).get(to)
}

/// Single-source table for the focused node, rebuilt only when the focus or
/// the graph revision changes.
#[derive(Debug, Default)]
pub struct FocusDistanceCache {
    key: Option<(NodeId, u64)>,
    table: DistanceTable,
    rebuilds: usize,
}

impl FocusDistanceCache {
    pub fn table_for(&mut self, graph: &Graph, revision: u64, focus: Option<&str>) -> &DistanceTable {
        let Some(focus) = focus else {
            if self.key.take().is_some() {
                self.table = DistanceTable::default();
            }
            return &self.table;
        };

        let fresh = self
            .key
            .as_ref()
            .is_some_and(|(id, cached_revision)| id == focus && *cached_revision == revision);
        if !fresh {
            self.table = DistanceTable::from_source(graph, focus);
            self.key = Some((focus.to_owned(), revision));
            self.rebuilds += 1;
            trace!(
                "rebuilt focus distances from {focus} at revision {revision}: {} reachable",
                self.table.reachable_count()
            );
        }
        &self.table
    }

    /// Number of BFS runs so far.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::merge::{PinnedPositions, from_snapshot};
    use crate::knowledge::model::{GraphLink, GraphSnapshot, NodePayload};

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> Graph {
        let snapshot = GraphSnapshot {
            nodes: ids
                .iter()
                .map(|id| NodePayload {
                    id: (*id).to_owned(),
                    ..Default::default()
                })
                .collect(),
            links: links
                .iter()
                .map(|(source, target)| GraphLink::new(*source, *target, "rel"))
                .collect(),
        };
        from_snapshot(&snapshot, &PinnedPositions::new())
    }

    #[test]
    fn chain_distance_ignores_direction() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("c", "b")]);
        assert_eq!(distance(&g, "a", "c"), Some(2));
        assert_eq!(distance(&g, "c", "a"), Some(2));
        assert_eq!(distance(&g, "b", "b"), Some(0));
    }

    #[test]
    fn disconnected_nodes_are_unreachable() {
        let g = graph(&["a", "b", "z"], &[("a", "b")]);
        assert_eq!(distance(&g, "a", "z"), None);
        assert_eq!(distance(&g, "missing", "a"), None);
    }

    #[test]
    fn bfs_picks_shortest_route() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        assert_eq!(distance(&g, "a", "c"), Some(2));
        assert_eq!(distance(&g, "a", "d"), Some(1));
    }

    #[test]
    fn cache_rebuilds_only_on_focus_or_revision_change() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        let mut cache = FocusDistanceCache::default();

        for _ in 0..5 {
            assert_eq!(cache.table_for(&g, 1, Some("a")).get("b"), Some(1));
        }
        assert_eq!(cache.rebuilds(), 1);

        cache.table_for(&g, 1, Some("b"));
        assert_eq!(cache.rebuilds(), 2);

        cache.table_for(&g, 2, Some("b"));
        assert_eq!(cache.rebuilds(), 3);

        assert_eq!(cache.table_for(&g, 2, None).reachable_count(), 0);
        cache.table_for(&g, 2, Some("b"));
        assert_eq!(cache.rebuilds(), 4);
    }
}
