use std::collections::{BTreeSet, HashMap};

use eframe::egui::{Pos2, Vec2};

use crate::knowledge::{Graph, GraphLink, GraphNode, LabelContext, NodeId};

use super::super::render::{NodeFlags, NodePaint};

/// User marks that change how nodes are drawn this frame.
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Marks<'a> {
    pub(in crate::app) focused: Option<&'a str>,
    pub(in crate::app) selected: &'a BTreeSet<NodeId>,
    pub(in crate::app) highlighted_tag: Option<&'a str>,
}

impl Marks<'_> {
    pub(in crate::app) fn flags(&self, node: &GraphNode) -> NodeFlags {
        NodeFlags {
            selected: self.focused == Some(node.id.as_str()) || self.selected.contains(&node.id),
            tag_highlighted: self.highlighted_tag.is_some_and(|tag| node.has_tag(tag)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct SceneNode<'a> {
    pub(in crate::app) node: &'a GraphNode,
    pub(in crate::app) world: Vec2,
    pub(in crate::app) flags: NodeFlags,
    pub(in crate::app) label_opacity: f32,
}

impl<'a> SceneNode<'a> {
    /// Paint settings at `center`. Hovering never changes label opacity; the
    /// hover tooltip carries the name instead.
    pub(in crate::app) fn paint(&self, center: Pos2) -> NodePaint<'a> {
        NodePaint {
            node: self.node,
            center,
            flags: self.flags,
            label_opacity: self.label_opacity,
        }
    }
}

/// Link between two entries of [`Scene::nodes`].
#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct SceneLink<'a> {
    pub(in crate::app) link: &'a GraphLink,
    pub(in crate::app) from: usize,
    pub(in crate::app) to: usize,
}

#[derive(Debug, Default)]
pub(in crate::app) struct Scene<'a> {
    /// In paint order; marked nodes come last so they sit on top.
    pub(in crate::app) nodes: Vec<SceneNode<'a>>,
    pub(in crate::app) links: Vec<SceneLink<'a>>,
}

/// Everything needed to paint one frame, derived from the graph value, the
/// layout positions and the user's marks. Nodes without a layout position
/// are left out, together with their links.
pub(in crate::app) fn build_scene<'a>(
    graph: &'a Graph,
    position: impl Fn(&str) -> Option<Vec2>,
    marks: &Marks<'_>,
    labels: &LabelContext<'_>,
) -> Scene<'a> {
    let mut nodes = graph
        .nodes()
        .filter_map(|node| {
            let world = position(&node.id)?;
            Some(SceneNode {
                node,
                world,
                flags: marks.flags(node),
                label_opacity: labels.opacity(node),
            })
        })
        .collect::<Vec<_>>();
    nodes.sort_by_key(|entry| (entry.flags.selected, entry.flags.tag_highlighted));

    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.node.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let links = graph
        .links()
        .filter_map(|link| {
            Some(SceneLink {
                link,
                from: *index_by_id.get(link.source.as_str())?,
                to: *index_by_id.get(link.target.as_str())?,
            })
        })
        .collect();

    Scene { nodes, links }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::knowledge::{
        DistanceTable, GraphSnapshot, NodePayload, PinnedPositions, from_snapshot,
    };

    fn graph() -> Graph {
        let node = |id: &str, tags: &[&str]| NodePayload {
            id: id.to_owned(),
            label: id.to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            ..Default::default()
        };
        from_snapshot(
            &GraphSnapshot {
                nodes: vec![
                    node("concept_a", &["rust"]),
                    node("concept_b", &[]),
                    node("concept_c", &[]),
                    node("topic_1", &[]),
                ],
                links: vec![
                    GraphLink::new("topic_1", "concept_a", "contains"),
                    GraphLink::new("concept_a", "concept_b", "related_to"),
                    GraphLink::new("concept_b", "concept_c", "related_to"),
                ],
            },
            &PinnedPositions::new(),
        )
    }

    fn position(id: &str) -> Option<Vec2> {
        (id != "concept_c").then(|| vec2(id.len() as f32, 0.0))
    }

    #[test]
    fn marked_nodes_are_painted_last() {
        let graph = graph();
        let selected = BTreeSet::new();
        let marks = Marks {
            focused: Some("concept_b"),
            selected: &selected,
            highlighted_tag: Some("rust"),
        };
        let table = DistanceTable::from_source(&graph, "concept_b");
        let labels = LabelContext {
            focused: Some("concept_b"),
            distances: &table,
        };

        let scene = build_scene(&graph, position, &marks, &labels);
        let order = scene.nodes.iter().map(|entry| entry.node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(order, ["topic_1", "concept_a", "concept_b"]);
        assert!(scene.nodes[1].flags.tag_highlighted);
        assert!(scene.nodes[2].flags.selected);
        assert_eq!(scene.nodes[2].label_opacity, 1.0);
    }

    #[test]
    fn far_nodes_paint_without_label() {
        let graph = graph();
        let selected = BTreeSet::new();
        let marks = Marks {
            focused: Some("topic_1"),
            selected: &selected,
            highlighted_tag: None,
        };
        let table = DistanceTable::from_source(&graph, "topic_1");
        let labels = LabelContext {
            focused: Some("topic_1"),
            distances: &table,
        };
        let placed = |id: &str| Some(vec2(id.len() as f32, 0.0));

        let scene = build_scene(&graph, placed, &marks, &labels);
        let paint_of = |id: &str| {
            scene
                .nodes
                .iter()
                .find(|entry| entry.node.id == id)
                .map(|entry| entry.paint(Pos2::ZERO).label_opacity)
        };
        assert_eq!(paint_of("topic_1"), Some(1.0));
        assert_eq!(paint_of("concept_a"), Some(0.8));
        assert_eq!(paint_of("concept_c"), Some(0.4));

        let unfocused = LabelContext {
            focused: None,
            distances: &table,
        };
        let marks = Marks { focused: None, ..marks };
        let scene = build_scene(&graph, placed, &marks, &unfocused);
        let mut hidden = scene
            .nodes
            .iter()
            .filter(|entry| !entry.node.is_central())
            .map(|entry| entry.paint(Pos2::ZERO).label_opacity);
        assert!(hidden.all(|opacity| opacity == 0.0));
    }

    #[test]
    fn links_follow_paint_order_and_skip_unplaced_nodes() {
        let graph = graph();
        let selected = BTreeSet::from(["topic_1".to_owned()]);
        let marks = Marks {
            focused: None,
            selected: &selected,
            highlighted_tag: None,
        };
        let table = DistanceTable::default();
        let labels = LabelContext {
            focused: None,
            distances: &table,
        };

        let scene = build_scene(&graph, position, &marks, &labels);
        assert_eq!(scene.links.len(), 2);
        for entry in &scene.links {
            assert_eq!(scene.nodes[entry.from].node.id, entry.link.source);
            assert_eq!(scene.nodes[entry.to].node.id, entry.link.target);
        }
        assert_eq!(scene.nodes.last().map(|entry| entry.node.id.as_str()), Some("topic_1"));
    }
}
