use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Semantic node category. Resolved once when a payload enters the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Topic,
    Note,
    Concept,
    Related,
    Wiki,
    Other,
}

impl NodeKind {
    const PREFIXES: [(&'static str, Self); 5] = [
        ("topic_", Self::Topic),
        ("note_", Self::Note),
        ("concept_", Self::Concept),
        ("related_", Self::Related),
        ("wiki_", Self::Wiki),
    ];

    pub fn from_id(id: &str) -> Self {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| id.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Other)
    }

    /// Prefers an explicit kind from the analysis metadata, falling back to
    /// the id prefix convention.
    pub fn resolve(explicit: Option<&str>, id: &str) -> Self {
        explicit
            .and_then(Self::parse)
            .unwrap_or_else(|| Self::from_id(id))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "topic" => Some(Self::Topic),
            "note" => Some(Self::Note),
            "concept" => Some(Self::Concept),
            "related" => Some(Self::Related),
            "wiki" | "wikipedia" => Some(Self::Wiki),
            "other" | "node" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Topic => "Main topic",
            Self::Note => "Note",
            Self::Concept => "Concept",
            Self::Related => "Related concept",
            Self::Wiki => "Wikipedia article",
            Self::Other => "Node",
        }
    }
}

/// User-pinned coordinate in layout space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub x: f32,
    pub y: f32,
}

impl Pin {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Node as exchanged with the analysis service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub has_gap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_gaps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub relation: String,
}

impl GraphLink {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    /// Structural relations are drawn heavier.
    pub fn is_structural(&self) -> bool {
        matches!(self.relation.as_str(), "contains" | "part_of")
    }
}

/// Nodes and links as delivered by the backend, before merging.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodePayload>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Response of the note analysis endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub graph: GraphSnapshot,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub main_topic: Option<String>,
    #[serde(default)]
    pub main_concepts: Vec<String>,
    #[serde(default)]
    pub knowledge_gaps: Vec<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub has_gap: bool,
    pub level: Option<i32>,
    pub knowledge_gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub kind: NodeKind,
    pub pin: Option<Pin>,
}

impl GraphNode {
    pub fn from_payload(payload: &NodePayload) -> Self {
        Self {
            id: payload.id.clone(),
            label: payload.label.clone(),
            summary: payload.summary.clone(),
            tags: payload.tags.clone(),
            has_gap: payload.has_gap,
            level: payload.level,
            knowledge_gaps: payload.knowledge_gaps.clone().unwrap_or_default(),
            recommendations: payload.recommendations.clone().unwrap_or_default(),
            kind: NodeKind::resolve(payload.kind.as_deref(), &payload.id),
            pin: None,
        }
    }

    /// Returns a copy with the payload's semantic fields laid over this
    /// record. Optional payload fields only overwrite when present; the pin
    /// is carried over untouched.
    pub fn overlay(&self, payload: &NodePayload) -> Self {
        Self {
            id: self.id.clone(),
            label: payload.label.clone(),
            summary: payload.summary.clone().or_else(|| self.summary.clone()),
            tags: payload.tags.clone(),
            has_gap: payload.has_gap,
            level: payload.level.or(self.level),
            knowledge_gaps: payload
                .knowledge_gaps
                .clone()
                .unwrap_or_else(|| self.knowledge_gaps.clone()),
            recommendations: payload
                .recommendations
                .clone()
                .unwrap_or_else(|| self.recommendations.clone()),
            kind: NodeKind::resolve(payload.kind.as_deref(), &self.id),
            pin: self.pin,
        }
    }

    pub fn to_payload(&self) -> NodePayload {
        NodePayload {
            id: self.id.clone(),
            label: self.label.clone(),
            summary: self.summary.clone(),
            tags: self.tags.clone(),
            has_gap: self.has_gap,
            level: self.level,
            knowledge_gaps: (!self.knowledge_gaps.is_empty()).then(|| self.knowledge_gaps.clone()),
            recommendations: (!self.recommendations.is_empty())
                .then(|| self.recommendations.clone()),
            kind: None,
        }
    }

    /// Level-0 nodes and topics anchor the graph.
    pub fn is_central(&self) -> bool {
        self.level == Some(0) || self.kind == NodeKind::Topic
    }

    pub fn has_knowledge_gap(&self) -> bool {
        self.has_gap || !self.knowledge_gaps.is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn level_label(&self) -> Option<&'static str> {
        match self.level {
            Some(0) => Some("Central node"),
            Some(1) => Some("First level"),
            Some(2) => Some("Second level"),
            _ => None,
        }
    }
}

/// Immutable graph value. New values are produced by merging; links never
/// reference a missing node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub(super) nodes: BTreeMap<NodeId, GraphNode>,
    pub(super) links: BTreeSet<GraphLink>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &GraphLink> {
        self.links.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links leaving or entering `id`.
    pub fn links_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphLink> + 'a {
        self.links.iter().filter(move |link| link.touches(id))
    }

    /// Every distinct tag, sorted.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.nodes
            .values()
            .flat_map(|node| node.tags.iter().map(String::as_str))
            .collect()
    }

    /// Copy of this graph with `id` pinned at `pin`, or `None` when the node
    /// is unknown.
    pub fn with_pin(&self, id: &str, pin: Pin) -> Option<Self> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        let mut next = self.clone();
        if let Some(node) = next.nodes.get_mut(id) {
            node.pin = Some(pin);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: &str) -> NodePayload {
        NodePayload {
            id: id.to_owned(),
            label: id.to_uppercase(),
            ..Default::default()
        }
    }

    #[test]
    fn kind_comes_from_prefix_unless_explicit() {
        assert_eq!(NodeKind::from_id("topic_1"), NodeKind::Topic);
        assert_eq!(NodeKind::from_id("wiki_rust"), NodeKind::Wiki);
        assert_eq!(NodeKind::from_id("misc"), NodeKind::Other);
        assert_eq!(NodeKind::resolve(Some("concept"), "topic_1"), NodeKind::Concept);
        assert_eq!(NodeKind::resolve(Some("bogus"), "note_7"), NodeKind::Note);
    }

    #[test]
    fn overlay_keeps_pin_and_missing_optionals() {
        let mut existing = GraphNode::from_payload(&NodePayload {
            summary: Some("old".into()),
            level: Some(1),
            ..payload("concept_1")
        });
        existing.pin = Some(Pin::new(4.0, 5.0));

        let updated = existing.overlay(&NodePayload {
            tags: vec!["rust".into()],
            ..payload("concept_1")
        });

        assert_eq!(updated.pin, Some(Pin::new(4.0, 5.0)));
        assert_eq!(updated.summary.as_deref(), Some("old"));
        assert_eq!(updated.level, Some(1));
        assert_eq!(updated.tags, vec!["rust".to_owned()]);
    }

    #[test]
    fn central_nodes_are_level_zero_or_topics() {
        let topic = GraphNode::from_payload(&payload("topic_a"));
        let level_zero = GraphNode::from_payload(&NodePayload {
            level: Some(0),
            ..payload("concept_a")
        });
        let concept = GraphNode::from_payload(&payload("concept_b"));

        assert!(topic.is_central());
        assert!(level_zero.is_central());
        assert!(!concept.is_central());
    }

    #[test]
    fn analysis_result_reads_flattened_graph() {
        let raw = r#"{
            "nodes": [{"id": "topic_1", "label": "Rust", "level": 0, "has_gap": true}],
            "links": [],
            "tags": ["lang"],
            "summary": "About Rust",
            "model_used": "local"
        }"#;

        let result: AnalysisResult = serde_json::from_str(raw).expect("valid analysis json");
        assert_eq!(result.graph.nodes.len(), 1);
        assert!(result.graph.nodes[0].has_gap);
        assert_eq!(result.tags, vec!["lang".to_owned()]);
        assert_eq!(result.model_used.as_deref(), Some("local"));
    }
}
