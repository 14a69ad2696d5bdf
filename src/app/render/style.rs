use eframe::egui::{Color32, Stroke};

use crate::knowledge::{GraphLink, GraphNode, NodeKind};

use super::theme::Palette;

pub const SELECTED_SCALE: f32 = 1.5;
pub const TAG_HIGHLIGHT_SCALE: f32 = 1.3;
pub const ARROW_LENGTH: f32 = 6.0;

/// Per-frame state that changes how a node is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Focused, or part of the multi-selection.
    pub selected: bool,
    pub tag_highlighted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRole {
    Selected,
    TagHighlight,
    Gap,
    Central,
    Wiki,
    FirstLevel,
    SecondLevel,
    Other,
}

impl ColorRole {
    /// First matching rule wins: selection, tag highlight, knowledge gap,
    /// then kind and level.
    pub fn for_node(node: &GraphNode, flags: NodeFlags) -> Self {
        if flags.selected {
            return Self::Selected;
        }
        if flags.tag_highlighted {
            return Self::TagHighlight;
        }
        if node.has_knowledge_gap() {
            return Self::Gap;
        }
        match (node.kind, node.level) {
            (NodeKind::Topic | NodeKind::Note, _) => Self::Central,
            (NodeKind::Wiki, _) => Self::Wiki,
            (_, Some(0)) => Self::Central,
            (_, Some(1)) => Self::FirstLevel,
            (_, Some(2)) => Self::SecondLevel,
            _ => Self::Other,
        }
    }

    pub fn color(self, palette: &Palette) -> Color32 {
        match self {
            Self::Selected => palette.selected,
            Self::TagHighlight => palette.tag_highlight,
            Self::Gap => palette.gap,
            Self::Central => palette.central,
            Self::Wiki => palette.wiki,
            Self::FirstLevel => palette.first_level,
            Self::SecondLevel => palette.second_level,
            Self::Other => palette.other,
        }
    }
}

/// Relative node weight by kind and level.
pub fn base_size(node: &GraphNode) -> f32 {
    if node.kind == NodeKind::Topic || node.level == Some(0) {
        return 12.0;
    }
    match (node.kind, node.level) {
        (NodeKind::Note, _) => 10.0,
        (NodeKind::Wiki, _) | (_, Some(1)) => 7.0,
        _ => 5.0,
    }
}

/// Unscaled radius in world units.
pub fn base_radius(node: &GraphNode) -> f32 {
    base_size(node).sqrt() * 4.0
}

pub fn node_radius(node: &GraphNode, flags: NodeFlags) -> f32 {
    let scale = if flags.selected {
        SELECTED_SCALE
    } else if flags.tag_highlighted {
        TAG_HIGHLIGHT_SCALE
    } else {
        1.0
    };
    base_radius(node) * scale
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub role: ColorRole,
    pub radius: f32,
    pub fill: Color32,
    pub outline: Stroke,
}

pub fn resolve_node_style(node: &GraphNode, flags: NodeFlags, palette: &Palette) -> NodeStyle {
    let role = ColorRole::for_node(node, flags);
    NodeStyle {
        role,
        radius: node_radius(node, flags),
        fill: role.color(palette),
        outline: Stroke::new(if flags.selected { 2.0 } else { 1.0 }, palette.outline),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
    pub width: f32,
    pub color: Color32,
}

pub fn link_style(link: &GraphLink, palette: &Palette) -> LinkStyle {
    if link.is_structural() {
        LinkStyle {
            width: 3.0,
            color: palette.structural_link,
        }
    } else {
        LinkStyle {
            width: 2.0,
            color: palette.link,
        }
    }
}

/// `color` with its alpha scaled by `opacity`.
pub fn fade(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let alpha = (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render::Theme;
    use crate::knowledge::NodePayload;

    fn node(id: &str, level: Option<i32>, has_gap: bool) -> GraphNode {
        GraphNode::from_payload(&NodePayload {
            id: id.to_owned(),
            label: id.to_owned(),
            level,
            has_gap,
            ..Default::default()
        })
    }

    #[test]
    fn sizes_follow_kind_then_level() {
        assert_eq!(base_size(&node("topic_1", None, false)), 12.0);
        assert_eq!(base_size(&node("concept_1", Some(0), false)), 12.0);
        assert_eq!(base_size(&node("note_1", Some(2), false)), 10.0);
        assert_eq!(base_size(&node("wiki_rust", None, false)), 7.0);
        assert_eq!(base_size(&node("concept_2", Some(1), false)), 7.0);
        assert_eq!(base_size(&node("concept_3", Some(2), false)), 5.0);
        assert_eq!(base_size(&node("misc", None, false)), 5.0);
        assert_eq!(base_radius(&node("concept_4", Some(1), false)), 7.0_f32.sqrt() * 4.0);
    }

    #[test]
    fn selection_scale_wins_over_tag_scale() {
        let n = node("concept_1", Some(1), false);
        let base = base_radius(&n);
        let both = NodeFlags {
            selected: true,
            tag_highlighted: true,
        };
        let tagged = NodeFlags {
            selected: false,
            tag_highlighted: true,
        };
        assert_eq!(node_radius(&n, both), base * SELECTED_SCALE);
        assert_eq!(node_radius(&n, tagged), base * TAG_HIGHLIGHT_SCALE);
    }

    #[test]
    fn color_rules_apply_in_priority_order() {
        let gap = node("topic_1", Some(0), true);
        assert_eq!(ColorRole::for_node(&gap, NodeFlags::default()), ColorRole::Gap);
        assert_eq!(
            ColorRole::for_node(
                &gap,
                NodeFlags {
                    selected: false,
                    tag_highlighted: true
                }
            ),
            ColorRole::TagHighlight
        );
        assert_eq!(
            ColorRole::for_node(
                &gap,
                NodeFlags {
                    selected: true,
                    tag_highlighted: true
                }
            ),
            ColorRole::Selected
        );
        assert_eq!(
            ColorRole::for_node(&node("wiki_x", Some(1), false), NodeFlags::default()),
            ColorRole::Wiki
        );
        assert_eq!(
            ColorRole::for_node(&node("concept_x", Some(2), false), NodeFlags::default()),
            ColorRole::SecondLevel
        );
    }

    #[test]
    fn theme_swaps_hue_but_not_rule() {
        let n = node("concept_1", Some(1), false);
        let light = resolve_node_style(&n, NodeFlags::default(), &Theme::Light.palette());
        let dark = resolve_node_style(&n, NodeFlags::default(), &Theme::Dark.palette());
        assert_eq!(light.role, dark.role);
        assert_ne!(light.fill, dark.fill);
        assert_eq!(light.radius, dark.radius);
    }

    #[test]
    fn structural_links_are_heavier() {
        let palette = Theme::Light.palette();
        assert_eq!(link_style(&GraphLink::new("a", "b", "contains"), &palette).width, 3.0);
        assert_eq!(link_style(&GraphLink::new("a", "b", "part_of"), &palette).width, 3.0);
        assert_eq!(link_style(&GraphLink::new("a", "b", "mentions"), &palette).width, 2.0);
    }

    #[test]
    fn fade_scales_alpha_only() {
        let faded = fade(Color32::from_rgb(10, 20, 30), 0.4);
        assert_eq!(faded.a(), 102);
        assert_eq!(fade(Color32::WHITE, 0.0).a(), 0);
    }
}
