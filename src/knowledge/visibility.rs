use super::distance::DistanceTable;
use super::model::GraphNode;

/// Labels farther than this many hops from the focus are hidden.
pub const LABEL_HOP_LIMIT: u32 = 3;

const FOCUSED_OPACITY: f32 = 1.0;
const CENTRAL_OPACITY: f32 = 0.9;

/// Label opacity in `[0, 1]` for `node`, given the focused node and the
/// distance table computed from it.
pub fn label_opacity(node: &GraphNode, focused: Option<&str>, distances: &DistanceTable) -> f32 {
    let Some(focused) = focused else {
        return if node.is_central() { 1.0 } else { 0.0 };
    };

    if node.id == focused {
        return FOCUSED_OPACITY;
    }
    if node.is_central() {
        return CENTRAL_OPACITY;
    }

    match distances.get(&node.id) {
        Some(1) => 0.8,
        Some(2) => 0.6,
        Some(LABEL_HOP_LIMIT) => 0.4,
        _ => 0.0,
    }
}

pub fn should_show_label(node: &GraphNode, focused: Option<&str>, distances: &DistanceTable) -> bool {
    label_opacity(node, focused, distances) > 0.0
}
