use eframe::egui::{self, Modifiers, Pos2, Ui};

use super::super::render::{Viewport, node_radius};
use super::super::{Intent, ViewModel};
use super::build::Scene;

/// Screen radius below which nodes are still easy to hit.
const MIN_HIT_RADIUS: f32 = 4.0;

/// Index into `scene.nodes` of the node under `pointer`. The closest center
/// wins when hit circles overlap.
pub(in crate::app) fn node_at(scene: &Scene<'_>, viewport: &Viewport, pointer: Pos2) -> Option<usize> {
    scene
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let center = viewport.to_screen(entry.world);
            let radius = (node_radius(entry.node, entry.flags) * viewport.zoom).max(MIN_HIT_RADIUS);
            let distance = center.distance(pointer);
            (distance <= radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// What a primary click means given the modifiers held and whether
/// multi-select is on.
pub(in crate::app) fn click_intent(
    hovered: Option<&str>,
    modifiers: Modifiers,
    multi_select: bool,
) -> Option<Intent> {
    let extend = modifiers.shift || modifiers.command;
    match hovered {
        Some(id) if multi_select => Some(Intent::ToggleSelected(id.to_owned())),
        Some(id) if extend => Some(Intent::EnterMultiSelect(id.to_owned())),
        Some(id) => Some(Intent::FocusNode(id.to_owned())),
        None if multi_select => None,
        None => Some(Intent::ClearFocus),
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &self,
        ui: &Ui,
        viewport: &mut Viewport,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| viewport.rect.center());
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        viewport.zoom_around(pointer, factor);
    }

    /// Secondary or middle drag pans; so does a primary drag that did not
    /// start on a node.
    pub(in crate::app) fn handle_graph_pan(&self, viewport: &mut Viewport, response: &egui::Response) {
        let node_drag = self.layout.dragging().is_some();
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && !node_drag)
        {
            viewport.pan += response.drag_delta();
        }
    }

    /// Drives the layout drag from pointer input. A finished drag pins the
    /// node where it was dropped.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        viewport: &Viewport,
        response: &egui::Response,
        hovered: Option<&str>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(id) = hovered
        {
            self.layout.drag_start(id);
        }

        if self.layout.dragging().is_some()
            && response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.layout.drag_to(viewport.to_world(pointer));
        }

        if response.drag_stopped()
            && let Some((id, pin)) = self.layout.drag_end()
        {
            self.emit(Intent::PinNode { id, pin });
        }
    }

    pub(in crate::app) fn handle_graph_click(&self, ui: &Ui, response: &egui::Response, hovered: Option<&str>) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }
        let modifiers = ui.input(|input| input.modifiers);
        if let Some(intent) = click_intent(hovered, modifiers, self.session.selection().is_active()) {
            self.emit(intent);
        }
    }
}
