use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Align2, FontId, Sense, Ui, vec2};

use super::super::render::{
    PainterCanvas, Viewport, circle_visible, draw_background, draw_link, draw_node,
    node_radius, segment_visible,
};
use super::super::ViewModel;
use super::build::{Marks, build_scene};
use super::interaction::node_at;

const EMPTY_GRAPH_TEXT: &str = "Graph is empty. Enter a note and press Analyze";

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let palette = self.theme.palette();

        let now = Instant::now();
        self.layout.notify_resize(rect.size(), now);
        if self.layout.poll_resize(now) {
            ui.ctx().request_repaint();
        }

        let graph = Arc::clone(self.session.graph());
        self.layout.sync(&graph, self.session.revision());

        let mut viewport = Viewport {
            rect,
            pan: self.pan,
            zoom: self.zoom,
        };
        draw_background(&painter, &viewport, &palette);

        if graph.is_empty() {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            self.hovered = None;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                EMPTY_GRAPH_TEXT,
                FontId::proportional(16.0),
                palette.muted_text,
            );
            return;
        }

        self.handle_graph_zoom(ui, &mut viewport, &response);

        if self.live_physics && self.layout.tick() {
            ui.ctx().request_repaint();
        }

        let focused = self.session.focused().map(str::to_owned);
        let selected = self.session.selection().selected().clone();
        let highlighted_tag = self.session.highlighted_tag().map(str::to_owned);
        let marks = Marks {
            focused: focused.as_deref(),
            selected: &selected,
            highlighted_tag: highlighted_tag.as_deref(),
        };
        let scene = {
            let labels = self.session.label_context();
            let layout = &self.layout;
            build_scene(&graph, |id| layout.position(id), &marks, &labels)
        };

        let hovered_index = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| node_at(&scene, &viewport, pointer));
        let hovered_id = hovered_index.map(|index| scene.nodes[index].node.id.clone());
        if hovered_id.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        self.handle_node_drag(&viewport, &response, hovered_id.as_deref());
        self.handle_graph_pan(&mut viewport, &response);
        self.handle_graph_click(ui, &response, hovered_id.as_deref());
        self.pan = viewport.pan;
        self.zoom = viewport.zoom;
        if self.layout.dragging().is_some() {
            ui.ctx().request_repaint();
        }

        let scale = viewport.zoom;
        let mut canvas = PainterCanvas::new(&painter);
        let screen = scene
            .nodes
            .iter()
            .map(|entry| viewport.to_screen(entry.world))
            .collect::<Vec<_>>();

        let mut visible_edge_count = 0usize;
        let mut hovered_link = None;
        let pointer = ui.input(|input| input.pointer.hover_pos());
        for entry in &scene.links {
            let (from, to) = (screen[entry.from], screen[entry.to]);
            if !segment_visible(rect, from, to, 4.0) {
                continue;
            }
            let target = &scene.nodes[entry.to];
            let target_radius = node_radius(target.node, target.flags) * scale;
            draw_link(&mut canvas, entry.link, from, to, target_radius, scale, &palette);
            visible_edge_count += 1;

            if hovered_index.is_none()
                && let Some(pointer) = pointer
                && distance_to_segment(pointer, from, to) <= 4.0
            {
                hovered_link = Some(entry.link);
            }
        }
        self.visible_edge_count = visible_edge_count;

        let mut visible_node_count = 0usize;
        for (entry, &center) in scene.nodes.iter().zip(&screen) {
            let radius = node_radius(entry.node, entry.flags) * scale;
            // Labels hang below the node, so keep some slack when culling.
            if !circle_visible(rect, center, radius + 40.0) {
                continue;
            }
            draw_node(&mut canvas, &entry.paint(center), scale, &palette);
            visible_node_count += 1;
        }
        self.visible_node_count = visible_node_count;

        if let Some(index) = hovered_index {
            let node = scene.nodes[index].node;
            response.clone().on_hover_text_at_pointer(format!("{}: {}", node.kind.label(), node.display_name()));
        } else if let Some(link) = hovered_link {
            response.clone().on_hover_text_at_pointer(link.relation.as_str());
        }

        let hovered_changed = self.hovered != hovered_id;
        self.hovered = hovered_id;
        if hovered_changed {
            ui.ctx().request_repaint();
        }

        painter.text(
            rect.left_bottom() + vec2(10.0, -10.0),
            Align2::LEFT_BOTTOM,
            format!("zoom {:.2}x", self.zoom),
            FontId::proportional(12.0),
            palette.muted_text,
        );
    }
}

fn distance_to_segment(point: egui::Pos2, from: egui::Pos2, to: egui::Pos2) -> f32 {
    let segment = to - from;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(from);
    }
    let t = ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(from + segment * t)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let from = pos2(0.0, 0.0);
        let to = pos2(10.0, 0.0);
        assert_eq!(distance_to_segment(pos2(5.0, 3.0), from, to), 3.0);
        assert_eq!(distance_to_segment(pos2(-4.0, 3.0), from, to), 5.0);
        assert_eq!(distance_to_segment(pos2(2.0, 2.0), from, from), pos2(2.0, 2.0).distance(from));
    }
}
