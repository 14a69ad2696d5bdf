use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2, vec2};

use crate::knowledge::{GraphLink, GraphNode};
use crate::util::display_label;

use super::style::{ARROW_LENGTH, NodeFlags, fade, link_style, resolve_node_style};
use super::theme::Palette;

pub const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_PADDING: Vec2 = vec2(4.0, 2.0);
const LABEL_GAP: f32 = 3.0;

/// Drawing surface in screen coordinates.
pub trait GraphCanvas {
    fn measure_text(&self, text: &str, font: &FontId) -> Vec2;
    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32);
    fn stroke_circle(&mut self, center: Pos2, radius: f32, stroke: Stroke);
    fn fill_rect(&mut self, rect: Rect, rounding: f32, color: Color32);
    fn fill_text(&mut self, center: Pos2, text: &str, font: &FontId, color: Color32);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);
    fn fill_triangle(&mut self, points: [Pos2; 3], color: Color32);
}

/// [`GraphCanvas`] over an egui painter.
pub struct PainterCanvas<'a> {
    painter: &'a Painter,
}

impl<'a> PainterCanvas<'a> {
    pub fn new(painter: &'a Painter) -> Self {
        Self { painter }
    }
}

impl GraphCanvas for PainterCanvas<'_> {
    fn measure_text(&self, text: &str, font: &FontId) -> Vec2 {
        self.painter
            .layout_no_wrap(text.to_owned(), font.clone(), Color32::WHITE)
            .size()
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.painter.circle_filled(center, radius, color);
    }

    fn stroke_circle(&mut self, center: Pos2, radius: f32, stroke: Stroke) {
        self.painter.circle_stroke(center, radius, stroke);
    }

    fn fill_rect(&mut self, rect: Rect, rounding: f32, color: Color32) {
        self.painter.rect_filled(rect, rounding, color);
    }

    fn fill_text(&mut self, center: Pos2, text: &str, font: &FontId, color: Color32) {
        self.painter
            .text(center, Align2::CENTER_CENTER, text, font.clone(), color);
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter.line_segment([from, to], stroke);
    }

    fn fill_triangle(&mut self, points: [Pos2; 3], color: Color32) {
        self.painter
            .add(Shape::convex_polygon(points.to_vec(), color, Stroke::NONE));
    }
}

/// One node as it should appear this frame.
#[derive(Clone, Copy, Debug)]
pub struct NodePaint<'a> {
    pub node: &'a GraphNode,
    pub center: Pos2,
    pub flags: NodeFlags,
    pub label_opacity: f32,
}

/// Draws a node body, its outline and, when visible, its label on a padded
/// background. `scale` converts world units to screen pixels.
pub fn draw_node(canvas: &mut impl GraphCanvas, paint: &NodePaint<'_>, scale: f32, palette: &Palette) {
    let style = resolve_node_style(paint.node, paint.flags, palette);
    let radius = style.radius * scale;

    canvas.fill_circle(paint.center, radius, style.fill);
    canvas.stroke_circle(paint.center, radius, style.outline);

    if paint.label_opacity <= 0.0 {
        return;
    }

    let text = display_label(paint.node.display_name());
    let font = FontId::proportional(LABEL_FONT_SIZE);
    let text_size = canvas.measure_text(&text, &font);
    let label_center = paint.center + vec2(0.0, radius + LABEL_GAP + LABEL_PADDING.y + text_size.y * 0.5);
    let background = Rect::from_center_size(label_center, text_size + LABEL_PADDING * 2.0);

    canvas.fill_rect(background, 3.0, fade(palette.label_background, paint.label_opacity * 0.85));
    canvas.fill_text(label_center, &text, &font, fade(palette.label_text, paint.label_opacity));
}

/// Draws a link between two node centers, ending with an arrow head on the
/// target's rim.
pub fn draw_link(
    canvas: &mut impl GraphCanvas,
    link: &GraphLink,
    from: Pos2,
    to: Pos2,
    target_radius: f32,
    scale: f32,
    palette: &Palette,
) {
    let style = link_style(link, palette);
    let delta = to - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }

    let direction = delta / length;
    let tip = to - direction * target_radius.min(length);
    canvas.line(from, tip, Stroke::new(style.width * scale.sqrt(), style.color));

    let arrow = ARROW_LENGTH * scale.max(0.5);
    let base = tip - direction * arrow;
    let normal = direction.rot90() * (arrow * 0.5);
    canvas.fill_triangle([tip, base + normal, base - normal], style.color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render::Theme;
    use crate::knowledge::NodePayload;

    #[derive(Debug, PartialEq)]
    enum Op {
        Circle(f32, Color32),
        Stroke(f32),
        Rect(Rect, Color32),
        Text(String, Color32),
        Line(Pos2, Pos2, f32),
        Triangle([Pos2; 3]),
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
    }

    impl GraphCanvas for RecordingCanvas {
        fn measure_text(&self, text: &str, font: &FontId) -> Vec2 {
            vec2(text.chars().count() as f32 * font.size * 0.5, font.size)
        }

        fn fill_circle(&mut self, _center: Pos2, radius: f32, color: Color32) {
            self.ops.push(Op::Circle(radius, color));
        }

        fn stroke_circle(&mut self, _center: Pos2, radius: f32, _stroke: Stroke) {
            self.ops.push(Op::Stroke(radius));
        }

        fn fill_rect(&mut self, rect: Rect, _rounding: f32, color: Color32) {
            self.ops.push(Op::Rect(rect, color));
        }

        fn fill_text(&mut self, _center: Pos2, text: &str, _font: &FontId, color: Color32) {
            self.ops.push(Op::Text(text.to_owned(), color));
        }

        fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
            self.ops.push(Op::Line(from, to, stroke.width));
        }

        fn fill_triangle(&mut self, points: [Pos2; 3], _color: Color32) {
            self.ops.push(Op::Triangle(points));
        }
    }

    fn concept() -> GraphNode {
        GraphNode::from_payload(&NodePayload {
            id: "concept_1".into(),
            label: "Ownership".into(),
            level: Some(1),
            ..Default::default()
        })
    }

    #[test]
    fn hidden_label_draws_only_the_body() {
        let node = concept();
        let mut canvas = RecordingCanvas::default();
        let paint = NodePaint {
            node: &node,
            center: Pos2::ZERO,
            flags: NodeFlags::default(),
            label_opacity: 0.0,
        };
        draw_node(&mut canvas, &paint, 1.0, &Theme::Light.palette());

        assert_eq!(canvas.ops.len(), 2);
        assert!(matches!(canvas.ops[0], Op::Circle(..)));
        assert!(matches!(canvas.ops[1], Op::Stroke(..)));
    }

    #[test]
    fn label_background_fits_measured_text_and_carries_opacity() {
        let node = concept();
        let palette = Theme::Light.palette();
        let mut canvas = RecordingCanvas::default();
        let paint = NodePaint {
            node: &node,
            center: Pos2::new(100.0, 100.0),
            flags: NodeFlags::default(),
            label_opacity: 0.6,
        };
        draw_node(&mut canvas, &paint, 2.0, &palette);

        let Op::Rect(rect, background) = &canvas.ops[2] else {
            panic!("expected label background, got {:?}", canvas.ops[2]);
        };
        let text_width = "Ownership".len() as f32 * LABEL_FONT_SIZE * 0.5;
        assert_eq!(rect.width(), text_width + LABEL_PADDING.x * 2.0);
        assert!(rect.top() > 100.0);
        assert!(background.a() < 255);

        let Op::Text(text, color) = &canvas.ops[3] else {
            panic!("expected label text, got {:?}", canvas.ops[3]);
        };
        assert_eq!(text, "Ownership");
        assert_eq!(color.a(), 153);
    }

    #[test]
    fn radius_scales_with_zoom() {
        let node = concept();
        let mut canvas = RecordingCanvas::default();
        let paint = NodePaint {
            node: &node,
            center: Pos2::ZERO,
            flags: NodeFlags::default(),
            label_opacity: 0.0,
        };
        draw_node(&mut canvas, &paint, 2.0, &Theme::Dark.palette());

        let Op::Circle(radius, _) = canvas.ops[0] else {
            panic!("expected body first");
        };
        assert_eq!(radius, 7.0_f32.sqrt() * 4.0 * 2.0);
    }

    #[test]
    fn link_stops_at_target_rim_with_arrow() {
        let mut canvas = RecordingCanvas::default();
        draw_link(
            &mut canvas,
            &GraphLink::new("a", "b", "contains"),
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 0.0),
            10.0,
            1.0,
            &Theme::Light.palette(),
        );

        assert_eq!(canvas.ops[0], Op::Line(Pos2::new(0.0, 0.0), Pos2::new(90.0, 0.0), 3.0));
        let Op::Triangle(points) = canvas.ops[1] else {
            panic!("expected arrow head");
        };
        assert_eq!(points[0], Pos2::new(90.0, 0.0));
        assert_eq!(points[1].x, 90.0 - ARROW_LENGTH);
    }
}
