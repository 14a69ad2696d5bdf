pub mod canvas;
pub mod style;
pub mod theme;

use eframe::egui::{Painter, Pos2, Rect, Stroke, Vec2};

pub use canvas::{GraphCanvas, NodePaint, PainterCanvas, draw_link, draw_node};
pub use style::{NodeFlags, base_radius, node_radius};
pub use theme::{Palette, Theme};

/// Camera over the layout plane: `pan` in screen pixels, `zoom` as a scale
/// factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub rect: Rect,
    pub pan: Vec2,
    pub zoom: f32,
}

impl Viewport {
    pub const MIN_ZOOM: f32 = 0.05;
    pub const MAX_ZOOM: f32 = 6.0;

    pub fn to_screen(&self, world: Vec2) -> Pos2 {
        self.rect.center() + self.pan + world * self.zoom
    }

    pub fn to_world(&self, screen: Pos2) -> Vec2 {
        (screen - self.rect.center() - self.pan) / self.zoom
    }

    /// Zooms by `factor` while keeping the world point under `anchor` fixed.
    pub fn zoom_around(&mut self, anchor: Pos2, factor: f32) {
        let world = self.to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        self.pan = anchor - self.rect.center() - world * self.zoom;
    }
}

pub fn circle_visible(rect: Rect, center: Pos2, radius: f32) -> bool {
    center.x + radius >= rect.left()
        && center.x - radius <= rect.right()
        && center.y + radius >= rect.top()
        && center.y - radius <= rect.bottom()
}

/// Conservative test: the segment's padded bounding box overlaps `rect`.
pub fn segment_visible(rect: Rect, from: Pos2, to: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(from, to).expand(padding);
    bounds.intersects(rect)
}

pub fn draw_background(painter: &Painter, viewport: &Viewport, palette: &Palette) {
    let rect = viewport.rect;
    painter.rect_filled(rect, 0.0, palette.background);

    let step = (56.0 * viewport.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + viewport.pan;
    let stroke = Stroke::new(1.0, palette.grid);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn viewport() -> Viewport {
        Viewport {
            rect: Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)),
            pan: vec2(15.0, -10.0),
            zoom: 1.5,
        }
    }

    #[test]
    fn screen_and_world_are_inverse() {
        let view = viewport();
        let world = vec2(-42.0, 17.5);
        let back = view.to_world(view.to_screen(world));
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn zoom_keeps_anchor_in_place() {
        let mut view = viewport();
        let anchor = Pos2::new(600.0, 150.0);
        let before = view.to_world(anchor);
        view.zoom_around(anchor, 1.1);
        assert!((view.to_world(anchor) - before).length() < 1e-3);
        assert!((view.zoom - 1.65).abs() < 1e-5);
    }

    #[test]
    fn culling_checks() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(circle_visible(rect, Pos2::new(-5.0, 50.0), 6.0));
        assert!(!circle_visible(rect, Pos2::new(-20.0, 50.0), 6.0));
        assert!(segment_visible(rect, Pos2::new(-50.0, 50.0), Pos2::new(150.0, 50.0), 0.0));
        assert!(!segment_visible(rect, Pos2::new(-50.0, -50.0), Pos2::new(-10.0, -5.0), 2.0));
    }
}
