use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points.iter().filter(|point| point.x.is_finite() && point.y.is_finite()) {
            min = min.min(*point);
            max = max.max(*point);
        }
        if !min.x.is_finite() || !max.x.is_finite() {
            return None;
        }

        let extent = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half: extent * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    /// Gap between two squares, zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half + other.half;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant(self, index: usize) -> Self {
        let offset = self.half * 0.5;
        let sign_x = if index & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if index & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * offset, sign_y * offset),
            half: offset,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }
}

/// Barnes-Hut cell. Leaves list their bodies; inner cells only aggregate.
#[derive(Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    pub(super) centroid: Vec2,
    pub(super) count: f32,
    pub(super) members: Vec<usize>,
    pub(super) quadrants: [Option<Box<Cell>>; 4],
}

impl Cell {
    /// Builds a tree over every finite position. Returns `None` for an empty
    /// set.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let members = (0..positions.len())
            .filter(|&index| positions[index].x.is_finite() && positions[index].y.is_finite())
            .collect();
        Some(Self::subdivide(square, members, positions, 0))
    }

    fn subdivide(square: Square, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let count = members.len() as f32;
        let centroid = if members.is_empty() {
            square.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / count
        };

        let mut cell = Self {
            square,
            centroid,
            count,
            members,
            quadrants: Default::default(),
        };
        if cell.members.len() <= LEAF_CAPACITY || depth >= MAX_DEPTH {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &cell.members {
            buckets[square.quadrant_of(positions[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return cell;
        }

        for (index, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                cell.quadrants[index] = Some(Box::new(Self::subdivide(
                    square.quadrant(index),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        cell.members.clear();
        cell
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.quadrants.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Cell> {
        self.quadrants.iter().filter_map(|child| child.as_deref())
    }
}
