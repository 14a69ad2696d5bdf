use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

const MIN_DISTANCE_SQ: f32 = 1.0;

/// Deterministic unit vector used when two bodies sit on the same spot.
fn nudge(a: usize, b: usize) -> Vec2 {
    let angle = (a as f32 * 0.618_034 + b as f32 * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Many-body charge on body `index`, approximated with Barnes-Hut.
/// Negative `strength` repels.
pub(super) fn charge(
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    alpha: f32,
) -> Vec2 {
    if cell.count <= 0.0 {
        return Vec2::ZERO;
    }

    let point = positions[index];
    if cell.is_leaf() {
        return cell
            .members
            .iter()
            .filter(|&&other| other != index)
            .fold(Vec2::ZERO, |acc, &other| {
                let mut delta = positions[other] - point;
                if delta.length_sq() < 1e-6 {
                    delta = nudge(index, other);
                }
                let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
                acc + delta * (strength * alpha / distance_sq)
            });
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let far_enough = !cell.square.contains(point)
        && (cell.square.half * 2.0) * (cell.square.half * 2.0) < theta * theta * distance_sq;
    if far_enough {
        return delta * (strength * cell.count * alpha / distance_sq);
    }

    cell.children()
        .map(|child| charge(child, index, positions, strength, theta, alpha))
        .fold(Vec2::ZERO, |acc, force| acc + force)
}

/// Spring toward `distance` along each link. The lighter-connected end moves
/// more.
pub(super) fn links(
    springs: &[(usize, usize)],
    degrees: &[usize],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    alpha: f32,
) {
    for &(source, target) in springs {
        if source == target {
            continue;
        }

        let mut delta = (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() < 1e-6 {
            delta = nudge(source, target) * 1e-3;
        }
        let length = delta.length();
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        let strength = 1.0 / source_degree.min(target_degree);
        let pull = (length - distance) / length * alpha * strength;
        let bias = source_degree / (source_degree + target_degree);

        let correction = delta * pull;
        velocities[target] -= correction * bias;
        velocities[source] += correction * (1.0 - bias);
    }
}

/// Weak pull of every body toward the origin.
pub(super) fn centering(positions: &[Vec2], velocities: &mut [Vec2], strength: f32, alpha: f32) {
    for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
        *velocity -= *position * (strength * alpha);
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Collision {
    pub(super) padding: f32,
    pub(super) strength: f32,
    pub(super) reach_sq: f32,
}

/// Pushes overlapping bodies apart. Walks pairs of cells and skips any pair
/// too far apart to touch.
pub(super) fn collide(
    a: &Cell,
    b: &Cell,
    same: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: Collision,
    velocities: &mut [Vec2],
) {
    if a.square.gap_sq(b.square) > params.reach_sq {
        return;
    }

    if a.is_leaf() && b.is_leaf() {
        for (offset, &first) in a.members.iter().enumerate() {
            let others = if same { &a.members[offset + 1..] } else { &b.members[..] };
            for &second in others {
                separate(first, second, positions, radii, params, velocities);
            }
        }
        return;
    }

    if same {
        let children = a.children().collect::<Vec<_>>();
        for (offset, first) in children.iter().enumerate() {
            collide(first, first, true, positions, radii, params, velocities);
            for second in &children[offset + 1..] {
                collide(first, second, false, positions, radii, params, velocities);
            }
        }
        return;
    }

    let split_a = !a.is_leaf() && (b.is_leaf() || a.square.half >= b.square.half);
    if split_a {
        for child in a.children() {
            collide(child, b, false, positions, radii, params, velocities);
        }
    } else {
        for child in b.children() {
            collide(a, child, false, positions, radii, params, velocities);
        }
    }
}

fn separate(
    first: usize,
    second: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: Collision,
    velocities: &mut [Vec2],
) {
    let min_distance = radii[first] + radii[second] + params.padding;
    let mut delta = positions[first] - positions[second];
    let distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }

    let distance = if distance_sq < 1e-6 {
        delta = nudge(first, second);
        1.0
    } else {
        distance_sq.sqrt()
    };
    let push = delta / distance * ((min_distance - distance.min(min_distance)) * params.strength * 0.5);
    let total = radii[first] * radii[first] + radii[second] * radii[second];
    let share = if total > 0.0 {
        radii[second] * radii[second] / total
    } else {
        0.5
    };
    velocities[first] += push * share;
    velocities[second] -= push * (1.0 - share);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let root = Cell::build(&positions).expect("tree");
        let on_left = charge(&root, 0, &positions, -30.0, 0.9, 1.0);
        let on_right = charge(&root, 1, &positions, -30.0, 0.9, 1.0);
        assert!(on_left.x < 0.0);
        assert!(on_right.x > 0.0);
    }

    #[test]
    fn stretched_link_pulls_ends_together() {
        let positions = vec![vec2(0.0, 0.0), vec2(200.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        links(&[(0, 1)], &[1, 1], &positions, &mut velocities, 50.0, 1.0);
        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn overlapping_bodies_separate() {
        let positions = vec![vec2(0.0, 0.0), vec2(2.0, 0.0), vec2(500.0, 500.0)];
        let radii = vec![5.0, 5.0, 5.0];
        let mut velocities = vec![Vec2::ZERO; 3];
        let root = Cell::build(&positions).expect("tree");
        let params = Collision {
            padding: 2.0,
            strength: 0.7,
            reach_sq: 12.0 * 12.0,
        };
        collide(&root, &root, true, &positions, &radii, params, &mut velocities);

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert_eq!(velocities[2], Vec2::ZERO);
    }
}
