use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

use super::forces::{self, Collision};
use super::quadtree::Cell;

/// One simulated node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Held in place at this position while set.
    pub fixed: Option<Vec2>,
}

impl Body {
    pub fn at(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            fixed: None,
        }
    }
}

/// A force-directed layout engine the adapter can drive.
pub trait ForceSimulation {
    /// Replaces every body and spring. Springs are index pairs into `bodies`.
    fn reseed(&mut self, bodies: Vec<Body>, springs: Vec<(usize, usize)>);
    fn bodies(&self) -> &[Body];
    fn set_fixed(&mut self, index: usize, fixed: Option<Vec2>);
    /// Restarts cooling from full energy.
    fn reheat(&mut self);
    /// Energy level the simulation cools toward; non-zero keeps it moving.
    fn set_alpha_target(&mut self, target: f32);
    fn is_settled(&self) -> bool;
    /// Advances one step. Returns whether any body moved.
    fn tick(&mut self) -> bool;
}

/// Tuning for [`ForceLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Many-body strength; negative repels.
    pub charge: f32,
    pub link_distance: f32,
    pub centering: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub theta: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            charge: -120.0,
            link_distance: 70.0,
            centering: 0.04,
            collision_padding: 4.0,
            collision_strength: 0.7,
            alpha_min: 0.001,
            // Cools from 1 to alpha_min in about 300 ticks.
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            theta: 0.9,
        }
    }
}

/// Force-directed layout with charge, link springs, centering and
/// collision, cooled by an `alpha` that decays toward `alpha_target`.
#[derive(Clone, Debug)]
pub struct ForceLayout {
    config: ForceConfig,
    bodies: Vec<Body>,
    springs: Vec<(usize, usize)>,
    degrees: Vec<usize>,
    alpha: f32,
    alpha_target: f32,
    scratch: Vec<Vec2>,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceConfig::default())
    }
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            springs: Vec::new(),
            degrees: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            scratch: Vec::new(),
        }
    }

    pub fn config(&self) -> ForceConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ForceConfig) {
        self.config = config;
    }
}

impl ForceSimulation for ForceLayout {
    fn reseed(&mut self, bodies: Vec<Body>, springs: Vec<(usize, usize)>) {
        let count = bodies.len();
        self.springs = springs
            .into_iter()
            .filter(|&(source, target)| source < count && target < count)
            .collect();
        self.degrees = vec![0; count];
        for &(source, target) in &self.springs {
            self.degrees[source] += 1;
            self.degrees[target] += 1;
        }
        self.bodies = bodies;
        for body in &mut self.bodies {
            if let Some(fixed) = body.fixed {
                body.position = fixed;
                body.velocity = Vec2::ZERO;
            }
        }
    }

    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn set_fixed(&mut self, index: usize, fixed: Option<Vec2>) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.fixed = fixed;
            if let Some(position) = fixed {
                body.position = position;
                body.velocity = Vec2::ZERO;
            }
        }
    }

    fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    fn tick(&mut self) -> bool {
        if self.bodies.is_empty() || self.is_settled() {
            return false;
        }

        let config = self.config;
        self.alpha += (self.alpha_target - self.alpha) * config.alpha_decay;
        let alpha = self.alpha;

        let positions = self.bodies.iter().map(|body| body.position).collect::<Vec<_>>();
        let radii = self.bodies.iter().map(|body| body.radius).collect::<Vec<_>>();
        let velocities = &mut self.scratch;
        velocities.clear();
        velocities.extend(self.bodies.iter().map(|body| body.velocity));

        forces::links(
            &self.springs,
            &self.degrees,
            &positions,
            velocities,
            config.link_distance,
            alpha,
        );

        if let Some(root) = Cell::build(&positions) {
            for (index, velocity) in velocities.iter_mut().enumerate() {
                *velocity += forces::charge(&root, index, &positions, config.charge, config.theta, alpha);
            }

            let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
            let reach = max_radius * 2.0 + config.collision_padding;
            forces::collide(
                &root,
                &root,
                true,
                &positions,
                &radii,
                Collision {
                    padding: config.collision_padding,
                    strength: config.collision_strength,
                    reach_sq: reach * reach,
                },
                velocities,
            );
        }

        forces::centering(&positions, velocities, config.centering, alpha);

        let mut moved = false;
        for (body, velocity) in self.bodies.iter_mut().zip(velocities.iter()) {
            if let Some(fixed) = body.fixed {
                body.position = fixed;
                body.velocity = Vec2::ZERO;
                continue;
            }

            body.velocity = *velocity * (1.0 - config.velocity_decay);
            if !body.velocity.x.is_finite() || !body.velocity.y.is_finite() {
                body.velocity = Vec2::ZERO;
            }
            body.position += body.velocity;
            moved |= body.velocity.length_sq() > 1e-6;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn settle(layout: &mut ForceLayout) {
        for _ in 0..2_000 {
            if layout.is_settled() {
                break;
            }
            layout.tick();
        }
    }

    #[test]
    fn linked_pair_settles_near_link_distance() {
        let mut layout = ForceLayout::default();
        layout.reseed(
            vec![Body::at(vec2(-300.0, 0.0), 5.0), Body::at(vec2(300.0, 0.0), 5.0)],
            vec![(0, 1)],
        );
        settle(&mut layout);

        let gap = (layout.bodies()[0].position - layout.bodies()[1].position).length();
        assert!(gap < 300.0, "pair should contract, gap {gap}");
        assert!(layout.is_settled());
    }

    #[test]
    fn fixed_bodies_do_not_move() {
        let mut layout = ForceLayout::default();
        let mut pinned = Body::at(vec2(40.0, 40.0), 5.0);
        pinned.fixed = Some(vec2(40.0, 40.0));
        layout.reseed(vec![pinned, Body::at(vec2(41.0, 40.0), 5.0)], vec![(0, 1)]);
        for _ in 0..50 {
            layout.tick();
        }
        assert_eq!(layout.bodies()[0].position, vec2(40.0, 40.0));
        assert_ne!(layout.bodies()[1].position, vec2(41.0, 40.0));
    }

    #[test]
    fn alpha_target_keeps_simulation_warm_until_released() {
        let mut layout = ForceLayout::default();
        layout.reseed(vec![Body::at(Vec2::ZERO, 5.0), Body::at(vec2(10.0, 0.0), 5.0)], vec![]);
        layout.set_alpha_target(0.3);
        for _ in 0..1_000 {
            layout.tick();
        }
        assert!(!layout.is_settled());

        layout.set_alpha_target(0.0);
        settle(&mut layout);
        assert!(layout.is_settled());
    }

    #[test]
    fn springs_with_bad_indices_are_ignored() {
        let mut layout = ForceLayout::default();
        layout.reseed(vec![Body::at(Vec2::ZERO, 5.0)], vec![(0, 7)]);
        assert!(layout.springs.is_empty());
        assert_eq!(layout.degrees, vec![0]);
    }
}
