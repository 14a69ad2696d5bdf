//! Keeps a force simulation in step with the current graph value.
//!
//! Simulation state lives here, keyed by node id. Domain nodes only carry
//! the user's pin, which this adapter turns into a fixed body.

mod forces;
mod quadtree;
mod simulation;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use eframe::egui::{Vec2, vec2};
use log::{debug, trace};

use crate::knowledge::{Graph, NodeId, Pin};
use crate::util::stable_pair;

use super::render::base_radius;

pub use simulation::{Body, ForceConfig, ForceLayout, ForceSimulation};

/// Energy kept in the simulation while a node is being dragged.
const DRAG_ALPHA_TARGET: f32 = 0.3;
/// Offset of a new node from the neighbor it is seeded next to.
const NEIGHBOR_SEED_OFFSET: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinState {
    Unpinned,
    /// Being dragged; fixed under the pointer.
    Pinning,
    Pinned,
}

#[derive(Debug)]
pub struct LayoutAdapter<S: ForceSimulation = ForceLayout> {
    simulation: S,
    ids: Vec<NodeId>,
    index_by_id: HashMap<NodeId, usize>,
    pin_states: Vec<PinState>,
    dragging: Option<NodeId>,
    synced_revision: Option<u64>,
    viewport: Vec2,
    pending_resize: Option<(Vec2, Instant)>,
    resize_debounce: Duration,
}

impl<S: ForceSimulation> LayoutAdapter<S> {
    pub fn new(simulation: S, resize_debounce: Duration) -> Self {
        Self {
            simulation,
            ids: Vec::new(),
            index_by_id: HashMap::new(),
            pin_states: Vec::new(),
            dragging: None,
            synced_revision: None,
            viewport: Vec2::ZERO,
            pending_resize: None,
            resize_debounce,
        }
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    /// Re-seeds the simulation when `revision` differs from the last sync.
    /// Bodies whose id survives keep position and velocity; pinned and
    /// dragged nodes are fixed. Returns whether a re-seed happened.
    pub fn sync(&mut self, graph: &Graph, revision: u64) -> bool {
        if self.synced_revision == Some(revision) {
            return false;
        }

        let previous = self
            .ids
            .iter()
            .zip(self.simulation.bodies())
            .map(|(id, body)| (id.as_str(), *body))
            .collect::<HashMap<_, _>>();

        let ids = graph.nodes().map(|node| node.id.clone()).collect::<Vec<_>>();
        let index_by_id = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect::<HashMap<_, _>>();

        if let Some(dragging) = &self.dragging
            && !index_by_id.contains_key(dragging)
        {
            debug!("dragged node {dragging} left the graph");
            self.dragging = None;
        }

        let spread = (graph.node_count() as f32).sqrt() * NEIGHBOR_SEED_OFFSET;
        let mut pin_states = Vec::with_capacity(ids.len());
        let mut bodies = Vec::with_capacity(ids.len());
        let mut seeded = 0usize;

        for node in graph.nodes() {
            let radius = base_radius(node);
            let mut body = match previous.get(node.id.as_str()) {
                Some(body) => Body { radius, ..*body },
                None => {
                    seeded += 1;
                    let position = node
                        .pin
                        .map(pin_to_vec)
                        .or_else(|| seed_near_neighbor(graph, &node.id, &previous))
                        .unwrap_or_else(|| {
                            let (x, y) = stable_pair(&node.id);
                            vec2(x, y) * spread
                        });
                    Body::at(position, radius)
                }
            };

            let dragged = self.dragging.as_deref() == Some(node.id.as_str());
            let state = match (dragged, node.pin) {
                (true, _) => PinState::Pinning,
                (false, Some(_)) => PinState::Pinned,
                (false, None) => PinState::Unpinned,
            };
            body.fixed = match state {
                PinState::Pinning => body.fixed.or(Some(body.position)),
                PinState::Pinned => node.pin.map(pin_to_vec),
                PinState::Unpinned => None,
            };

            pin_states.push(state);
            bodies.push(body);
        }

        let springs = graph
            .links()
            .filter_map(|link| Some((*index_by_id.get(&link.source)?, *index_by_id.get(&link.target)?)))
            .collect();

        debug!(
            "layout re-seeded at revision {revision}: {} bodies ({seeded} new)",
            bodies.len()
        );
        self.simulation.reseed(bodies, springs);
        self.simulation.reheat();
        self.ids = ids;
        self.index_by_id = index_by_id;
        self.pin_states = pin_states;
        self.synced_revision = Some(revision);
        true
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        let index = *self.index_by_id.get(id)?;
        self.simulation.bodies().get(index).map(|body| body.position)
    }

    /// `(id, position)` for every body.
    pub fn positions(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        self.ids
            .iter()
            .zip(self.simulation.bodies())
            .map(|(id, body)| (id.as_str(), body.position))
    }

    pub fn pin_state(&self, id: &str) -> Option<PinState> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.pin_states.get(index).copied())
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Starts dragging `id`. Only one node drags at a time.
    pub fn drag_start(&mut self, id: &str) -> bool {
        if self.dragging.is_some() {
            return false;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        let Some(position) = self.simulation.bodies().get(index).map(|body| body.position) else {
            return false;
        };

        self.simulation.set_fixed(index, Some(position));
        self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.simulation.reheat();
        self.pin_states[index] = PinState::Pinning;
        self.dragging = Some(id.to_owned());
        trace!("drag start {id}");
        true
    }

    pub fn drag_to(&mut self, world: Vec2) {
        let Some(index) = self
            .dragging
            .as_ref()
            .and_then(|id| self.index_by_id.get(id).copied())
        else {
            return;
        };
        self.simulation.set_fixed(index, Some(world));
    }

    /// Finishes the drag and returns the pin to persist.
    pub fn drag_end(&mut self) -> Option<(NodeId, Pin)> {
        let id = self.dragging.take()?;
        self.simulation.set_alpha_target(0.0);

        let index = *self.index_by_id.get(&id)?;
        let position = self.simulation.bodies().get(index)?.position;
        self.pin_states[index] = PinState::Pinned;
        trace!("drag end {id} at ({:.1}, {:.1})", position.x, position.y);
        Some((id, Pin::new(position.x, position.y)))
    }

    /// Records a viewport size change; applied by [`Self::poll_resize`] once
    /// no newer change arrived within the debounce window.
    pub fn notify_resize(&mut self, size: Vec2, now: Instant) {
        let unchanged = match self.pending_resize {
            Some((pending, _)) => pending == size,
            None => size == self.viewport,
        };
        if !unchanged {
            self.pending_resize = Some((size, now));
        }
    }

    /// Applies a settled resize and reheats. Returns whether one was applied.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        let Some((size, since)) = self.pending_resize else {
            return false;
        };
        if now.saturating_duration_since(since) < self.resize_debounce {
            return false;
        }

        self.pending_resize = None;
        self.viewport = size;
        self.simulation.reheat();
        debug!("viewport resized to {:.0}x{:.0}", size.x, size.y);
        true
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Advances the simulation unless it has cooled down.
    pub fn tick(&mut self) -> bool {
        if self.simulation.is_settled() {
            return false;
        }
        self.simulation.tick()
    }

    pub fn is_settled(&self) -> bool {
        self.simulation.is_settled()
    }
}

fn pin_to_vec(pin: Pin) -> Vec2 {
    vec2(pin.x, pin.y)
}

fn seed_near_neighbor(graph: &Graph, id: &str, previous: &HashMap<&str, Body>) -> Option<Vec2> {
    let anchor = graph.links_of(id).find_map(|link| {
        let other = if link.source == id { &link.target } else { &link.source };
        previous.get(other.as_str())
    })?;
    let (x, y) = stable_pair(id);
    let direction = vec2(x, y);
    let direction = if direction.length_sq() > 1e-6 {
        direction.normalized()
    } else {
        vec2(1.0, 0.0)
    };
    Some(anchor.position + direction * NEIGHBOR_SEED_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{GraphLink, GraphSnapshot, NodePayload, PinnedPositions, from_snapshot, merge};

    /// Simulation that never moves anything, recording what the adapter asks.
    #[derive(Default)]
    struct StillSimulation {
        bodies: Vec<Body>,
        reseeds: usize,
        reheats: usize,
        alpha_target: f32,
    }

    impl ForceSimulation for StillSimulation {
        fn reseed(&mut self, bodies: Vec<Body>, _springs: Vec<(usize, usize)>) {
            self.bodies = bodies;
            self.reseeds += 1;
        }

        fn bodies(&self) -> &[Body] {
            &self.bodies
        }

        fn set_fixed(&mut self, index: usize, fixed: Option<Vec2>) {
            if let Some(body) = self.bodies.get_mut(index) {
                body.fixed = fixed;
                if let Some(position) = fixed {
                    body.position = position;
                }
            }
        }

        fn reheat(&mut self) {
            self.reheats += 1;
        }

        fn set_alpha_target(&mut self, target: f32) {
            self.alpha_target = target;
        }

        fn is_settled(&self) -> bool {
            false
        }

        fn tick(&mut self) -> bool {
            false
        }
    }

    fn adapter() -> LayoutAdapter<StillSimulation> {
        LayoutAdapter::new(StillSimulation::default(), Duration::from_millis(50))
    }

    fn graph(ids: &[&str], links: &[(&str, &str)]) -> Graph {
        from_snapshot(
            &GraphSnapshot {
                nodes: ids
                    .iter()
                    .map(|id| NodePayload {
                        id: (*id).to_owned(),
                        ..Default::default()
                    })
                    .collect(),
                links: links
                    .iter()
                    .map(|(source, target)| GraphLink::new(*source, *target, "rel"))
                    .collect(),
            },
            &PinnedPositions::new(),
        )
    }

    #[test]
    fn sync_only_reseeds_on_new_revision() {
        let mut layout = adapter();
        let g = graph(&["a", "b"], &[("a", "b")]);
        assert!(layout.sync(&g, 1));
        assert!(!layout.sync(&g, 1));
        assert_eq!(layout.simulation().reseeds, 1);
        assert_eq!(layout.simulation().reheats, 1);
    }

    #[test]
    fn surviving_bodies_keep_their_position() {
        let mut layout = adapter();
        let first = graph(&["a", "b"], &[("a", "b")]);
        layout.sync(&first, 1);
        layout.simulation_mut().set_fixed(0, Some(vec2(123.0, 45.0)));
        layout.simulation_mut().bodies[0].fixed = None;

        let second = merge(
            &first,
            &GraphSnapshot {
                nodes: vec![NodePayload {
                    id: "c".into(),
                    ..Default::default()
                }],
                links: vec![GraphLink::new("a", "c", "rel")],
            },
            &PinnedPositions::new(),
        );
        layout.sync(&second, 2);

        assert_eq!(layout.position("a"), Some(vec2(123.0, 45.0)));
        let c = layout.position("c").expect("new body");
        assert!((c - vec2(123.0, 45.0)).length() <= NEIGHBOR_SEED_OFFSET + 1e-3);
    }

    #[test]
    fn drag_cycle_moves_through_pin_states() {
        let mut layout = adapter();
        let g = graph(&["a", "b"], &[]);
        layout.sync(&g, 1);
        assert_eq!(layout.pin_state("a"), Some(PinState::Unpinned));

        assert!(layout.drag_start("a"));
        assert!(!layout.drag_start("b"));
        assert_eq!(layout.pin_state("a"), Some(PinState::Pinning));
        assert_eq!(layout.simulation().alpha_target, DRAG_ALPHA_TARGET);

        layout.drag_to(vec2(10.0, -20.0));
        let (id, pin) = layout.drag_end().expect("drag was active");
        assert_eq!(id, "a");
        assert_eq!(pin, Pin::new(10.0, -20.0));
        assert_eq!(layout.pin_state("a"), Some(PinState::Pinned));
        assert_eq!(layout.simulation().alpha_target, 0.0);
        assert!(layout.drag_end().is_none());

        let pinned = g.with_pin("a", pin).expect("node exists");
        layout.sync(&pinned, 2);
        assert_eq!(layout.pin_state("a"), Some(PinState::Pinned));
        assert_eq!(layout.simulation().bodies()[0].fixed, Some(vec2(10.0, -20.0)));
    }

    #[test]
    fn stored_pin_places_and_fixes_new_body() {
        let mut layout = adapter();
        let g = graph(&["a"], &[])
            .with_pin("a", Pin::new(-5.0, 7.0))
            .expect("node exists");
        layout.sync(&g, 1);
        assert_eq!(layout.position("a"), Some(vec2(-5.0, 7.0)));
        assert_eq!(layout.pin_state("a"), Some(PinState::Pinned));
    }

    #[test]
    fn resize_is_debounced_and_last_size_wins() {
        let mut layout = adapter();
        let start = Instant::now();
        layout.notify_resize(vec2(800.0, 600.0), start);
        layout.notify_resize(vec2(900.0, 600.0), start + Duration::from_millis(20));
        assert!(!layout.poll_resize(start + Duration::from_millis(40)));
        assert!(layout.poll_resize(start + Duration::from_millis(75)));
        assert_eq!(layout.viewport(), vec2(900.0, 600.0));
        assert_eq!(layout.simulation().reheats, 1);

        layout.notify_resize(vec2(900.0, 600.0), start + Duration::from_millis(200));
        assert!(!layout.poll_resize(start + Duration::from_secs(1)));
    }

    #[test]
    fn drag_survives_reseed_and_ends_when_node_leaves() {
        let mut layout = adapter();
        layout.sync(&graph(&["a", "b"], &[]), 1);
        layout.drag_start("a");
        layout.drag_to(vec2(1.0, 1.0));

        layout.sync(&graph(&["a", "b", "c"], &[]), 2);
        assert_eq!(layout.pin_state("a"), Some(PinState::Pinning));
        assert_eq!(layout.position("a"), Some(vec2(1.0, 1.0)));

        layout.sync(&graph(&["b"], &[]), 3);
        assert_eq!(layout.dragging(), None);
    }
}
