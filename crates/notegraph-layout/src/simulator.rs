//! Layout simulator: owns the body arena and drives the physics step

use std::collections::HashMap;

use notegraph_core::NodeId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::step::{self, Body, FRAME_SECONDS, GOLDEN_ANGLE, LayoutState, PinState, Spring};
use crate::vector::Vec2;

/// Radius of the innermost seeding ring.
const SEED_RADIUS: f64 = 10.0;

/// Minimum hit radius so that tiny nodes stay clickable.
const MIN_HIT_RADIUS: f64 = 8.0;

/// Explicit run state. Initial state is `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

/// Node handed to the simulator: identity plus collision radius.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub radius: f64,
}

/// Link handed to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLink {
    pub source: NodeId,
    pub target: NodeId,
    pub strength: f64,
}

/// Outcome of loading a new node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarmStart {
    /// Bodies that kept their previous position.
    pub retained: usize,
    /// Bodies placed for the first time.
    pub seeded: usize,
    /// Bodies dropped because their node disappeared.
    pub removed: usize,
}

/// Continuous force-directed layout over an arena of bodies.
#[derive(Debug, Clone)]
pub struct LayoutSimulator {
    config: LayoutConfig,
    state: LayoutState,
    springs: Vec<Spring>,
    index: HashMap<NodeId, usize>,
    run_state: RunState,
    ticks: u64,
}

impl Default for LayoutSimulator {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutSimulator {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            state: LayoutState::default(),
            springs: Vec::new(),
            index: HashMap::new(),
            run_state: RunState::Running,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the configuration and let the layout relax under it.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.reheat(self.config.reheat_alpha);
    }

    // =========================================================================
    // NODE SET
    // =========================================================================

    /// Replace the simulated node and link sets.
    ///
    /// Bodies whose id already existed keep position, velocity and pin state.
    /// New bodies are seeded near the centroid of already-placed neighbors,
    /// or on a golden-angle spiral around the center. Links with an unknown
    /// endpoint are ignored.
    pub fn load(&mut self, nodes: &[LayoutNode], links: &[LayoutLink]) -> WarmStart {
        let mut previous: HashMap<NodeId, Body> = std::mem::take(&mut self.state.bodies)
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();
        let had_bodies = !previous.is_empty();

        let mut warm = WarmStart::default();
        let mut bodies = Vec::with_capacity(nodes.len());
        let mut placed = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if index.contains_key(&node.id) {
                continue;
            }
            index.insert(node.id.clone(), bodies.len());
            match previous.remove(&node.id) {
                Some(mut body) => {
                    body.radius = node.radius;
                    bodies.push(body);
                    placed.push(true);
                    warm.retained += 1;
                }
                None => {
                    bodies.push(Body::new(node.id.clone(), Vec2::ZERO, node.radius));
                    placed.push(false);
                    warm.seeded += 1;
                }
            }
        }
        warm.removed = previous.len();

        let springs: Vec<Spring> = links
            .iter()
            .filter_map(|l| {
                let source = *index.get(&l.source)?;
                let target = *index.get(&l.target)?;
                (source != target).then_some(Spring {
                    source,
                    target,
                    strength: l.strength,
                })
            })
            .collect();

        self.seed(&mut bodies, &placed, &springs);

        self.state.bodies = bodies;
        self.springs = springs;
        self.index = index;

        // a drag whose body was dropped can never be ended
        if !self.any_dragging() {
            self.state.alpha_target = 0.0;
        }
        if warm.retained == 0 {
            self.state.alpha = 1.0;
        } else if warm.seeded > 0 || warm.removed > 0 {
            self.reheat(self.config.reheat_alpha);
        }
        if !had_bodies && warm.seeded > 0 {
            debug!(bodies = warm.seeded, "Cold-started layout");
        } else {
            debug!(
                retained = warm.retained,
                seeded = warm.seeded,
                removed = warm.removed,
                "Warm-started layout"
            );
        }
        warm
    }

    fn seed(&self, bodies: &mut [Body], placed: &[bool], springs: &[Spring]) {
        let center = Vec2::new(self.config.center_x, self.config.center_y);
        let mut neighbor_sum: Vec<(Vec2, usize)> = vec![(Vec2::ZERO, 0); bodies.len()];
        for s in springs {
            for (me, other) in [(s.source, s.target), (s.target, s.source)] {
                if !placed[me] && placed[other] {
                    neighbor_sum[me].0 += bodies[other].position;
                    neighbor_sum[me].1 += 1;
                }
            }
        }

        let mut ring = 0usize;
        for (i, body) in bodies.iter_mut().enumerate() {
            if placed[i] {
                continue;
            }
            let (sum, count) = neighbor_sum[i];
            let angle = (i + 1) as f64 * GOLDEN_ANGLE;
            body.position = if count > 0 {
                sum * (1.0 / count as f64) + Vec2::angled(angle) * (self.config.link_distance * 0.5)
            } else {
                ring += 1;
                center + Vec2::angled(ring as f64 * GOLDEN_ANGLE) * (SEED_RADIUS * (ring as f64 + 0.5).sqrt())
            };
            trace!("Seeded {} at ({:.1}, {:.1})", body.id, body.position.x, body.position.y);
        }
    }

    /// Drop every body, e.g. when the view is torn down.
    pub fn clear(&mut self) {
        self.state = LayoutState::default();
        self.springs.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.state.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.state.bodies
    }

    pub fn body(&self, id: &NodeId) -> Option<&Body> {
        self.index.get(id).map(|&i| &self.state.bodies[i])
    }

    pub fn position(&self, id: &NodeId) -> Option<Vec2> {
        self.body(id).map(|b| b.position)
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    // =========================================================================
    // RUN STATE
    // =========================================================================

    pub fn play(&mut self) {
        if self.run_state == RunState::Paused {
            debug!("Layout resumed");
        }
        self.run_state = RunState::Running;
    }

    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            debug!("Layout paused");
        }
        self.run_state = RunState::Paused;
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn alpha(&self) -> f64 {
        self.state.alpha
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_settled(&self.config)
    }

    /// Raise alpha so the layout relaxes again.
    pub fn reheat(&mut self, alpha: f64) {
        self.state.alpha = self.state.alpha.max(alpha.clamp(0.0, 1.0));
    }

    /// Kinetic energy of free bodies.
    pub fn energy(&self) -> f64 {
        self.state.kinetic_energy()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one frame. Returns `false` when nothing moved: paused, empty,
    /// or settled.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.run_state == RunState::Paused || self.state.bodies.is_empty() || self.is_settled() {
            return false;
        }
        self.state = step::step(&self.state, &self.springs, &self.config, dt);
        self.ticks += 1;
        true
    }

    /// Run up to `max_ticks` nominal frames or until settled. Returns ticks run.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.tick(FRAME_SECONDS) {
            ran += 1;
        }
        ran
    }

    // =========================================================================
    // PINNING / DRAG
    // =========================================================================

    fn set_pin(&mut self, id: &NodeId, pin: PinState) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let body = &mut self.state.bodies[i];
        body.pin = pin;
        if let Some(anchor) = pin.anchor() {
            body.position = anchor;
            body.velocity = Vec2::ZERO;
        }
        true
    }

    fn any_dragging(&self) -> bool {
        self.state
            .bodies
            .iter()
            .any(|b| matches!(b.pin, PinState::Dragging { .. }))
    }

    /// Grab a node at pointer coordinates. Keeps the layout warm while held.
    pub fn start_drag(&mut self, id: &NodeId, x: f64, y: f64) -> bool {
        if !self.set_pin(id, PinState::Dragging { x, y }) {
            return false;
        }
        self.state.alpha_target = self.config.drag_alpha_target;
        self.reheat(self.config.drag_alpha_target);
        true
    }

    /// Move a dragged node to new pointer coordinates.
    pub fn drag_to(&mut self, id: &NodeId, x: f64, y: f64) -> bool {
        match self.body(id).map(|b| b.pin) {
            Some(PinState::Dragging { .. }) => self.set_pin(id, PinState::Dragging { x, y }),
            _ => false,
        }
    }

    /// Release a dragged node back into free simulation.
    pub fn end_drag(&mut self, id: &NodeId) -> bool {
        match self.body(id).map(|b| b.pin) {
            Some(PinState::Dragging { .. }) => {
                self.set_pin(id, PinState::Free);
                if !self.any_dragging() {
                    self.state.alpha_target = 0.0;
                }
                true
            }
            _ => false,
        }
    }

    /// Fix a node in place until [`unpin`](Self::unpin).
    pub fn pin(&mut self, id: &NodeId, x: f64, y: f64) -> bool {
        let pinned = self.set_pin(id, PinState::Pinned { x, y });
        if pinned {
            self.reheat(self.config.reheat_alpha);
        }
        pinned
    }

    pub fn unpin(&mut self, id: &NodeId) -> bool {
        match self.body(id).map(|b| b.pin) {
            Some(PinState::Pinned { .. }) => {
                self.set_pin(id, PinState::Free);
                self.reheat(self.config.reheat_alpha);
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // HIT TESTING
    // =========================================================================

    /// Topmost node under a point in layout coordinates.
    pub fn node_at(&self, x: f64, y: f64) -> Option<&NodeId> {
        let point = Vec2::new(x, y);
        self.state
            .bodies
            .iter()
            .rev()
            .find(|b| b.position.distance(point) <= b.radius.max(MIN_HIT_RADIUS))
            .map(|b| &b.id)
    }

    pub fn set_center(&mut self, x: f64, y: f64) {
        self.config.center_x = x;
        self.config.center_y = y;
        self.reheat(self.config.reheat_alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<LayoutNode> {
        ids.iter()
            .map(|id| LayoutNode {
                id: NodeId::from(*id),
                radius: 5.0,
            })
            .collect()
    }

    fn link(a: &str, b: &str) -> LayoutLink {
        LayoutLink {
            source: NodeId::from(a),
            target: NodeId::from(b),
            strength: 1.0,
        }
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_initial_state_is_running() {
        let sim = LayoutSimulator::default();
        assert_eq!(sim.run_state(), RunState::Running);
    }

    #[test]
    fn test_empty_tick_is_noop() {
        let mut sim = LayoutSimulator::default();
        assert!(!sim.tick(FRAME_SECONDS));
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_pause_and_play() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[]);
        sim.pause();
        let before = sim.position(&id("a"));
        assert!(!sim.tick(FRAME_SECONDS));
        assert_eq!(sim.position(&id("a")), before);

        sim.play();
        assert!(sim.tick(FRAME_SECONDS));
        assert_eq!(sim.ticks(), 1);
    }

    #[test]
    fn test_cold_start_seeds_distinct_positions() {
        let mut sim = LayoutSimulator::default();
        let warm = sim.load(&nodes(&["a", "b", "c"]), &[]);
        assert_eq!(warm.seeded, 3);
        assert_eq!(sim.alpha(), 1.0);
        let a = sim.position(&id("a")).unwrap();
        let b = sim.position(&id("b")).unwrap();
        assert!(a.distance(b) > 0.0);
    }

    #[test]
    fn test_warm_start_preserves_positions() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[link("a", "b")]);
        sim.run_until_settled(500);
        let a = sim.position(&id("a")).unwrap();

        let warm = sim.load(&nodes(&["a", "b", "c"]), &[link("a", "b"), link("b", "c")]);
        assert_eq!(
            warm,
            WarmStart {
                retained: 2,
                seeded: 1,
                removed: 0
            }
        );
        assert_eq!(sim.position(&id("a")), Some(a));
        assert!(sim.alpha() >= sim.config().reheat_alpha);

        // c is seeded around its placed neighbor b
        let b = sim.position(&id("b")).unwrap();
        let c = sim.position(&id("c")).unwrap();
        assert!((b.distance(c) - sim.config().link_distance * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_links_to_unknown_nodes_are_ignored() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a"]), &[link("a", "ghost")]);
        assert_eq!(sim.spring_count(), 0);
    }

    #[test]
    fn test_drag_pins_and_release_frees() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b", "c"]), &[link("a", "b")]);
        sim.run_until_settled(1000);
        assert!(sim.is_settled());

        assert!(sim.start_drag(&id("a"), 200.0, 100.0));
        assert!(!sim.is_settled());
        for _ in 0..20 {
            sim.tick(FRAME_SECONDS);
        }
        assert_eq!(sim.position(&id("a")), Some(Vec2::new(200.0, 100.0)));

        assert!(sim.drag_to(&id("a"), 250.0, 90.0));
        sim.tick(FRAME_SECONDS);
        assert_eq!(sim.position(&id("a")), Some(Vec2::new(250.0, 90.0)));

        assert!(sim.end_drag(&id("a")));
        assert_eq!(sim.body(&id("a")).unwrap().pin, PinState::Free);
        assert_eq!(sim.state().alpha_target, 0.0);
        assert!(!sim.end_drag(&id("a")));
    }

    #[test]
    fn test_dropping_dragged_body_cools_layout() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[link("a", "b")]);
        assert!(sim.start_drag(&id("a"), 50.0, 50.0));
        assert_eq!(sim.state().alpha_target, sim.config().drag_alpha_target);

        sim.load(&nodes(&["b"]), &[]);
        assert_eq!(sim.state().alpha_target, 0.0);
        assert!(!sim.end_drag(&id("a")));
        sim.run_until_settled(5000);
        assert!(sim.is_settled());
    }

    #[test]
    fn test_reload_keeps_active_drag_warm() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[]);
        sim.start_drag(&id("a"), 50.0, 50.0);
        sim.load(&nodes(&["a", "b", "c"]), &[]);
        assert_eq!(sim.state().alpha_target, sim.config().drag_alpha_target);
        assert!(sim.end_drag(&id("a")));
        assert_eq!(sim.state().alpha_target, 0.0);
    }

    #[test]
    fn test_drag_to_requires_active_drag() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a"]), &[]);
        assert!(!sim.drag_to(&id("a"), 1.0, 1.0));
        assert!(!sim.start_drag(&id("missing"), 1.0, 1.0));
    }

    #[test]
    fn test_pin_survives_warm_start() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[]);
        assert!(sim.pin(&id("a"), 10.0, 10.0));
        sim.load(&nodes(&["a", "b", "c"]), &[]);
        sim.run_until_settled(50);
        assert_eq!(sim.position(&id("a")), Some(Vec2::new(10.0, 10.0)));
        assert!(sim.unpin(&id("a")));
        assert!(!sim.unpin(&id("a")));
    }

    #[test]
    fn test_hit_testing() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a"]), &[]);
        sim.pin(&id("a"), 100.0, 100.0);
        assert_eq!(sim.node_at(100.0, 104.0), Some(&id("a")));
        assert_eq!(sim.node_at(500.0, 500.0), None);
    }

    #[test]
    fn test_clear_releases_bodies() {
        let mut sim = LayoutSimulator::default();
        sim.load(&nodes(&["a", "b"]), &[link("a", "b")]);
        sim.clear();
        assert!(sim.is_empty());
        assert_eq!(sim.spring_count(), 0);
        assert!(!sim.tick(FRAME_SECONDS));
    }
}
