//! The physics step: a pure function from one layout state to the next.
//!
//! Link springs, pairwise charge, gravity and collision adjust velocities in
//! that order. Velocities are then damped, clamped and integrated. Pinned and
//! dragged bodies exert forces but never move on their own.

use notegraph_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::vector::Vec2;

/// Nominal frame length the force constants are tuned for.
pub const FRAME_SECONDS: f64 = 1.0 / 60.0;

/// Longest stretch of time integrated by one call, in frames.
const MAX_FRAMES_PER_STEP: f64 = 4.0;

/// Golden angle, used for deterministic jitter and seeding.
pub(crate) const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Per-node pin state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PinState {
    #[default]
    Free,
    /// Fixed in place until explicitly unpinned.
    Pinned { x: f64, y: f64 },
    /// Following the pointer; released back to `Free`.
    Dragging { x: f64, y: f64 },
}

impl PinState {
    /// Where the body is held, if it is held at all.
    pub fn anchor(&self) -> Option<Vec2> {
        match *self {
            PinState::Free => None,
            PinState::Pinned { x, y } | PinState::Dragging { x, y } => Some(Vec2::new(x, y)),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, PinState::Free)
    }
}

/// One simulated node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: NodeId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f64,
    pub pin: PinState,
}

impl Body {
    pub fn new(id: NodeId, position: Vec2, radius: f64) -> Self {
        Body {
            id,
            position,
            velocity: Vec2::ZERO,
            radius,
            pin: PinState::Free,
        }
    }
}

/// A link spring between two bodies, by arena index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
}

/// Everything the step function reads and writes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutState {
    pub bodies: Vec<Body>,
    /// Cooling coefficient; forces scale with it.
    pub alpha: f64,
    pub alpha_target: f64,
}

impl LayoutState {
    pub fn is_settled(&self, config: &LayoutConfig) -> bool {
        self.alpha < config.alpha_min && self.alpha_target < config.alpha_min
    }

    /// Sum of squared speeds of free bodies.
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter(|b| b.pin.is_free())
            .map(|b| b.velocity.length_sq())
            .sum()
    }
}

/// Advance `state` by `dt` seconds. Empty or settled states come back unchanged.
pub fn step(state: &LayoutState, springs: &[Spring], config: &LayoutConfig, dt: f64) -> LayoutState {
    let mut next = state.clone();
    if next.bodies.is_empty() || next.is_settled(config) {
        return next;
    }

    let frames = (dt / FRAME_SECONDS).clamp(0.0, MAX_FRAMES_PER_STEP);
    if frames == 0.0 {
        return next;
    }

    let decay = 1.0 - (1.0 - config.alpha_decay).powf(frames);
    next.alpha += (next.alpha_target - next.alpha) * decay;
    let alpha = next.alpha;

    apply_links(&mut next.bodies, springs, config, alpha);
    apply_charge(&mut next.bodies, config, alpha);
    apply_gravity(&mut next.bodies, config, alpha);
    apply_collision(&mut next.bodies, config);
    integrate(&mut next.bodies, config, frames);
    recenter(&mut next.bodies, config);

    next
}

fn center(config: &LayoutConfig) -> Vec2 {
    Vec2::new(config.center_x, config.center_y)
}

/// Deterministic small offset for coincident bodies.
fn jiggle(i: usize, j: usize) -> Vec2 {
    Vec2::angled((i * 7 + j * 13 + 1) as f64 * GOLDEN_ANGLE) * 1e-3
}

fn apply_links(bodies: &mut [Body], springs: &[Spring], config: &LayoutConfig, alpha: f64) {
    if springs.is_empty() {
        return;
    }
    let mut degree = vec![0usize; bodies.len()];
    for s in springs {
        degree[s.source] += 1;
        degree[s.target] += 1;
    }

    for s in springs {
        let (a, b) = (&bodies[s.source], &bodies[s.target]);
        let mut delta = (b.position + b.velocity) - (a.position + a.velocity);
        if delta.length_sq() == 0.0 {
            delta = jiggle(s.source, s.target);
        }
        let len = delta.length();
        let k = (len - config.link_distance) / len * alpha * s.strength * config.link_stiffness;
        let shift = delta * k;

        // the better-connected end moves less
        let bias = degree[s.source] as f64 / (degree[s.source] + degree[s.target]) as f64;
        bodies[s.target].velocity -= shift * bias;
        bodies[s.source].velocity += shift * (1.0 - bias);
    }
}

fn apply_charge(bodies: &mut [Body], config: &LayoutConfig, alpha: f64) {
    if config.charge_strength == 0.0 {
        return;
    }
    let max_sq = config.charge_distance_max * config.charge_distance_max;
    let scale = config.charge_strength * config.link_distance * alpha;
    let n = bodies.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let mut delta = bodies[i].position - bodies[j].position;
            let mut dist_sq = delta.length_sq();
            if dist_sq > max_sq {
                continue;
            }
            if dist_sq == 0.0 {
                delta = jiggle(i, j);
            }
            // clamp to avoid a singular push for near-coincident bodies
            dist_sq = dist_sq.max(1.0);
            let push = delta.normalized() * (scale / dist_sq);
            bodies[i].velocity += push;
            bodies[j].velocity -= push;
        }
    }
}

fn apply_gravity(bodies: &mut [Body], config: &LayoutConfig, alpha: f64) {
    if config.gravity == 0.0 {
        return;
    }
    let c = center(config);
    for body in bodies.iter_mut() {
        body.velocity += (c - body.position) * (config.gravity * alpha);
    }
}

fn apply_collision(bodies: &mut [Body], config: &LayoutConfig) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let min_sep = bodies[i].radius + bodies[j].radius + config.collision_margin;
            let pi = bodies[i].position + bodies[i].velocity;
            let pj = bodies[j].position + bodies[j].velocity;
            let mut delta = pi - pj;
            if delta.length_sq() >= min_sep * min_sep {
                continue;
            }
            if delta.length_sq() == 0.0 {
                delta = jiggle(i, j);
            }
            let len = delta.length();
            let overlap = delta * ((min_sep - len) / len * config.collision_strength);

            // heavier (larger) bodies give way less; held bodies not at all
            let (ri, rj) = (bodies[i].radius.powi(2), bodies[j].radius.powi(2));
            let (mut wi, mut wj) = if ri + rj > 0.0 {
                (rj / (ri + rj), ri / (ri + rj))
            } else {
                (0.5, 0.5)
            };
            match (bodies[i].pin.is_free(), bodies[j].pin.is_free()) {
                (true, false) => (wi, wj) = (1.0, 0.0),
                (false, true) => (wi, wj) = (0.0, 1.0),
                (false, false) => continue,
                (true, true) => {}
            }
            bodies[i].velocity += overlap * wi;
            bodies[j].velocity -= overlap * wj;
        }
    }
}

fn integrate(bodies: &mut [Body], config: &LayoutConfig, frames: f64) {
    let c = center(config);
    for (i, body) in bodies.iter_mut().enumerate() {
        if let Some(anchor) = body.pin.anchor() {
            body.position = anchor;
            body.velocity = Vec2::ZERO;
            continue;
        }

        body.velocity *= 1.0 - config.velocity_decay;
        body.velocity = body.velocity.clamp_length(config.max_velocity);
        body.position += body.velocity * frames;

        if !body.position.is_finite() || !body.velocity.is_finite() {
            body.position = c + jiggle(i, i) * 1e3;
            body.velocity = Vec2::ZERO;
        }
    }
}

fn recenter(bodies: &mut [Body], config: &LayoutConfig) {
    if config.center_strength == 0.0 {
        return;
    }
    let (sum, count) = bodies
        .iter()
        .filter(|b| b.pin.is_free())
        .fold((Vec2::ZERO, 0usize), |(sum, count), b| (sum + b.position, count + 1));
    if count == 0 {
        return;
    }
    let centroid = sum * (1.0 / count as f64);
    let shift = (center(config) - centroid) * config.center_strength;
    for body in bodies.iter_mut().filter(|b| b.pin.is_free()) {
        body.position += shift;
    }
}
