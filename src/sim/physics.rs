//! Physics world boundary
//!
//! The simulation talks to rigid-body physics only through `PhysicsWorld`:
//! create and destroy bodies, push velocities in, read poses back, step, and
//! receive contact begin/end events. `CirclePhysics` is the built-in
//! implementation: circles only, deterministic event order.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

/// Opaque physics body reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves
    Static,
    /// Integrated every step
    Dynamic,
}

/// Parameters for a new body
#[derive(Debug, Clone, Copy)]
pub struct BodyDef {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub body_type: BodyType,
    /// Sensors report contacts but are never pushed apart
    pub sensor: bool,
    /// Blocks line-of-sight queries
    pub blocks_sight: bool,
    /// Subject to the world's linear damping
    pub damped: bool,
}

/// Pose read back after a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// Two bodies started or stopped touching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// Axis-aligned world extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Clamp a circle so it stays fully inside
    pub fn clamp_with_radius(&self, point: Vec2, radius: f32) -> Vec2 {
        let lo = self.min + Vec2::splat(radius);
        let hi = (self.max - Vec2::splat(radius)).max(lo);
        point.clamp(lo, hi)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(100.0))
    }
}

/// Rigid-body physics as seen by the simulation
pub trait PhysicsWorld {
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle;

    /// Remove a body. Contacts it was part of vanish without End events.
    fn destroy_body(&mut self, handle: BodyHandle);

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);

    fn set_position(&mut self, handle: BodyHandle, position: Vec2);

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Advance one step and report contact transitions in a stable order
    fn step(&mut self, dt: f32, velocity_iters: u32, position_iters: u32) -> Vec<ContactEvent>;

    /// False if any sight-blocking body crosses the segment
    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool;

    /// Drop every body and resize the world
    fn reset(&mut self, bounds: Bounds);

    fn body_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    body_type: BodyType,
    sensor: bool,
    blocks_sight: bool,
    damped: bool,
}

impl Body {
    fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }
}

/// Circle-only physics with positional overlap resolution
#[derive(Debug, Clone)]
pub struct CirclePhysics {
    bodies: BTreeMap<BodyHandle, Body>,
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    next_handle: u32,
    bounds: Bounds,
    linear_damping: f32,
}

impl CirclePhysics {
    pub fn new(bounds: Bounds, linear_damping: f32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            touching: BTreeSet::new(),
            next_handle: 0,
            bounds,
            linear_damping,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn pair(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
        if a < b { (a, b) } else { (b, a) }
    }

    fn overlapping(a: &Body, b: &Body) -> bool {
        let r = a.radius + b.radius;
        a.position.distance_squared(b.position) <= r * r
    }

    /// Pairs that can interact: at least one side dynamic
    fn candidate_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        let mut pairs = Vec::new();
        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
                    continue;
                };
                if a.is_dynamic() || b.is_dynamic() {
                    pairs.push((ha, hb));
                }
            }
        }
        pairs
    }

    fn solve_velocity(&mut self, ha: BodyHandle, hb: BodyHandle) {
        let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
            return;
        };
        let normal = (b.position - a.position).normalize_or_zero();
        let approach = (a.velocity - b.velocity).dot(normal);
        if approach <= 0.0 || normal == Vec2::ZERO {
            return;
        }
        let (wa, wb) = Self::weights(a, b);
        let impulse = normal * approach;
        if let Some(a) = self.bodies.get_mut(&ha) {
            a.velocity -= impulse * wa;
        }
        if let Some(b) = self.bodies.get_mut(&hb) {
            b.velocity += impulse * wb;
        }
    }

    fn solve_position(&mut self, ha: BodyHandle, hb: BodyHandle) {
        let (Some(a), Some(b)) = (self.bodies.get(&ha), self.bodies.get(&hb)) else {
            return;
        };
        let delta = b.position - a.position;
        let depth = a.radius + b.radius - delta.length();
        if depth <= 0.0 {
            return;
        }
        let normal = delta.try_normalize().unwrap_or(Vec2::X);
        let (wa, wb) = Self::weights(a, b);
        if let Some(a) = self.bodies.get_mut(&ha) {
            a.position -= normal * depth * wa;
        }
        if let Some(b) = self.bodies.get_mut(&hb) {
            b.position += normal * depth * wb;
        }
    }

    /// Share of a correction each side takes
    fn weights(a: &Body, b: &Body) -> (f32, f32) {
        match (a.is_dynamic(), b.is_dynamic()) {
            (true, true) => (0.5, 0.5),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => (0.0, 0.0),
        }
    }
}

impl Default for CirclePhysics {
    fn default() -> Self {
        Self::new(Bounds::default(), 0.0)
    }
}

impl PhysicsWorld for CirclePhysics {
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                position: def.position,
                velocity: def.velocity,
                radius: def.radius,
                body_type: def.body_type,
                sensor: def.sensor,
                blocks_sight: def.blocks_sight,
                damped: def.damped,
            },
        );
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
        self.touching.retain(|&(a, b)| a != handle && b != handle);
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if body.is_dynamic() {
                body.velocity = velocity;
            }
        }
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
        }
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle).map(|b| BodyState {
            position: b.position,
            velocity: b.velocity,
        })
    }

    fn step(&mut self, dt: f32, velocity_iters: u32, position_iters: u32) -> Vec<ContactEvent> {
        let damping = 1.0 / (1.0 + dt * self.linear_damping);
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic() && b.damped) {
            body.velocity *= damping;
        }

        let pairs = self.candidate_pairs();
        let solid: Vec<(BodyHandle, BodyHandle)> = pairs
            .iter()
            .copied()
            .filter(|(ha, hb)| match (self.bodies.get(ha), self.bodies.get(hb)) {
                (Some(a), Some(b)) => !a.sensor && !b.sensor,
                _ => false,
            })
            .collect();

        for _ in 0..velocity_iters {
            for &(ha, hb) in &solid {
                let touching = match (self.bodies.get(&ha), self.bodies.get(&hb)) {
                    (Some(a), Some(b)) => Self::overlapping(a, b),
                    _ => false,
                };
                if touching {
                    self.solve_velocity(ha, hb);
                }
            }
        }

        for body in self.bodies.values_mut().filter(|b| b.is_dynamic()) {
            body.position += body.velocity * dt;
        }

        for _ in 0..position_iters {
            for &(ha, hb) in &solid {
                self.solve_position(ha, hb);
            }
        }

        // Solid bodies stay inside the world; sensors may leave it
        let bounds = self.bounds;
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic() && !b.sensor) {
            let clamped = bounds.clamp_with_radius(body.position, body.radius);
            if clamped.x != body.position.x {
                body.velocity.x = 0.0;
            }
            if clamped.y != body.position.y {
                body.velocity.y = 0.0;
            }
            body.position = clamped;
        }

        let now: BTreeSet<(BodyHandle, BodyHandle)> = pairs
            .into_iter()
            .filter(|(ha, hb)| match (self.bodies.get(ha), self.bodies.get(hb)) {
                (Some(a), Some(b)) => Self::overlapping(a, b),
                _ => false,
            })
            .map(|(a, b)| Self::pair(a, b))
            .collect();

        let mut events = Vec::new();
        for &(a, b) in self.touching.difference(&now) {
            events.push(ContactEvent {
                phase: ContactPhase::End,
                a,
                b,
            });
        }
        for &(a, b) in now.difference(&self.touching) {
            events.push(ContactEvent {
                phase: ContactPhase::Begin,
                a,
                b,
            });
        }
        self.touching = now;
        events
    }

    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        let seg = to - from;
        let len_sq = seg.length_squared();
        self.bodies.values().filter(|b| b.blocks_sight).all(|b| {
            let t = if len_sq <= f32::EPSILON {
                0.0
            } else {
                ((b.position - from).dot(seg) / len_sq).clamp(0.0, 1.0)
            };
            let closest = from + seg * t;
            closest.distance_squared(b.position) >= b.radius * b.radius
        })
    }

    fn reset(&mut self, bounds: Bounds) {
        self.bodies.clear();
        self.touching.clear();
        self.next_handle = 0;
        self.bounds = bounds;
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
