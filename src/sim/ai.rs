//! AI resolvers
//!
//! Sharks take a discrete `SharkAction` from their controller and turn it into
//! a velocity. Hydras and sirens run their own small state machines; the
//! resolvers here feed them the player's position and hand back the effect
//! (a bullet to spawn, damage to apply) for the orchestrator to carry out.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::arena::EntityArena;
use super::entity::{BulletOwner, Entity, EntityId, EntityKind, SharkAction};
use crate::consts::{AI_THINK_INTERVAL, PATROL_TURN_INTERVAL};
use crate::tuning::{SharkTuning, Tuning};

const CARDINALS: [Vec2; 4] = [Vec2::Y, Vec2::NEG_Y, Vec2::X, Vec2::NEG_X];

/// Per-shark decision maker
#[derive(Debug, Clone)]
pub struct SharkController {
    pub shark: EntityId,
    /// Spreads re-evaluation across ticks
    offset: u64,
    state: SharkAction,
}

impl SharkController {
    pub fn new(shark: EntityId, offset: u64) -> Self {
        Self {
            shark,
            offset,
            state: SharkAction::Idle,
        }
    }

    pub fn state(&self) -> SharkAction {
        self.state
    }

    /// Current action; the state machine only moves on think ticks
    pub fn next_action(&mut self, ticks: u64, distance: Option<f32>, tuning: &SharkTuning) -> SharkAction {
        if (ticks + self.offset) % AI_THINK_INTERVAL == 0 {
            self.state = Self::transition(self.state, distance, tuning);
        }
        self.state
    }

    fn transition(state: SharkAction, distance: Option<f32>, tuning: &SharkTuning) -> SharkAction {
        let Some(d) = distance else {
            return SharkAction::Patrol;
        };
        match state {
            SharkAction::Idle => SharkAction::Patrol,
            SharkAction::Patrol if d <= tuning.chase_distance => SharkAction::Chase,
            SharkAction::Patrol => SharkAction::Patrol,
            SharkAction::Chase if d <= tuning.attack_distance => SharkAction::Attack,
            SharkAction::Chase if d > tuning.chase_distance => SharkAction::Patrol,
            SharkAction::Chase => SharkAction::Chase,
            SharkAction::Attack if d > tuning.attack_distance => SharkAction::Chase,
            SharkAction::Attack => SharkAction::Attack,
        }
    }
}

/// Apply a controller action to a shark's velocity
pub fn resolve_shark_action(
    shark: &mut Entity,
    action: SharkAction,
    player: Option<Vec2>,
    ticks: u64,
    rng: &mut Pcg32,
    tuning: &SharkTuning,
) {
    if shark.is_destroyed() {
        return;
    }
    let position = shark.position;
    let Some(data) = shark.as_shark_mut() else {
        return;
    };
    data.action = action;
    let toward_player = player.map(|p| crate::heading(position, p)).unwrap_or(Vec2::ZERO);
    let velocity = match action {
        SharkAction::Idle => {
            data.enraged = false;
            Vec2::ZERO
        }
        SharkAction::Patrol => {
            data.enraged = false;
            if ticks % PATROL_TURN_INTERVAL == 0 || data.move_vector == Vec2::ZERO {
                data.move_vector = CARDINALS[rng.random_range(0..CARDINALS.len())];
            }
            data.move_vector * tuning.wander_speed
        }
        SharkAction::Chase => {
            data.move_vector = toward_player;
            toward_player * tuning.chase_speed
        }
        SharkAction::Attack => {
            data.enraged = true;
            data.move_vector = toward_player;
            toward_player * tuning.attack_speed
        }
    };
    shark.velocity = velocity;
}

/// Run one hydra frame. Returns the bullet to spawn, if it attacks.
pub fn resolve_hydra(
    hydra: &mut Entity,
    id: EntityId,
    player: Vec2,
    can_see: bool,
    tuning: &Tuning,
) -> Option<Entity> {
    if hydra.is_destroyed() {
        return None;
    }
    let position = hydra.position;
    let state = hydra.as_hydra_mut()?;
    state.observe(position.distance(player), can_see);
    state.decide();
    if !state.will_attack() {
        return None;
    }
    Some(Entity::bullet(position, player, BulletOwner::Enemy(id), tuning))
}

/// Run one siren frame. Returns the damage dealt to the player, if any.
pub fn resolve_siren(siren: &mut Entity, player: Vec2) -> Option<f32> {
    if siren.is_destroyed() {
        return None;
    }
    let distance = siren.position.distance(player);
    let state = siren.as_siren_mut()?;
    state.decide(distance);
    state.will_attack().then_some(state.attack_damage)
}

/// Closest live shark to `from`; ties go to the first in list order
pub fn nearest_shark(arena: &EntityArena, from: Vec2) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for (id, entity) in arena.iter() {
        if entity.kind() != EntityKind::Shark || entity.is_destroyed() {
            continue;
        }
        let d = entity.position.distance_squared(from);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((id, d));
        }
    }
    best.map(|(id, _)| id)
}
