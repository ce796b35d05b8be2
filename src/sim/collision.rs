//! Contact resolution
//!
//! The physics layer reports that two bodies started or stopped touching.
//! The dispatcher maps both bodies back to entities, orders the pair by
//! `EntityKind::dispatch_rank` so every rule is written once, and applies the
//! matching rule. Unknown pairs are ignored. A contact that fails to resolve
//! is logged and dropped; it never aborts the frame.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::arena::EntityArena;
use super::current;
use super::entity::{Entity, EntityId, EntityKind};
use super::physics::{Bounds, ContactEvent, ContactPhase};
use super::state::{GameEvent, LevelState};
use crate::audio::{AudioSink, SoundEffect};
use crate::error::SimError;
use crate::tuning::Tuning;

/// What a contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// No rule for this pair (or nothing changed)
    Ignored,
    CurrentEntered,
    CurrentExited,
    /// Player spear killed a shark or siren
    EnemyKilled,
    HydraStunned,
    /// Enemy projectile hit the raft
    PlayerShot,
    /// Bullet stopped by an obstacle or a stunned hydra
    BulletBlocked,
    WoodCollected,
    RaftBitten,
    TreasureCollected,
    GoalReached,
}

/// Everything a contact may touch, borrowed for one batch of events
pub struct Dispatcher<'a> {
    pub arena: &'a mut EntityArena,
    pub level: &'a mut LevelState,
    pub audio: &'a mut dyn AudioSink,
    pub rng: &'a mut Pcg32,
    pub tuning: &'a Tuning,
    pub bounds: Bounds,
}

impl Dispatcher<'_> {
    /// Resolve one physics contact. Errors are logged, never propagated.
    pub fn handle(&mut self, event: &ContactEvent) -> ContactOutcome {
        match self.dispatch(event) {
            Ok(outcome) => {
                if outcome != ContactOutcome::Ignored {
                    log::debug!("{:?} contact -> {:?}", event.phase, outcome);
                }
                outcome
            }
            Err(e) => {
                log::warn!("Dropped {:?} contact: {}", event.phase, e);
                ContactOutcome::Ignored
            }
        }
    }

    /// Map the event's bodies to entities and resolve
    pub fn dispatch(&mut self, event: &ContactEvent) -> Result<ContactOutcome, SimError> {
        let a = self
            .arena
            .entity_for_body(event.a)
            .ok_or(SimError::UnknownBody(event.a))?;
        let b = self
            .arena
            .entity_for_body(event.b)
            .ok_or(SimError::UnknownBody(event.b))?;
        self.resolve(a, b, event.phase)
    }

    /// Resolve a contact between two entities, in either order
    pub fn resolve(
        &mut self,
        a: EntityId,
        b: EntityId,
        phase: ContactPhase,
    ) -> Result<ContactOutcome, SimError> {
        if a == b {
            return Err(SimError::SelfContact(a));
        }
        let kind_a = self.arena.get(a).ok_or(SimError::StaleEntity(a))?.kind();
        let kind_b = self.arena.get(b).ok_or(SimError::StaleEntity(b))?.kind();
        let (first, second) = if kind_a.dispatch_rank() <= kind_b.dispatch_rank() {
            (a, b)
        } else {
            (b, a)
        };

        let tolerance = self.tuning.current.enter_tolerance;
        let contact_damage = self.tuning.shark.contact_damage;
        let level = &mut *self.level;
        let (x, y) = self
            .arena
            .get_pair_mut(first, second)
            .ok_or(SimError::StaleEntity(first))?;

        let outcome = match phase {
            ContactPhase::End => end_contact(first, x, y),
            ContactPhase::Begin if x.is_destroyed() || y.is_destroyed() => ContactOutcome::Ignored,
            ContactPhase::Begin => begin_contact(first, x, y, level, tolerance, contact_damage),
        };
        self.apply_effects(outcome, first, second);
        Ok(outcome)
    }

    /// Follow-up effects that reach outside the pair
    fn apply_effects(&mut self, outcome: ContactOutcome, first: EntityId, second: EntityId) {
        let raft_stats = [first, second]
            .iter()
            .filter_map(|id| self.arena.get(*id))
            .find_map(|e| e.as_raft().map(|r| (r.health, r.stars)));
        match outcome {
            ContactOutcome::EnemyKilled => {
                if let Some(enemy) = self.arena.get(second) {
                    self.level.push_event(GameEvent::EnemyKilled(enemy.kind()));
                }
            }
            ContactOutcome::PlayerShot | ContactOutcome::RaftBitten => {
                self.audio.play_sfx(SoundEffect::RaftDamage);
                if let Some((health, _)) = raft_stats {
                    self.level.push_event(GameEvent::HealthChanged(health));
                }
            }
            ContactOutcome::WoodCollected => {
                self.audio.play_sfx(SoundEffect::WoodPickup);
                if let Some((health, _)) = raft_stats {
                    self.level.push_event(GameEvent::HealthChanged(health));
                }
            }
            ContactOutcome::TreasureCollected => {
                self.audio.play_sfx(SoundEffect::ChestCollect);
                if let Some((_, stars)) = raft_stats {
                    self.level.push_event(GameEvent::StarCollected(stars));
                }
                self.level.add_score(1);
                let position = self.random_position();
                let logs = self.tuning.wood.random_logs;
                self.arena.queue(Entity::wood(position, logs, self.tuning));
            }
            ContactOutcome::GoalReached => self.audio.play_sfx(SoundEffect::LevelComplete),
            _ => {}
        }
    }

    /// Uniform point inside the level bounds
    fn random_position(&mut self) -> Vec2 {
        let t = Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>());
        self.bounds.min + (self.bounds.max - self.bounds.min) * t
    }
}

/// Contact-end rules: only current membership cares
fn end_contact(first: EntityId, x: &mut Entity, y: &mut Entity) -> ContactOutcome {
    if x.kind() == EntityKind::Current && current::exit(y, first) {
        return ContactOutcome::CurrentExited;
    }
    ContactOutcome::Ignored
}

/// Contact-begin rules, `x` being the lower-ranked side
fn begin_contact(
    first: EntityId,
    x: &mut Entity,
    y: &mut Entity,
    level: &mut LevelState,
    tolerance: f32,
    contact_damage: f32,
) -> ContactOutcome {
    match (x.kind(), y.kind()) {
        (EntityKind::Current, _) => {
            if current::enter(y, first, x, tolerance) {
                ContactOutcome::CurrentEntered
            } else {
                ContactOutcome::Ignored
            }
        }
        (EntityKind::Bullet, other) => bullet_contact(x, y, other),
        (EntityKind::Raft, EntityKind::Wood) => {
            let logs = y.as_wood().map_or(0, |w| w.log_count);
            if let Some(raft) = x.as_raft_mut() {
                raft.add_health(f32::from(logs));
            }
            y.set_destroyed(true);
            ContactOutcome::WoodCollected
        }
        (EntityKind::Raft, EntityKind::Shark) => {
            if let Some(raft) = x.as_raft_mut() {
                raft.add_health(-contact_damage);
            }
            y.set_destroyed(true);
            ContactOutcome::RaftBitten
        }
        (EntityKind::Raft, EntityKind::Treasure) => {
            if let Some(raft) = x.as_raft_mut() {
                raft.stars += 1;
            }
            y.set_destroyed(true);
            ContactOutcome::TreasureCollected
        }
        (EntityKind::Raft, EntityKind::Goal) => {
            if level.set_complete() {
                ContactOutcome::GoalReached
            } else {
                ContactOutcome::Ignored
            }
        }
        _ => ContactOutcome::Ignored,
    }
}

fn bullet_contact(bullet: &mut Entity, other: &mut Entity, kind: EntityKind) -> ContactOutcome {
    let Some((player_owned, damage)) = bullet.as_bullet().map(|b| (b.is_player_owned(), b.damage)) else {
        return ContactOutcome::Ignored;
    };
    match kind {
        k if k.is_killable_enemy() && player_owned => {
            other.set_destroyed(true);
            bullet.set_destroyed(true);
            ContactOutcome::EnemyKilled
        }
        EntityKind::Hydra if player_owned => {
            bullet.set_destroyed(true);
            if other.as_hydra_mut().is_some_and(|hydra| hydra.set_hit()) {
                ContactOutcome::HydraStunned
            } else {
                ContactOutcome::BulletBlocked
            }
        }
        EntityKind::Raft if !player_owned => {
            if let Some(raft) = other.as_raft_mut() {
                raft.add_health(-damage);
            }
            bullet.set_destroyed(true);
            ContactOutcome::PlayerShot
        }
        EntityKind::Obstacle => {
            bullet.set_destroyed(true);
            ContactOutcome::BulletBlocked
        }
        _ => ContactOutcome::Ignored,
    }
}
