//! Entity model
//!
//! Every simulated object is an `Entity`: shared kinematic state plus a
//! variant payload from a closed set. Routing (contacts, AI, cleanup) keys on
//! `EntityKind`, never on dynamic type inspection. Entities never reach into
//! their siblings; cross-entity effects go through the dispatcher and the AI
//! resolvers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::current::ZoneBias;
use super::physics::{BodyDef, BodyHandle, BodyType, Bounds};
use crate::consts::MOVE_COST_MIN_SPEED;
use crate::tuning::{HydraTuning, RaftTuning, SirenTuning, Tuning};

/// Stable, generation-checked handle into the entity arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Discriminant of the entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Raft,
    Bullet,
    Shark,
    Hydra,
    Siren,
    Wood,
    Treasure,
    Current,
    Goal,
    Obstacle,
}

impl EntityKind {
    /// Order in which pair members are normalized before dispatch.
    /// Currents interact with anything, so they sort first; then bullets,
    /// then the raft.
    pub fn dispatch_rank(self) -> u8 {
        match self {
            EntityKind::Current => 0,
            EntityKind::Bullet => 1,
            EntityKind::Raft => 2,
            EntityKind::Shark => 3,
            EntityKind::Hydra => 4,
            EntityKind::Siren => 5,
            EntityKind::Wood => 6,
            EntityKind::Treasure => 7,
            EntityKind::Goal => 8,
            EntityKind::Obstacle => 9,
        }
    }

    /// Whether current zones push this kind around
    pub fn affected_by_current(self) -> bool {
        matches!(
            self,
            EntityKind::Raft | EntityKind::Bullet | EntityKind::Shark | EntityKind::Wood
        )
    }

    /// Hostile kinds a player spear can kill outright
    pub fn is_killable_enemy(self) -> bool {
        matches!(self, EntityKind::Shark | EntityKind::Siren)
    }
}

/// Cardinal direction of a current zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    /// No push at all (testing placeholder)
    #[default]
    None,
}

impl Direction {
    /// Velocity bias for this direction at the given speed
    pub fn vector(self, speed: f32) -> Vec2 {
        match self {
            Direction::North => Vec2::new(0.0, speed),
            Direction::South => Vec2::new(0.0, -speed),
            Direction::East => Vec2::new(speed, 0.0),
            Direction::West => Vec2::new(-speed, 0.0),
            Direction::None => Vec2::ZERO,
        }
    }
}

/// The player's raft
#[derive(Debug, Clone)]
pub struct Raft {
    pub health: f32,
    pub max_health: f32,
    pub stars: u32,
    pub movement_input: Vec2,
    pub firing: bool,
}

impl Raft {
    pub fn new(tuning: &RaftTuning) -> Self {
        Self {
            health: tuning.initial_health,
            max_health: tuning.max_health,
            stars: 0,
            movement_input: Vec2::ZERO,
            firing: false,
        }
    }

    /// Add (or with a negative amount, remove) health, clamped to [0, max]
    pub fn add_health(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        self.health / self.max_health
    }

    /// Distance the raft can still travel before running out of health
    pub fn potential_distance(&self, tuning: &RaftTuning) -> f32 {
        self.health / tuning.move_cost
    }

    /// Velocity after applying this frame's movement input
    pub fn steer(&self, velocity: Vec2, tuning: &RaftTuning, dt: f32) -> Vec2 {
        let steered = if self.movement_input == Vec2::ZERO {
            // Damp toward rest without overshooting
            let speed = velocity.length();
            let reduced = (speed - tuning.damping * speed * dt).max(0.0);
            velocity.normalize_or_zero() * reduced
        } else {
            velocity + self.movement_input * tuning.thrust * dt
        };
        steered.clamp_length_max(tuning.max_speed)
    }

    /// Health spent moving at `velocity` through water flowing at `water`
    pub fn move_cost(&self, velocity: Vec2, water: Vec2, tuning: &RaftTuning, dt: f32) -> f32 {
        if self.movement_input == Vec2::ZERO {
            return 0.0;
        }
        let speed = velocity.length();
        if speed <= MOVE_COST_MIN_SPEED {
            return 0.0;
        }
        let mut cost = tuning.move_cost * speed * dt;
        if water != Vec2::ZERO {
            // +1 moving with the current, -1 against it
            let c = crate::cos_between(velocity, water);
            let with = tuning.with_current;
            let against = tuning.against_current;
            cost *= 1.0 + (with - against) * 0.5 * c + ((with + against) * 0.5 - 1.0) * c * c;
        }
        cost
    }
}

/// Who threw a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletOwner {
    Player,
    Enemy(EntityId),
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub owner: BulletOwner,
    pub damage: f32,
    pub speed: f32,
    pub origin: Vec2,
    pub range: f32,
}

impl Bullet {
    pub fn is_player_owned(&self) -> bool {
        self.owner == BulletOwner::Player
    }
}

/// Discrete action produced by a shark controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharkAction {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
}

#[derive(Debug, Clone, Default)]
pub struct Shark {
    /// Last action resolved
    pub action: SharkAction,
    pub move_vector: Vec2,
    pub enraged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydraState {
    Idle,
    Active,
    Splashing,
    Stunned,
}

/// Stationary ranged attacker
#[derive(Debug, Clone)]
pub struct Hydra {
    pub state: HydraState,
    pub can_see: bool,
    pub in_range: bool,
    hit: bool,
    cooldown: f32,
    stun: f32,
    cooldown_time: f32,
    stun_time: f32,
    firing_range: f32,
}

impl Hydra {
    pub fn new(tuning: &HydraTuning) -> Self {
        Self {
            state: HydraState::Idle,
            can_see: false,
            in_range: false,
            hit: false,
            cooldown: 0.0,
            stun: 0.0,
            cooldown_time: tuning.cooldown,
            stun_time: tuning.stun_time,
            firing_range: tuning.firing_range,
        }
    }

    /// Record this frame's sight line and distance to the player
    pub fn observe(&mut self, distance: f32, can_see: bool) {
        self.can_see = can_see;
        self.in_range = distance <= self.firing_range;
    }

    /// A spear hit; ignored while already stunned
    pub fn set_hit(&mut self) -> bool {
        if self.state == HydraState::Stunned {
            return false;
        }
        self.hit = true;
        true
    }

    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// Advance the state machine one frame
    pub fn decide(&mut self) {
        if self.hit && self.state != HydraState::Stunned {
            self.hit = false;
            self.stun = self.stun_time;
            self.state = HydraState::Stunned;
            return;
        }
        self.state = match self.state {
            HydraState::Idle if self.can_see && self.in_range => HydraState::Active,
            HydraState::Idle => HydraState::Idle,
            HydraState::Active if !self.can_see || !self.in_range => HydraState::Idle,
            HydraState::Active if self.cooldown <= 0.0 => HydraState::Splashing,
            HydraState::Active => HydraState::Active,
            HydraState::Splashing => {
                self.cooldown = self.cooldown_time;
                HydraState::Active
            }
            HydraState::Stunned if self.stun <= 0.0 => HydraState::Active,
            HydraState::Stunned => HydraState::Stunned,
        };
    }

    pub fn will_attack(&self) -> bool {
        self.state == HydraState::Splashing
    }

    fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.state == HydraState::Stunned {
            self.stun = (self.stun - dt).max(0.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenState {
    Idle,
    Singing,
}

/// Passive damage-over-time enemy
#[derive(Debug, Clone)]
pub struct Siren {
    pub state: SirenState,
    /// Seconds left in the current idle/singing phase
    pub(crate) timer: f32,
    attack_timer: f32,
    attacking: bool,
    idle_time: f32,
    singing_time: f32,
    attack_interval: f32,
    attack_range: f32,
    pub attack_damage: f32,
}

impl Siren {
    pub fn new(tuning: &SirenTuning) -> Self {
        Self {
            state: SirenState::Idle,
            timer: tuning.idle_time,
            attack_timer: 0.0,
            attacking: false,
            idle_time: tuning.idle_time,
            singing_time: tuning.singing_time,
            attack_interval: tuning.attack_interval,
            attack_range: tuning.attack_range,
            attack_damage: tuning.attack_damage,
        }
    }

    /// Advance the idle/singing cycle and decide whether to hurt the player
    pub fn decide(&mut self, distance_to_player: f32) {
        if self.timer <= 0.0 {
            (self.state, self.timer) = match self.state {
                SirenState::Idle => (SirenState::Singing, self.singing_time),
                SirenState::Singing => (SirenState::Idle, self.idle_time),
            };
        }
        self.attacking = self.state == SirenState::Singing
            && distance_to_player < self.attack_range
            && self.attack_timer <= 0.0;
        if self.attacking {
            self.attack_timer = self.attack_interval;
        }
    }

    pub fn will_attack(&self) -> bool {
        self.attacking
    }

    fn tick(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
        self.attack_timer = (self.attack_timer - dt).max(0.0);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Wood {
    /// 1 (single log) or 2 (double)
    pub log_count: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Current {
    pub direction: Direction,
    pub speed: f32,
}

impl Current {
    pub fn bias(&self) -> Vec2 {
        self.direction.vector(self.speed)
    }
}

/// Variant payload
#[derive(Debug, Clone)]
pub enum EntityData {
    Raft(Raft),
    Bullet(Bullet),
    Shark(Shark),
    Hydra(Hydra),
    Siren(Siren),
    Wood(Wood),
    Treasure,
    Current(Current),
    Goal,
    Obstacle,
}

/// A simulated game object
#[derive(Debug, Clone)]
pub struct Entity {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Circle-approximate collision envelope
    pub radius: f32,
    destroyed: bool,
    pub(crate) body: Option<BodyHandle>,
    /// Current zones this entity is inside, in enter order
    pub(crate) zones: Vec<ZoneBias>,
    pub data: EntityData,
}

impl Entity {
    pub fn new(position: Vec2, radius: f32, data: EntityData) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            destroyed: false,
            body: None,
            zones: Vec::new(),
            data,
        }
    }

    pub fn raft(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.raft.radius, EntityData::Raft(Raft::new(&tuning.raft)))
    }

    /// A bullet leaving `position` toward `target`
    pub fn bullet(position: Vec2, target: Vec2, owner: BulletOwner, tuning: &Tuning) -> Self {
        let t = &tuning.bullet;
        let mut entity = Self::new(
            position,
            t.radius,
            EntityData::Bullet(Bullet {
                owner,
                damage: t.damage,
                speed: t.speed,
                origin: position,
                range: t.range,
            }),
        );
        entity.velocity = crate::heading(position, target) * t.speed;
        entity
    }

    pub fn shark(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.shark.radius, EntityData::Shark(Shark::default()))
    }

    pub fn hydra(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.hydra.radius, EntityData::Hydra(Hydra::new(&tuning.hydra)))
    }

    pub fn siren(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.siren.radius, EntityData::Siren(Siren::new(&tuning.siren)))
    }

    pub fn wood(position: Vec2, log_count: u8, tuning: &Tuning) -> Self {
        Self::new(position, tuning.wood.radius, EntityData::Wood(Wood { log_count }))
    }

    pub fn treasure(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.statics.treasure_radius, EntityData::Treasure)
    }

    pub fn current(position: Vec2, direction: Direction, tuning: &Tuning) -> Self {
        Self::new(
            position,
            tuning.current.radius,
            EntityData::Current(Current {
                direction,
                speed: tuning.current.speed,
            }),
        )
    }

    pub fn goal(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.statics.goal_radius, EntityData::Goal)
    }

    pub fn obstacle(position: Vec2, tuning: &Tuning) -> Self {
        Self::new(position, tuning.statics.obstacle_radius, EntityData::Obstacle)
    }

    pub fn kind(&self) -> EntityKind {
        match self.data {
            EntityData::Raft(_) => EntityKind::Raft,
            EntityData::Bullet(_) => EntityKind::Bullet,
            EntityData::Shark(_) => EntityKind::Shark,
            EntityData::Hydra(_) => EntityKind::Hydra,
            EntityData::Siren(_) => EntityKind::Siren,
            EntityData::Wood(_) => EntityKind::Wood,
            EntityData::Treasure => EntityKind::Treasure,
            EntityData::Current(_) => EntityKind::Current,
            EntityData::Goal => EntityKind::Goal,
            EntityData::Obstacle => EntityKind::Obstacle,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn set_destroyed(&mut self, value: bool) {
        self.destroyed = value;
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Physics body description for this entity
    pub fn body_def(&self) -> BodyDef {
        let (body_type, sensor) = match self.kind() {
            EntityKind::Raft | EntityKind::Shark => (BodyType::Dynamic, false),
            EntityKind::Bullet | EntityKind::Wood => (BodyType::Dynamic, true),
            EntityKind::Hydra | EntityKind::Siren | EntityKind::Obstacle => (BodyType::Static, false),
            EntityKind::Treasure | EntityKind::Current | EntityKind::Goal => (BodyType::Static, true),
        };
        BodyDef {
            position: self.position,
            velocity: self.velocity,
            radius: self.radius,
            body_type,
            sensor,
            blocks_sight: self.kind() == EntityKind::Obstacle,
            damped: self.kind() != EntityKind::Bullet,
        }
    }

    /// Bullet that left the world or flew past its range
    pub fn is_spent(&self, bounds: &Bounds) -> bool {
        match &self.data {
            EntityData::Bullet(bullet) => {
                !bounds.contains(self.position) || self.position.distance(bullet.origin) > bullet.range
            }
            _ => false,
        }
    }

    /// Per-frame advance of cooldown and stun timers.
    /// Called exactly once per frame by the cleanup pass.
    pub fn update(&mut self, dt: f32) {
        match &mut self.data {
            EntityData::Hydra(hydra) => hydra.tick(dt),
            EntityData::Siren(siren) => siren.tick(dt),
            _ => {}
        }
    }

    pub fn as_raft(&self) -> Option<&Raft> {
        match &self.data {
            EntityData::Raft(raft) => Some(raft),
            _ => None,
        }
    }

    pub fn as_raft_mut(&mut self) -> Option<&mut Raft> {
        match &mut self.data {
            EntityData::Raft(raft) => Some(raft),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match &self.data {
            EntityData::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    pub fn as_shark_mut(&mut self) -> Option<&mut Shark> {
        match &mut self.data {
            EntityData::Shark(shark) => Some(shark),
            _ => None,
        }
    }

    pub fn as_hydra(&self) -> Option<&Hydra> {
        match &self.data {
            EntityData::Hydra(hydra) => Some(hydra),
            _ => None,
        }
    }

    pub fn as_hydra_mut(&mut self) -> Option<&mut Hydra> {
        match &mut self.data {
            EntityData::Hydra(hydra) => Some(hydra),
            _ => None,
        }
    }

    pub fn as_siren_mut(&mut self) -> Option<&mut Siren> {
        match &mut self.data {
            EntityData::Siren(siren) => Some(siren),
            _ => None,
        }
    }

    pub fn as_wood(&self) -> Option<&Wood> {
        match &self.data {
            EntityData::Wood(wood) => Some(wood),
            _ => None,
        }
    }

    pub fn as_current(&self) -> Option<&Current> {
        match &self.data {
            EntityData::Current(current) => Some(current),
            _ => None,
        }
    }
}
