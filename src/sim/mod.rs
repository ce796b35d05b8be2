//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity list order, physics handle order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod arena;
pub mod collision;
pub mod current;
pub mod entity;
pub mod physics;
pub mod state;
pub mod tick;

pub use ai::{SharkController, nearest_shark};
pub use arena::EntityArena;
pub use collision::{ContactOutcome, Dispatcher};
pub use entity::{
    Bullet, BulletOwner, Direction, Entity, EntityData, EntityId, EntityKind, Hydra, HydraState,
    Raft, Shark, SharkAction, Siren, SirenState, Wood,
};
pub use physics::{
    BodyDef, BodyHandle, BodyState, BodyType, Bounds, CirclePhysics, ContactEvent, ContactPhase,
    PhysicsWorld,
};
pub use state::{GameEvent, LevelState, LevelStatus};
pub use tick::{ExitCode, FireTarget, FrameInput, Simulation};
