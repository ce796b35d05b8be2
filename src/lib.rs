//! Raft of Theseus - real-time simulation core
//!
//! Core modules:
//! - `sim`: Frame pipeline (entities, currents, AI, contacts, cleanup)
//! - `tuning`: Data-driven game balance
//! - `level`: Level placements and level sources
//! - `platform`: Input abstraction polled once per frame
//! - `audio`: One-way sound/music notifications

pub mod audio;
pub mod error;
pub mod level;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use level::{LevelData, LevelSource};
pub use tuning::Tuning;

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed host timestep (60 Hz, matches the physics step)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Physics step length, independent of render frame rate
    pub const WORLD_STEP: f32 = 1.0 / 60.0;
    /// Constraint solver velocity iterations
    pub const WORLD_VELOCITY_ITERS: u32 = 6;
    /// Constraint solver position iterations
    pub const WORLD_POSITION_ITERS: u32 = 2;

    /// Frames between reaching complete/failed and acting on it
    pub const EXIT_COUNT: u32 = 120;

    /// Level grid tile edge, in world units
    pub const TILE_SIZE: f32 = 3.0;

    /// Speeds below this are treated as pushing into a wall (no move cost)
    pub const MOVE_COST_MIN_SPEED: f32 = 0.15;

    /// Shark controllers only re-evaluate their FSM every N ticks
    pub const AI_THINK_INTERVAL: u64 = 10;
    /// Ticks between patrol heading changes
    pub const PATROL_TURN_INTERVAL: u64 = 120;
}

/// Unit vector from `from` toward `to`, or zero when they coincide
#[inline]
pub fn heading(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Cosine of the angle between two vectors (0 if either is zero)
#[inline]
pub fn cos_between(a: Vec2, b: Vec2) -> f32 {
    let denom = a.length() * b.length();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_zero_when_coincident() {
        assert_eq!(heading(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
        let h = heading(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((h - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_cos_between() {
        assert!((cos_between(Vec2::X, Vec2::X) - 1.0).abs() < 1e-6);
        assert!((cos_between(Vec2::X, -Vec2::X) + 1.0).abs() < 1e-6);
        assert_eq!(cos_between(Vec2::ZERO, Vec2::X), 0.0);
    }
}
