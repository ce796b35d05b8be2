//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here, grouped per
//! object type. Loaded from JSON; missing sections or fields fall back to
//! the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Physics stepping and level flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Physics step length (seconds)
    pub step: f32,
    pub velocity_iters: u32,
    pub position_iters: u32,
    /// Frames to wait after complete/failed before advancing/resetting
    pub exit_count: u32,
    /// Water drag applied by the physics layer to dynamic bodies (not bullets)
    pub linear_damping: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            step: WORLD_STEP,
            velocity_iters: WORLD_VELOCITY_ITERS,
            position_iters: WORLD_POSITION_ITERS,
            exit_count: EXIT_COUNT,
            linear_damping: 6.0,
        }
    }
}

/// Player raft
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaftTuning {
    pub initial_health: f32,
    pub max_health: f32,
    /// Health lost per unit of distance travelled
    pub move_cost: f32,
    /// Move cost multiplier when travelling with the current
    pub with_current: f32,
    /// Move cost multiplier when travelling against the current
    pub against_current: f32,
    pub thrust: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub radius: f32,
}

impl Default for RaftTuning {
    fn default() -> Self {
        Self {
            initial_health: 40.0,
            max_health: 120.0,
            move_cost: 1.5,
            with_current: 0.45,
            against_current: 1.75,
            thrust: 120.0,
            damping: 20.0,
            max_speed: 20.0,
            radius: 1.4,
        }
    }
}

/// Thrown spears
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub speed: f32,
    /// Damage dealt by enemy bullets to the raft
    pub damage: f32,
    /// Health the raft spends per throw
    pub health_cost: f32,
    /// Distance travelled before the bullet falls into the sea
    pub range: f32,
    pub radius: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            speed: 15.0,
            damage: 5.0,
            health_cost: 1.0,
            range: 30.0,
            radius: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharkTuning {
    pub wander_speed: f32,
    pub chase_speed: f32,
    pub attack_speed: f32,
    /// Health the raft loses on contact
    pub contact_damage: f32,
    pub chase_distance: f32,
    pub attack_distance: f32,
    pub radius: f32,
}

impl Default for SharkTuning {
    fn default() -> Self {
        Self {
            wander_speed: 2.5,
            chase_speed: 4.0,
            attack_speed: 8.0,
            contact_damage: 10.0,
            chase_distance: 12.0,
            attack_distance: 5.0,
            radius: 1.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraTuning {
    /// Seconds between shots
    pub cooldown: f32,
    /// Seconds spent stunned after a spear hit
    pub stun_time: f32,
    pub firing_range: f32,
    pub radius: f32,
}

impl Default for HydraTuning {
    fn default() -> Self {
        Self {
            cooldown: 1.5,
            stun_time: 0.5,
            firing_range: 15.0,
            radius: 1.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SirenTuning {
    pub idle_time: f32,
    pub singing_time: f32,
    /// Seconds between damage ticks while singing
    pub attack_interval: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
    pub radius: f32,
}

impl Default for SirenTuning {
    fn default() -> Self {
        Self {
            idle_time: 3.0,
            singing_time: 2.0,
            attack_interval: 0.5,
            attack_damage: 1.0,
            attack_range: 8.0,
            radius: 1.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WoodTuning {
    /// Log count for wood spawned as a treasure reward
    pub random_logs: u8,
    pub radius: f32,
}

impl Default for WoodTuning {
    fn default() -> Self {
        Self {
            random_logs: 2,
            radius: 1.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentTuning {
    /// Velocity bias per physics tick while inside a zone
    pub speed: f32,
    /// Zone envelope radius (half a tile)
    pub radius: f32,
    /// Extra distance tolerated before warning about a mismatched enter
    pub enter_tolerance: f32,
}

impl Default for CurrentTuning {
    fn default() -> Self {
        Self {
            speed: 2.0,
            radius: TILE_SIZE / 2.0,
            enter_tolerance: 0.5,
        }
    }
}

/// Radii for the static pieces of a level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTuning {
    pub treasure_radius: f32,
    pub goal_radius: f32,
    pub obstacle_radius: f32,
}

impl Default for StaticTuning {
    fn default() -> Self {
        Self {
            treasure_radius: 1.0,
            goal_radius: 1.45,
            obstacle_radius: TILE_SIZE / 2.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub raft: RaftTuning,
    pub bullet: BulletTuning,
    pub shark: SharkTuning,
    pub hydra: HydraTuning,
    pub siren: SirenTuning,
    pub wood: WoodTuning,
    pub current: CurrentTuning,
    #[serde(rename = "static")]
    pub statics: StaticTuning,
}

impl Tuning {
    /// Parse a tuning table from JSON
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a tuning table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let tuning = Tuning::from_json(r#"{ "shark": { "contact_damage": 3.0 } }"#).unwrap();
        assert_eq!(tuning.shark.contact_damage, 3.0);
        assert_eq!(tuning.shark.chase_speed, SharkTuning::default().chase_speed);
        assert_eq!(tuning.current.speed, 2.0);
        assert_eq!(tuning.world.velocity_iters, WORLD_VELOCITY_ITERS);
    }

    #[test]
    fn test_static_section_renamed() {
        let tuning = Tuning::from_json(r#"{ "static": { "goal_radius": 2.0 } }"#).unwrap();
        assert_eq!(tuning.statics.goal_radius, 2.0);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(SimError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let mut tuning = Tuning::default();
        tuning.raft.max_health = 99.0;
        let back = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back.raft.max_health, 99.0);
    }
}
