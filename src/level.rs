//! Level data
//!
//! A level is a tile grid size, a music preset and a list of placements in
//! tile coordinates. `LevelSource` is how the host hands levels to the
//! simulation; the built-in demo level needs no files at all.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_SIZE;
use crate::error::SimError;
use crate::sim::entity::{Direction, Entity, EntityKind};
use crate::sim::physics::Bounds;
use crate::tuning::Tuning;

/// One object placed on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: EntityKind,
    /// Tile column
    pub x: u32,
    /// Tile row
    pub y: u32,
    /// Wood only: 1 or 2
    #[serde(default = "default_log_count")]
    pub log_count: u8,
    /// Current only
    #[serde(default)]
    pub direction: Direction,
}

fn default_log_count() -> u8 {
    1
}

impl Placement {
    pub fn new(kind: EntityKind, x: u32, y: u32) -> Self {
        Self {
            kind,
            x,
            y,
            log_count: default_log_count(),
            direction: Direction::None,
        }
    }

    pub fn wood(x: u32, y: u32, log_count: u8) -> Self {
        Self {
            log_count,
            ..Self::new(EntityKind::Wood, x, y)
        }
    }

    pub fn current(x: u32, y: u32, direction: Direction) -> Self {
        Self {
            direction,
            ..Self::new(EntityKind::Current, x, y)
        }
    }

    /// World-space center of the tile
    pub fn position(&self) -> Vec2 {
        (Vec2::new(self.x as f32, self.y as f32) + Vec2::splat(0.5)) * TILE_SIZE
    }
}

/// Initial layout of a level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
    #[serde(default)]
    pub music_preset: u32,
    pub placements: Vec<Placement>,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let level = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded level '{}' ({}x{}, {} placements) from {}",
            level.name,
            level.width,
            level.height,
            level.placements.len(),
            path.display()
        );
        Ok(level)
    }

    /// World extents
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            Vec2::ZERO,
            Vec2::new(self.width as f32, self.height as f32) * TILE_SIZE,
        )
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidLevel(format!(
                "empty grid {}x{}",
                self.width, self.height
            )));
        }
        let rafts = self
            .placements
            .iter()
            .filter(|p| p.kind == EntityKind::Raft)
            .count();
        match rafts {
            0 => return Err(SimError::MissingPlayer),
            1 => {}
            _ => return Err(SimError::DuplicatePlayer),
        }
        for p in &self.placements {
            if p.x >= self.width || p.y >= self.height {
                return Err(SimError::InvalidLevel(format!(
                    "{:?} at ({}, {}) is off the grid",
                    p.kind, p.x, p.y
                )));
            }
            match p.kind {
                EntityKind::Bullet => {
                    return Err(SimError::InvalidLevel("bullets cannot be placed".into()));
                }
                EntityKind::Wood if !(1..=2).contains(&p.log_count) => {
                    return Err(SimError::InvalidLevel(format!(
                        "wood at ({}, {}) has {} logs",
                        p.x, p.y, p.log_count
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Entities for every placement, in placement order
    pub fn entities(&self, tuning: &Tuning) -> Result<Vec<Entity>, SimError> {
        self.validate()?;
        Ok(self
            .placements
            .iter()
            .filter_map(|p| {
                let at = p.position();
                let entity = match p.kind {
                    EntityKind::Raft => Entity::raft(at, tuning),
                    EntityKind::Shark => Entity::shark(at, tuning),
                    EntityKind::Hydra => Entity::hydra(at, tuning),
                    EntityKind::Siren => Entity::siren(at, tuning),
                    EntityKind::Wood => Entity::wood(at, p.log_count, tuning),
                    EntityKind::Treasure => Entity::treasure(at, tuning),
                    EntityKind::Current => Entity::current(at, p.direction, tuning),
                    EntityKind::Goal => Entity::goal(at, tuning),
                    EntityKind::Obstacle => Entity::obstacle(at, tuning),
                    EntityKind::Bullet => return None,
                };
                Some(entity)
            })
            .collect())
    }

    /// Small hand-made level: a current lane toward the goal with a few
    /// enemies and pickups around it
    pub fn demo() -> Self {
        let mut placements = vec![
            Placement::new(EntityKind::Raft, 1, 5),
            Placement::new(EntityKind::Goal, 14, 5),
            Placement::wood(4, 3, 2),
            Placement::wood(6, 7, 1),
            Placement::new(EntityKind::Treasure, 8, 5),
            Placement::new(EntityKind::Shark, 10, 2),
            Placement::new(EntityKind::Shark, 10, 8),
            Placement::new(EntityKind::Hydra, 12, 8),
            Placement::new(EntityKind::Siren, 7, 1),
            Placement::new(EntityKind::Obstacle, 11, 4),
            Placement::new(EntityKind::Obstacle, 11, 6),
        ];
        placements.extend((3..9).map(|x| Placement::current(x, 5, Direction::East)));
        placements.push(Placement::current(12, 5, Direction::West));
        Self {
            name: "demo".into(),
            width: 16,
            height: 10,
            music_preset: 1,
            placements,
        }
    }
}

/// Where the host gets levels from
pub trait LevelSource {
    fn level_count(&self) -> usize;

    fn load(&self, index: usize) -> Result<LevelData, SimError>;
}

/// Levels held in memory
#[derive(Debug, Clone)]
pub struct LevelSet {
    levels: Vec<LevelData>,
}

impl LevelSet {
    pub fn new(levels: Vec<LevelData>) -> Self {
        Self { levels }
    }

    pub fn demo() -> Self {
        Self::new(vec![LevelData::demo()])
    }
}

impl LevelSource for LevelSet {
    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn load(&self, index: usize) -> Result<LevelData, SimError> {
        self.levels
            .get(index)
            .cloned()
            .ok_or_else(|| SimError::InvalidLevel(format!("no level {index}")))
    }
}

/// Directory of `*.json` level files, ordered by file name
#[derive(Debug, Clone)]
pub struct JsonLevelDir {
    paths: Vec<PathBuf>,
}

impl JsonLevelDir {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SimError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("Found {} levels in {}", paths.len(), dir.as_ref().display());
        Ok(Self { paths })
    }
}

impl LevelSource for JsonLevelDir {
    fn level_count(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<LevelData, SimError> {
        let path = self
            .paths
            .get(index)
            .ok_or_else(|| SimError::InvalidLevel(format!("no level {index}")))?;
        LevelData::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_level_is_valid() {
        let level = LevelData::demo();
        level.validate().unwrap();
        let entities = level.entities(&Tuning::default()).unwrap();
        assert_eq!(entities.len(), level.placements.len());
        assert!(entities.iter().all(|e| level.bounds().contains(e.position)));
    }

    #[test]
    fn test_parse_json_level() {
        let json = r#"{
            "width": 4, "height": 3, "music_preset": 2,
            "placements": [
                { "kind": "Raft", "x": 0, "y": 1 },
                { "kind": "Wood", "x": 1, "y": 1, "log_count": 2 },
                { "kind": "Current", "x": 2, "y": 1, "direction": "North" },
                { "kind": "Goal", "x": 3, "y": 1 }
            ]
        }"#;
        let level = LevelData::from_json(json).unwrap();
        assert_eq!(level.music_preset, 2);
        assert_eq!(level.placements[1].log_count, 2);
        assert_eq!(level.placements[2].direction, Direction::North);
        assert_eq!(level.placements[0].position(), Vec2::new(1.5, 4.5));
        assert_eq!(level.bounds().max, Vec2::new(12.0, 9.0));
    }

    #[test]
    fn test_player_count_enforced() {
        let mut level = LevelData::demo();
        level.placements.retain(|p| p.kind != EntityKind::Raft);
        assert!(matches!(level.validate(), Err(SimError::MissingPlayer)));
        level.placements.push(Placement::new(EntityKind::Raft, 0, 0));
        level.placements.push(Placement::new(EntityKind::Raft, 1, 0));
        assert!(matches!(level.validate(), Err(SimError::DuplicatePlayer)));
    }

    #[test]
    fn test_bad_placements_rejected() {
        let mut level = LevelData::demo();
        level.placements.push(Placement::wood(0, 0, 3));
        assert!(matches!(level.validate(), Err(SimError::InvalidLevel(_))));

        let mut level = LevelData::demo();
        level.placements.push(Placement::new(EntityKind::Goal, 99, 0));
        assert!(matches!(level.validate(), Err(SimError::InvalidLevel(_))));

        let mut level = LevelData::demo();
        level.placements.push(Placement::new(EntityKind::Bullet, 0, 0));
        assert!(matches!(level.entities(&Tuning::default()), Err(SimError::InvalidLevel(_))));
    }

    #[test]
    fn test_level_set_out_of_range() {
        let set = LevelSet::demo();
        assert_eq!(set.level_count(), 1);
        assert!(set.load(0).is_ok());
        assert!(matches!(set.load(1), Err(SimError::InvalidLevel(_))));
    }
}
