//! Frame orchestrator
//!
//! One frame runs three phases in fixed order:
//! - pre-update: toggles, exit requests, reset, countdown
//! - update: player action and enemy AI
//! - post-update: spawn merge, currents, physics step, contacts, move cost,
//!   death check, cleanup, music
//!
//! Exit requests are latched and handed to the host only after the frame's
//! draw callback has run.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ai::{self, SharkController};
use super::arena::EntityArena;
use super::collision::Dispatcher;
use super::current;
use super::entity::{BulletOwner, Entity, EntityId, EntityKind, Raft, SharkAction};
use super::physics::{Bounds, PhysicsWorld};
use super::state::{GameEvent, LevelState, LevelStatus};
use crate::audio::{AudioSink, MusicMode, SoundEffect};
use crate::error::SimError;
use crate::level::LevelData;
use crate::tuning::Tuning;

/// Where a spear should go
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FireTarget {
    /// Explicit aim point (mouse/touch)
    Point(Vec2),
    /// Closest live shark, if any
    #[default]
    NearestEnemy,
}

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Desired movement direction (clamped to unit length)
    pub movement: Vec2,
    pub fire: bool,
    pub fire_target: FireTarget,
    /// Debug overlay toggle
    pub debug: bool,
    /// Map overlay toggle
    pub map: bool,
    pub reset: bool,
    pub exit: bool,
    pub next: bool,
    pub previous: bool,
    pub settings: bool,
}

/// What the host should do after this screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Quit = 0,
    Next = 1,
    Previous = 2,
    Settings = 3,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A running level
pub struct Simulation<P: PhysicsWorld> {
    tuning: Tuning,
    physics: P,
    arena: EntityArena,
    level: LevelData,
    bounds: Bounds,
    player: EntityId,
    state: LevelState,
    sharks: Vec<SharkController>,
    rng: Pcg32,
    pending_exit: Option<ExitCode>,
    was_in_danger: bool,
}

/// Spawn a level's entities; returns the player and one controller per shark
fn populate(
    level: &LevelData,
    tuning: &Tuning,
    physics: &mut impl PhysicsWorld,
    arena: &mut EntityArena,
) -> Result<(EntityId, Vec<SharkController>), SimError> {
    let entities = level.entities(tuning)?;
    let bounds = level.bounds();
    physics.reset(bounds);
    arena.clear();

    let mut player = None;
    let mut sharks = Vec::new();
    for entity in entities {
        let kind = entity.kind();
        let id = arena.spawn(entity, physics);
        match kind {
            EntityKind::Raft => player = Some(id),
            EntityKind::Shark => sharks.push(SharkController::new(id, sharks.len() as u64)),
            _ => {}
        }
    }
    let player = player.ok_or(SimError::MissingPlayer)?;
    Ok((player, sharks))
}

impl<P: PhysicsWorld> Simulation<P> {
    /// Load `level` into `physics` and start its music
    pub fn new(
        level: LevelData,
        tuning: Tuning,
        mut physics: P,
        seed: u64,
        audio: &mut dyn AudioSink,
    ) -> Result<Self, SimError> {
        let mut arena = EntityArena::new();
        let (player, sharks) = populate(&level, &tuning, &mut physics, &mut arena)?;
        let sim = Self {
            bounds: level.bounds(),
            state: LevelState::new(tuning.world.exit_count),
            tuning,
            physics,
            arena,
            level,
            player,
            sharks,
            rng: Pcg32::seed_from_u64(seed),
            pending_exit: None,
            was_in_danger: false,
        };
        sim.start_music(audio);
        Ok(sim)
    }

    /// Replace the current level
    pub fn load_level(&mut self, level: LevelData, audio: &mut dyn AudioSink) -> Result<(), SimError> {
        let (player, sharks) = populate(&level, &self.tuning, &mut self.physics, &mut self.arena)?;
        self.player = player;
        self.sharks = sharks;
        self.bounds = level.bounds();
        self.level = level;
        let undrained = self.state.drain_events();
        self.state = LevelState::new(self.tuning.world.exit_count);
        for event in undrained {
            self.state.push_event(event);
        }
        self.was_in_danger = false;
        self.start_music(audio);
        Ok(())
    }

    /// Reload the current level from its initial layout
    pub fn reset(&mut self, audio: &mut dyn AudioSink) -> Result<(), SimError> {
        self.load_level(self.level.clone(), audio)?;
        self.state.push_event(GameEvent::LevelReset);
        Ok(())
    }

    fn start_music(&self, audio: &mut dyn AudioSink) {
        audio.set_music_preset(self.level.music_preset);
        audio.start_level_music();
        log::info!(
            "Level '{}' loaded: {} entities, {} sharks",
            self.level.name,
            self.arena.len(),
            self.sharks.len()
        );
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut EntityArena {
        &mut self.arena
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.arena.get(self.player)
    }

    pub fn raft(&self) -> Option<&Raft> {
        self.player_entity().and_then(|e| e.as_raft())
    }

    /// Notifications produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Run one frame. The returned exit code, if any, is only produced after
    /// `draw` has seen the frame.
    pub fn frame(
        &mut self,
        input: &FrameInput,
        audio: &mut dyn AudioSink,
        draw: &mut dyn FnMut(&Self),
    ) -> Result<Option<ExitCode>, SimError> {
        if self.pre_update(input, audio)? {
            self.update(input, audio);
            self.post_update(audio);
        }
        draw(self);
        let exit = self.pending_exit.take();
        if let Some(code) = exit {
            log::info!("Exit {:?} ({})", code, code.code());
        }
        Ok(exit)
    }

    /// Toggles, exit requests, reset and countdown. Returns whether the
    /// simulation should advance this frame.
    pub fn pre_update(&mut self, input: &FrameInput, audio: &mut dyn AudioSink) -> Result<bool, SimError> {
        if input.debug {
            self.state.debug = !self.state.debug;
        }
        if input.map {
            self.state.show_map = !self.state.show_map;
            audio.play_sfx(SoundEffect::MapOpen);
        }

        let requested = if input.exit {
            Some(ExitCode::Quit)
        } else if input.next {
            Some(ExitCode::Next)
        } else if input.settings {
            Some(ExitCode::Settings)
        } else if input.previous {
            Some(ExitCode::Previous)
        } else {
            None
        };
        if let Some(code) = requested {
            audio.halt_music();
            self.pending_exit = Some(code);
            return Ok(false);
        }
        if input.reset {
            self.reset(audio)?;
            return Ok(false);
        }

        match self.state.tick_countdown() {
            Some(LevelStatus::Failed) => {
                self.reset(audio)?;
                return Ok(false);
            }
            Some(LevelStatus::Complete) => {
                audio.halt_music();
                self.pending_exit = Some(ExitCode::Next);
                return Ok(false);
            }
            _ => {}
        }
        Ok(!self.state.is_terminal())
    }

    /// Player action and enemy AI
    pub fn update(&mut self, input: &FrameInput, audio: &mut dyn AudioSink) {
        self.state.ticks += 1;
        let ticks = self.state.ticks;
        let dt = self.tuning.world.step;
        let Some(player_pos) = self.player_entity().map(|e| e.position) else {
            log::warn!("Player {:?} missing from arena", self.player);
            return;
        };

        let target = if input.fire {
            match input.fire_target {
                FireTarget::Point(p) => Some(p),
                FireTarget::NearestEnemy => ai::nearest_shark(&self.arena, player_pos)
                    .and_then(|id| self.arena.get(id))
                    .map(|e| e.position),
            }
        } else {
            None
        };
        // A target on the raft itself gives no heading; the spear would never leave
        let target = target.filter(|t| crate::heading(player_pos, *t) != Vec2::ZERO);

        let mut spent = None;
        if let Some(entity) = self.arena.get_mut(self.player) {
            let mut velocity = entity.velocity;
            if let Some(raft) = entity.as_raft_mut() {
                raft.movement_input = input.movement.clamp_length_max(1.0);
                raft.firing = target.is_some();
                velocity = raft.steer(velocity, &self.tuning.raft, dt);
                if target.is_some() {
                    raft.add_health(-self.tuning.bullet.health_cost);
                    spent = Some(raft.health);
                }
            }
            entity.velocity = velocity;
        }
        if let Some(target) = target {
            self.arena
                .queue(Entity::bullet(player_pos, target, BulletOwner::Player, &self.tuning));
            audio.play_sfx(SoundEffect::SpearThrow);
            if let Some(health) = spent {
                self.state.push_event(GameEvent::HealthChanged(health));
            }
        }

        for ctrl in &mut self.sharks {
            let Some(shark) = self.arena.get_mut(ctrl.shark) else {
                continue;
            };
            if shark.is_destroyed() {
                continue;
            }
            let distance = shark.position.distance(player_pos);
            let action = ctrl.next_action(ticks, Some(distance), &self.tuning.shark);
            ai::resolve_shark_action(shark, action, Some(player_pos), ticks, &mut self.rng, &self.tuning.shark);
        }

        for id in self.arena.ids_of(EntityKind::Hydra) {
            let Some(position) = self.arena.get(id).map(|e| e.position) else {
                continue;
            };
            let can_see = self.physics.line_of_sight(position, player_pos);
            let Some(hydra) = self.arena.get_mut(id) else {
                continue;
            };
            if let Some(bullet) = ai::resolve_hydra(hydra, id, player_pos, can_see, &self.tuning) {
                self.arena.queue(bullet);
                audio.play_sfx(SoundEffect::HydraSplash);
            }
        }

        let mut siren_damage = 0.0;
        for id in self.arena.ids_of(EntityKind::Siren) {
            if let Some(damage) = self.arena.get_mut(id).and_then(|s| ai::resolve_siren(s, player_pos)) {
                siren_damage += damage;
            }
        }
        if siren_damage > 0.0 {
            if let Some(raft) = self.arena.get_mut(self.player).and_then(|e| e.as_raft_mut()) {
                raft.add_health(-siren_damage);
                let health = raft.health;
                self.state.push_event(GameEvent::HealthChanged(health));
            }
        }
    }

    /// Spawn merge, physics, contacts, move cost, death check, cleanup, music
    pub fn post_update(&mut self, audio: &mut dyn AudioSink) {
        let step = self.tuning.world.step;

        self.arena.merge_pending(&mut self.physics);

        for id in self.arena.ids() {
            if let Some(entity) = self.arena.get_mut(id) {
                current::apply_tick(entity);
            }
        }

        self.arena.push_to_physics(&mut self.physics);
        let events = self.physics.step(
            step,
            self.tuning.world.velocity_iters,
            self.tuning.world.position_iters,
        );
        self.arena.pull_from_physics(&self.physics);

        let mut dispatcher = Dispatcher {
            arena: &mut self.arena,
            level: &mut self.state,
            audio: &mut *audio,
            rng: &mut self.rng,
            tuning: &self.tuning,
            bounds: self.bounds,
        };
        for event in &events {
            dispatcher.handle(event);
        }

        self.apply_move_cost(step);
        if self.raft().is_some_and(|r| r.is_dead()) {
            self.state.set_failure();
        }

        let removed = self.arena.cleanup(&mut self.physics, &self.bounds, step);
        if !removed.is_empty() {
            log::debug!("Cleanup removed {} entities", removed.len());
        }
        self.sharks.retain(|c| self.arena.contains(c.shark));

        self.resolve_music(audio);
    }

    fn apply_move_cost(&mut self, dt: f32) {
        let tuning = &self.tuning.raft;
        let Some(entity) = self.arena.get_mut(self.player) else {
            return;
        };
        let velocity = entity.velocity;
        let water = current::water_velocity(entity);
        if let Some(raft) = entity.as_raft_mut() {
            let cost = raft.move_cost(velocity, water, tuning, dt);
            if cost > 0.0 {
                raft.add_health(-cost);
            }
        }
    }

    /// Trade between calm and danger music as sharks start or stop attacking
    fn resolve_music(&mut self, audio: &mut dyn AudioSink) {
        let in_danger = self
            .sharks
            .iter()
            .any(|c| c.state() == SharkAction::Attack && self.arena.contains(c.shark));
        if in_danger && !self.was_in_danger && audio.is_calm() {
            audio.trade_music(MusicMode::Danger);
        } else if !in_danger && self.was_in_danger && !audio.is_calm() {
            audio.trade_music(MusicMode::Calm);
        }
        self.was_in_danger = in_danger;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NullAudio, RecordingAudio};
    use crate::level::Placement;
    use crate::sim::collision::ContactOutcome;
    use crate::sim::entity::Direction;
    use crate::sim::physics::{CirclePhysics, ContactPhase};

    fn level(placements: Vec<Placement>) -> LevelData {
        LevelData {
            name: "test".into(),
            width: 12,
            height: 8,
            music_preset: 3,
            placements,
        }
    }

    fn quick_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.world.exit_count = 3;
        tuning
    }

    fn sim_with(
        placements: Vec<Placement>,
        tuning: Tuning,
        audio: &mut dyn AudioSink,
    ) -> Simulation<CirclePhysics> {
        let physics = CirclePhysics::new(Bounds::default(), tuning.world.linear_damping);
        Simulation::new(level(placements), tuning, physics, 9, audio).unwrap()
    }

    fn run(sim: &mut Simulation<CirclePhysics>, input: &FrameInput, audio: &mut dyn AudioSink) -> Option<ExitCode> {
        sim.frame(input, audio, &mut |_| {}).unwrap()
    }

    #[test]
    fn test_load_populates_and_orders_currents_first() {
        let mut audio = RecordingAudio::default();
        let sim = sim_with(
            vec![
                Placement::new(EntityKind::Raft, 1, 1),
                Placement::new(EntityKind::Shark, 5, 5),
                Placement::current(3, 3, Direction::East),
            ],
            quick_tuning(),
            &mut audio,
        );
        let kinds: Vec<EntityKind> = sim.arena().iter().map(|(_, e)| e.kind()).collect();
        assert_eq!(kinds, vec![EntityKind::Current, EntityKind::Raft, EntityKind::Shark]);
        assert_eq!(sim.physics().body_count(), 3);
        assert_eq!(sim.physics().bounds().max, Vec2::new(36.0, 24.0));
        assert_eq!(audio.presets, vec![3]);
        assert_eq!(sim.raft().unwrap().health, sim.tuning().raft.initial_health);
    }

    #[test]
    fn test_missing_player_rejected() {
        let physics = CirclePhysics::default();
        let result = Simulation::new(
            level(vec![Placement::new(EntityKind::Goal, 1, 1)]),
            Tuning::default(),
            physics,
            0,
            &mut NullAudio::default(),
        );
        assert!(matches!(result, Err(SimError::MissingPlayer)));
    }

    #[test]
    fn test_exit_returned_after_draw() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let input = FrameInput {
            exit: true,
            next: true,
            ..Default::default()
        };
        let mut draws = 0;
        let exit = sim
            .frame(&input, &mut audio, &mut |s| {
                draws += 1;
                // Frame not advanced before the draw
                assert_eq!(s.state().ticks, 0);
            })
            .unwrap();
        assert_eq!(draws, 1);
        assert_eq!(exit, Some(ExitCode::Quit));
        assert_eq!(audio.halts, 1);
        // Latch is consumed
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), None);
    }

    #[test]
    fn test_exit_priority() {
        let mut audio = NullAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let cases = [
            (FrameInput { next: true, settings: true, previous: true, ..Default::default() }, ExitCode::Next),
            (FrameInput { settings: true, previous: true, ..Default::default() }, ExitCode::Settings),
            (FrameInput { previous: true, reset: true, ..Default::default() }, ExitCode::Previous),
        ];
        for (input, expected) in cases {
            assert_eq!(run(&mut sim, &input, &mut audio), Some(expected));
        }
        assert_eq!(ExitCode::Previous.code(), 2);
    }

    #[test]
    fn test_raft_collects_wood_through_physics() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(
            vec![Placement::new(EntityKind::Raft, 1, 1), Placement::wood(2, 1, 2)],
            quick_tuning(),
            &mut audio,
        );
        let right = FrameInput {
            movement: Vec2::X,
            ..Default::default()
        };
        for _ in 0..30 {
            run(&mut sim, &right, &mut audio);
        }
        assert!(sim.arena().ids_of(EntityKind::Wood).is_empty());
        assert_eq!(audio.count(SoundEffect::WoodPickup), 1);
        assert_eq!(sim.arena().len(), 1);
        assert_eq!(sim.physics().body_count(), 1);
    }

    #[test]
    fn test_death_fails_once_then_resets() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let player = sim.player();
        sim.arena_mut().get_mut(player).unwrap().as_raft_mut().unwrap().health = 0.0;

        run(&mut sim, &FrameInput::default(), &mut audio);
        assert!(sim.state().is_failure());
        assert_eq!(sim.state().countdown(), Some(3));

        // Frozen while counting down
        run(&mut sim, &FrameInput::default(), &mut audio);
        assert_eq!(sim.state().ticks, 1);
        run(&mut sim, &FrameInput::default(), &mut audio);
        assert!(sim.state().is_failure());
        run(&mut sim, &FrameInput::default(), &mut audio);

        assert_eq!(sim.state().status, LevelStatus::Running);
        assert_eq!(sim.raft().unwrap().health, sim.tuning().raft.initial_health);
        let events = sim.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::LevelFailed).count(), 1);
        assert!(events.contains(&GameEvent::LevelReset));
    }

    #[test]
    fn test_goal_latches_next_after_countdown() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(
            vec![
                Placement::new(EntityKind::Raft, 1, 1),
                Placement::new(EntityKind::Goal, 1, 1),
            ],
            quick_tuning(),
            &mut audio,
        );
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), None);
        assert!(sim.state().is_complete());
        assert_eq!(audio.count(SoundEffect::LevelComplete), 1);
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), None);
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), None);
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), Some(ExitCode::Next));
        assert_eq!(run(&mut sim, &FrameInput::default(), &mut audio), None);
    }

    #[test]
    fn test_fire_at_nearest_shark_tie_goes_to_first() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(
            vec![
                Placement::new(EntityKind::Shark, 5, 6),
                Placement::new(EntityKind::Raft, 5, 3),
                Placement::new(EntityKind::Shark, 5, 0),
            ],
            quick_tuning(),
            &mut audio,
        );
        let fire = FrameInput {
            fire: true,
            ..Default::default()
        };
        run(&mut sim, &fire, &mut audio);
        let bullets = sim.arena().ids_of(EntityKind::Bullet);
        assert_eq!(bullets.len(), 1);
        let bullet = sim.arena().get(bullets[0]).unwrap();
        // First shark in load order sits above the raft
        assert!(bullet.velocity.y > 0.0);
        assert_eq!(audio.count(SoundEffect::SpearThrow), 1);
        let expected = sim.tuning().raft.initial_health - sim.tuning().bullet.health_cost;
        assert!((sim.raft().unwrap().health - expected).abs() < 1e-4);
    }

    #[test]
    fn test_fire_without_target_is_ignored() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let fire = FrameInput {
            fire: true,
            ..Default::default()
        };
        run(&mut sim, &fire, &mut audio);
        assert!(sim.arena().ids_of(EntityKind::Bullet).is_empty());
        assert_eq!(sim.raft().unwrap().health, sim.tuning().raft.initial_health);
    }

    #[test]
    fn test_fire_at_own_position_is_ignored() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let at = sim.player_entity().unwrap().position;
        let fire = FrameInput {
            fire: true,
            fire_target: FireTarget::Point(at),
            ..Default::default()
        };
        for _ in 0..5 {
            run(&mut sim, &fire, &mut audio);
        }
        for _ in 0..60 {
            run(&mut sim, &FrameInput::default(), &mut audio);
        }
        assert!(sim.arena().ids_of(EntityKind::Bullet).is_empty());
        assert_eq!(sim.arena().pending_len(), 0);
        assert_eq!(audio.count(SoundEffect::SpearThrow), 0);
        assert_eq!(sim.raft().unwrap().health, sim.tuning().raft.initial_health);
        assert!(!sim.raft().unwrap().firing);
    }

    #[test]
    fn test_spear_kills_shark() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(
            vec![
                Placement::new(EntityKind::Raft, 1, 1),
                Placement::new(EntityKind::Shark, 4, 1),
            ],
            quick_tuning(),
            &mut audio,
        );
        let fire = FrameInput {
            fire: true,
            ..Default::default()
        };
        run(&mut sim, &fire, &mut audio);
        for _ in 0..90 {
            run(&mut sim, &FrameInput::default(), &mut audio);
        }
        assert!(sim.arena().ids_of(EntityKind::Shark).is_empty());
        assert!(sim.arena().ids_of(EntityKind::Bullet).is_empty());
        assert!(
            sim.drain_events()
                .contains(&GameEvent::EnemyKilled(EntityKind::Shark))
        );
    }

    #[test]
    fn test_music_trades_on_attack() {
        let mut audio = RecordingAudio::default();
        let mut tuning = quick_tuning();
        tuning.shark.wander_speed = 0.0;
        tuning.shark.chase_speed = 0.0;
        tuning.shark.attack_speed = 0.0;
        tuning.shark.attack_distance = 7.0;
        let mut sim = sim_with(
            vec![
                Placement::new(EntityKind::Raft, 1, 1),
                Placement::new(EntityKind::Shark, 3, 1),
            ],
            tuning,
            &mut audio,
        );
        for _ in 0..30 {
            run(&mut sim, &FrameInput::default(), &mut audio);
        }
        assert_eq!(audio.trades, vec![MusicMode::Danger]);

        let shark = sim.arena().ids_of(EntityKind::Shark)[0];
        sim.arena_mut().get_mut(shark).unwrap().set_destroyed(true);
        run(&mut sim, &FrameInput::default(), &mut audio);
        run(&mut sim, &FrameInput::default(), &mut audio);
        assert_eq!(audio.trades, vec![MusicMode::Danger, MusicMode::Calm]);
    }

    #[test]
    fn test_reset_restores_layout() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let start = sim.player_entity().unwrap().position;
        let right = FrameInput {
            movement: Vec2::X,
            ..Default::default()
        };
        for _ in 0..20 {
            run(&mut sim, &right, &mut audio);
        }
        assert!(sim.player_entity().unwrap().position.x > start.x);
        run(
            &mut sim,
            &FrameInput {
                reset: true,
                ..Default::default()
            },
            &mut audio,
        );
        assert_eq!(sim.player_entity().unwrap().position, start);
        assert_eq!(sim.state().ticks, 0);
        assert!(sim.drain_events().contains(&GameEvent::LevelReset));
    }

    #[test]
    fn test_map_toggle() {
        let mut audio = RecordingAudio::default();
        let mut sim = sim_with(vec![Placement::new(EntityKind::Raft, 1, 1)], quick_tuning(), &mut audio);
        let map = FrameInput {
            map: true,
            debug: true,
            ..Default::default()
        };
        run(&mut sim, &map, &mut audio);
        assert!(sim.state().show_map && sim.state().debug);
        run(&mut sim, &map, &mut audio);
        assert!(!sim.state().show_map && !sim.state().debug);
        assert_eq!(audio.count(SoundEffect::MapOpen), 2);
    }

    #[test]
    fn test_current_bias_accumulates_per_tick() {
        let tuning = Tuning::default();
        let mut arena = EntityArena::new();
        let mut state = LevelState::default();
        let mut audio = NullAudio::default();
        let mut rng = Pcg32::seed_from_u64(0);
        let raft = arena.insert(Entity::raft(Vec2::splat(10.0), &tuning));
        let zone = arena.insert(Entity::current(Vec2::splat(10.0), Direction::East, &tuning));

        let mut dispatcher = Dispatcher {
            arena: &mut arena,
            level: &mut state,
            audio: &mut audio,
            rng: &mut rng,
            tuning: &tuning,
            bounds: Bounds::default(),
        };
        assert_eq!(
            dispatcher.resolve(raft, zone, ContactPhase::Begin).unwrap(),
            ContactOutcome::CurrentEntered
        );
        assert_eq!(
            dispatcher.resolve(zone, raft, ContactPhase::Begin).unwrap(),
            ContactOutcome::Ignored
        );
        for tick in 1..=3 {
            current::apply_tick(dispatcher.arena.get_mut(raft).unwrap());
            let vx = dispatcher.arena.get(raft).unwrap().velocity.x;
            assert!((vx - 2.0 * tick as f32).abs() < 1e-6);
        }
        dispatcher.resolve(zone, raft, ContactPhase::End).unwrap();
        current::apply_tick(dispatcher.arena.get_mut(raft).unwrap());
        assert!((dispatcher.arena.get(raft).unwrap().velocity.x - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_run() {
        let script: Vec<FrameInput> = (0..240)
            .map(|i| FrameInput {
                movement: if i % 60 < 40 { Vec2::X } else { Vec2::Y },
                fire: i % 45 == 0,
                ..Default::default()
            })
            .collect();
        let play = || {
            let mut audio = NullAudio::default();
            let tuning = Tuning::default();
            let physics = CirclePhysics::new(Bounds::default(), tuning.world.linear_damping);
            let mut sim = Simulation::new(LevelData::demo(), tuning, physics, 1234, &mut audio).unwrap();
            for input in &script {
                sim.frame(input, &mut audio, &mut |_| {}).unwrap();
            }
            let snapshot: Vec<(EntityKind, Vec2)> =
                sim.arena().iter().map(|(_, e)| (e.kind(), e.position)).collect();
            (snapshot, sim.raft().map(|r| r.health), sim.state().score)
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_no_destroyed_entity_survives_a_frame() {
        let mut audio = NullAudio::default();
        let tuning = Tuning::default();
        let physics = CirclePhysics::new(Bounds::default(), tuning.world.linear_damping);
        let mut sim = Simulation::new(LevelData::demo(), tuning, physics, 5, &mut audio).unwrap();
        let input = FrameInput {
            movement: Vec2::X,
            fire: true,
            ..Default::default()
        };
        for _ in 0..120 {
            sim.frame(&input, &mut audio, &mut |s| {
                assert!(s.arena().iter().all(|(_, e)| !e.is_destroyed()));
                assert_eq!(s.arena().pending_len(), 0);
            })
            .unwrap();
        }
    }
}
