//! Level state
//!
//! Status, countdown and score for the level being played, plus the queue of
//! UI notifications the host drains each frame.

use super::entity::EntityKind;

/// Where the level stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelStatus {
    #[default]
    Running,
    /// Goal reached; counting down to the next level
    Complete,
    /// Raft died; counting down to a reset
    Failed,
}

/// One-way notifications for score/UI sinks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScoreChanged(u64),
    StarCollected(u32),
    HealthChanged(f32),
    EnemyKilled(EntityKind),
    LevelComplete,
    LevelFailed,
    LevelReset,
}

/// Mutable per-level state outside the entity collection
#[derive(Debug, Clone)]
pub struct LevelState {
    pub status: LevelStatus,
    countdown: Option<u32>,
    exit_count: u32,
    pub score: u64,
    /// Frames since load
    pub ticks: u64,
    pub debug: bool,
    pub show_map: bool,
    events: Vec<GameEvent>,
}

impl LevelState {
    pub fn new(exit_count: u32) -> Self {
        Self {
            status: LevelStatus::Running,
            countdown: None,
            exit_count,
            score: 0,
            ticks: 0,
            debug: false,
            show_map: false,
            events: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == LevelStatus::Complete
    }

    pub fn is_failure(&self) -> bool {
        self.status == LevelStatus::Failed
    }

    /// Complete or failed
    pub fn is_terminal(&self) -> bool {
        self.status != LevelStatus::Running
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    /// Mark the level complete. No-op once complete or failed.
    pub fn set_complete(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = LevelStatus::Complete;
        self.countdown = Some(self.exit_count);
        self.events.push(GameEvent::LevelComplete);
        log::info!("Level complete at tick {}", self.ticks);
        true
    }

    /// Mark the level failed. No-op once complete or failed; an already
    /// running countdown is never restarted.
    pub fn set_failure(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = LevelStatus::Failed;
        self.countdown = Some(self.exit_count);
        self.events.push(GameEvent::LevelFailed);
        log::info!("Level failed at tick {}", self.ticks);
        true
    }

    /// Advance the countdown one frame. Returns the terminal status on the
    /// frame it runs out; the countdown is then spent.
    pub fn tick_countdown(&mut self) -> Option<LevelStatus> {
        let remaining = self.countdown.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return None;
        }
        self.countdown = None;
        Some(self.status)
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score += amount;
        self.events.push(GameEvent::ScoreChanged(self.score));
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand queued notifications to the host
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for LevelState {
    fn default() -> Self {
        Self::new(crate::consts::EXIT_COUNT)
    }
}
