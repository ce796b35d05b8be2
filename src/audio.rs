//! Audio notifications
//!
//! The simulation never mixes audio itself. It tells an `AudioSink` which
//! cue to play and which music mode to be in. The only state it reads back
//! is whether the music is currently calm.

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Raft throws a spear
    SpearThrow,
    /// Raft picks up wood
    WoodPickup,
    /// Raft takes damage (shark bite, enemy bullet)
    RaftDamage,
    /// Raft opens a treasure chest
    ChestCollect,
    /// Raft reached the goal
    LevelComplete,
    /// Map overlay toggled
    MapOpen,
    /// Hydra spits a projectile
    HydraSplash,
}

impl SoundEffect {
    /// Asset name of the cue
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::SpearThrow => "spear_throw",
            SoundEffect::WoodPickup => "wood_pickup",
            SoundEffect::RaftDamage => "raft_damage",
            SoundEffect::ChestCollect => "chest_collect",
            SoundEffect::LevelComplete => "level_complete",
            SoundEffect::MapOpen => "map_open",
            SoundEffect::HydraSplash => "hydra_splash",
        }
    }
}

/// Music layer the level is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicMode {
    #[default]
    Calm,
    Danger,
}

/// One-way audio sink driven by the simulation
pub trait AudioSink {
    fn play_sfx(&mut self, effect: SoundEffect);

    /// Select the music preset for the level about to start
    fn set_music_preset(&mut self, preset: u32);

    fn start_level_music(&mut self);

    fn halt_music(&mut self);

    /// Cross-fade between calm and danger layers
    fn trade_music(&mut self, mode: MusicMode);

    /// Whether the calm layer is the one currently audible
    fn is_calm(&self) -> bool;
}

/// Sink that discards everything except the music mode
#[derive(Debug, Default)]
pub struct NullAudio {
    mode: MusicMode,
}

impl AudioSink for NullAudio {
    fn play_sfx(&mut self, _effect: SoundEffect) {}

    fn set_music_preset(&mut self, _preset: u32) {}

    fn start_level_music(&mut self) {
        self.mode = MusicMode::Calm;
    }

    fn halt_music(&mut self) {}

    fn trade_music(&mut self, mode: MusicMode) {
        self.mode = mode;
    }

    fn is_calm(&self) -> bool {
        self.mode == MusicMode::Calm
    }
}

/// Sink that logs every cue (used by the headless runner)
#[derive(Debug, Default)]
pub struct LogAudio {
    preset: u32,
    mode: MusicMode,
}

impl AudioSink for LogAudio {
    fn play_sfx(&mut self, effect: SoundEffect) {
        log::debug!("sfx {}", effect.name());
    }

    fn set_music_preset(&mut self, preset: u32) {
        self.preset = preset;
    }

    fn start_level_music(&mut self) {
        self.mode = MusicMode::Calm;
        log::info!("Music preset {} started", self.preset);
    }

    fn halt_music(&mut self) {
        log::debug!("Music halted");
    }

    fn trade_music(&mut self, mode: MusicMode) {
        log::info!("Music {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    fn is_calm(&self) -> bool {
        self.mode == MusicMode::Calm
    }
}

/// Sink that records cues for assertions
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingAudio {
    pub sfx: Vec<SoundEffect>,
    pub trades: Vec<MusicMode>,
    pub presets: Vec<u32>,
    pub halts: u32,
    mode: MusicMode,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.sfx.iter().filter(|e| **e == effect).count()
    }
}

#[cfg(test)]
impl AudioSink for RecordingAudio {
    fn play_sfx(&mut self, effect: SoundEffect) {
        self.sfx.push(effect);
    }

    fn set_music_preset(&mut self, preset: u32) {
        self.presets.push(preset);
    }

    fn start_level_music(&mut self) {
        self.mode = MusicMode::Calm;
    }

    fn halt_music(&mut self) {
        self.halts += 1;
    }

    fn trade_music(&mut self, mode: MusicMode) {
        self.trades.push(mode);
        self.mode = mode;
    }

    fn is_calm(&self) -> bool {
        self.mode == MusicMode::Calm
    }
}
