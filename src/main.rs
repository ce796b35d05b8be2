//! Raft of Theseus headless runner
//!
//! Loads tuning and levels, then drives the simulation with a simple
//! autopilot through the fixed-timestep loop. Useful for soak-testing
//! levels and tuning files without a renderer.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::cell::Cell;
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use raft_of_theseus::audio::LogAudio;
    use raft_of_theseus::consts::*;
    use raft_of_theseus::level::{JsonLevelDir, LevelSet};
    use raft_of_theseus::platform::InputProvider;
    use raft_of_theseus::sim::{
        CirclePhysics, EntityKind, ExitCode, FireTarget, FrameInput, GameEvent, Simulation,
    };
    use raft_of_theseus::{LevelData, LevelSource, Tuning};

    #[derive(Parser, Debug)]
    #[command(about = "Run Raft of Theseus levels headlessly with an autopilot", version)]
    struct Args {
        /// Tuning JSON file (built-in defaults if omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Level JSON file, or a directory of level files (demo level if omitted)
        #[arg(long)]
        level: Option<PathBuf>,

        /// Host frames to run before stopping
        #[arg(long, default_value_t = 3600)]
        frames: u64,

        /// RNG seed
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Host frame rate fed into the accumulator
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Frames between autopilot spear throws (0 disables firing)
        #[arg(long, default_value_t = 30)]
        fire_every: u64,

        /// Print the effective tuning as JSON and exit
        #[arg(long)]
        dump_config: bool,
    }

    fn level_source(path: Option<&PathBuf>) -> Result<Box<dyn LevelSource>, Box<dyn std::error::Error>> {
        Ok(match path {
            Some(path) if path.is_dir() => Box::new(JsonLevelDir::open(path)?),
            Some(path) => Box::new(LevelSet::new(vec![LevelData::load(path)?])),
            None => Box::new(LevelSet::demo()),
        })
    }

    fn goal_of(sim: &Simulation<CirclePhysics>) -> Option<Vec2> {
        sim.arena()
            .iter()
            .find(|(_, e)| e.kind() == EntityKind::Goal)
            .map(|(_, e)| e.position)
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        env_logger::init();
        let args = Args::parse();

        let tuning = match &args.config {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };
        if args.dump_config {
            println!("{}", tuning.to_json()?);
            return Ok(());
        }

        let levels = level_source(args.level.as_ref())?;
        if levels.level_count() == 0 {
            return Err("no levels to run".into());
        }

        let mut audio = LogAudio::default();
        let mut index = 0;
        let first = levels.load(index)?;
        let physics = CirclePhysics::new(first.bounds(), tuning.world.linear_damping);
        let mut sim = Simulation::new(first, tuning, physics, args.seed, &mut audio)?;
        log::info!("Raft of Theseus (headless) starting, {} levels", levels.level_count());

        // Shared between the draw callback (writer) and the autopilot (reader)
        let raft_at = Cell::new(Vec2::ZERO);
        let goal_at = Cell::new(goal_of(&sim));
        let frame_no = Cell::new(0u64);
        let fire_every = args.fire_every;

        let mut autopilot = || {
            let frame = frame_no.get();
            let movement = goal_at
                .get()
                .map(|goal| raft_of_theseus::heading(raft_at.get(), goal))
                .unwrap_or(Vec2::ZERO);
            FrameInput {
                movement,
                fire: fire_every > 0 && frame % fire_every == 0,
                fire_target: FireTarget::NearestEnemy,
                ..Default::default()
            }
        };

        let host_dt = 1.0 / args.fps.max(1.0);
        let mut accumulator = 0.0f32;
        let mut completed = 0u32;

        'host: for _ in 0..args.frames {
            accumulator += host_dt.min(0.1);

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = autopilot.poll();
                let exit = sim.frame(&input, &mut audio, &mut |sim: &Simulation<CirclePhysics>| {
                    if let Some(raft) = sim.player_entity() {
                        raft_at.set(raft.position);
                    }
                })?;
                accumulator -= SIM_DT;
                substeps += 1;
                frame_no.set(frame_no.get() + 1);

                for event in sim.drain_events() {
                    match event {
                        GameEvent::LevelComplete => completed += 1,
                        GameEvent::ScoreChanged(score) => log::info!("Score {score}"),
                        GameEvent::EnemyKilled(kind) => log::info!("Killed {kind:?}"),
                        GameEvent::LevelFailed | GameEvent::LevelReset => log::info!("{event:?}"),
                        GameEvent::StarCollected(_) | GameEvent::HealthChanged(_) => {}
                    }
                }

                match exit {
                    None => {}
                    Some(ExitCode::Quit) => break 'host,
                    Some(ExitCode::Settings) => log::info!("Settings requested (no settings screen)"),
                    Some(code @ (ExitCode::Next | ExitCode::Previous)) => {
                        let count = levels.level_count();
                        index = if code == ExitCode::Next {
                            index + 1
                        } else {
                            index + count - 1
                        };
                        if code == ExitCode::Next && index >= count {
                            log::info!("All levels finished");
                            break 'host;
                        }
                        index %= count;
                        sim.load_level(levels.load(index)?, &mut audio)?;
                        goal_at.set(goal_of(&sim));
                        accumulator = 0.0;
                        continue 'host;
                    }
                }
            }
        }

        let health = sim.raft().map(|r| r.health).unwrap_or_default();
        println!(
            "level {} '{}': {} frames, score {}, health {:.1}, {} completed",
            index,
            sim.level().name,
            sim.state().ticks,
            sim.state().score,
            health,
            completed
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; hosts embed it directly
}
