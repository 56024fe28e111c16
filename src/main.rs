//! Festival Sim headless runner
//!
//! Loads a level (or the built-in demo), runs the simulation for a fixed
//! number of frames with the autopilot driving the player, and logs what
//! happened. Rendering and audio hosts consume the same `World` API.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use festival_sim::sim::{Entity, EventSink, GameEvent, TickInput, tick};
use festival_sim::{Level, SimError, Tuning};

#[derive(Debug, Parser)]
#[command(name = "festival-sim", version, about = "Headless festival tent-capture simulation")]
struct Args {
    /// Level JSON file (built-in demo level when omitted)
    #[arg(long)]
    level: Option<PathBuf>,
    /// Tuning overrides JSON file
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Frames to simulate
    #[arg(long, default_value_t = 3600)]
    frames: u64,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = env_logger::Env::default().default_filter_or(level.to_string());
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Stand-in for the audio/presentation hosts
#[derive(Default)]
struct LogSink {
    cues: usize,
    evictions: usize,
    occupations: usize,
}

impl EventSink for LogSink {
    fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Cue(cue) => {
                self.cues += 1;
                log::trace!("cue {cue:?}");
            }
            GameEvent::Occupied { tent } => {
                self.occupations += 1;
                log::debug!("tent {tent} occupied");
            }
            GameEvent::Evicted { tent, goer } => {
                self.evictions += 1;
                log::debug!("goer {goer} evicted from {tent}");
            }
            other => log::debug!("{other:?}"),
        }
    }
}

fn main() -> Result<(), SimError> {
    let args = Args::parse();
    init_logging(args.verbose);
    log::info!("Festival Sim starting...");

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let level = match &args.level {
        Some(path) => Level::load(path)?,
        None => Level::demo(),
    };
    let mut world = level.build_world(tuning)?;

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut sink = LogSink::default();
    for _ in 0..args.frames {
        tick(&mut world, &input);
        world.flush_events(&mut sink);
    }

    let tents: Vec<&Entity> = world
        .tent_ids()
        .into_iter()
        .filter_map(|id| world.get(id))
        .collect();
    let captured = tents.iter().filter(|e| e.tent().is_some_and(|t| t.captured)).count();
    let ruined = tents.iter().filter(|e| e.tent().is_some_and(|t| t.is_ruined())).count();

    log::info!(
        "{} frames: score {}, {}/{} tents captured, {} ruined, {} occupations, {} evictions, {} cues",
        world.frame,
        world.score,
        captured,
        tents.len(),
        ruined,
        sink.occupations,
        sink.evictions,
        sink.cues
    );
    Ok(())
}
