//! Survivors Runtime
//!
//! Headless binary: loads settings, builds the scene and runs fixed ticks
//! with logging collaborators until the player dies or the tick limit is
//! reached.

mod cli;
mod sinks;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use survivors_services::{InputRecording, InputSource, Settings};
use survivors_sim::{KinematicPhysics, Simulation};

fn load_settings(args: &cli::Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(ticks) = args.ticks {
        settings.simulation.max_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        settings.scene.spawner.seed = seed;
    }
    Ok(settings)
}

fn load_recording(path: &Path) -> Result<InputRecording> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read input recording {}", path.display()))?;
    InputRecording::from_json(&text)
        .with_context(|| format!("failed to parse input recording {}", path.display()))
}

fn input_source(args: &cli::Args, settings: &Settings) -> Result<Box<dyn InputSource>> {
    match &args.input {
        Some(path) => {
            let recording = load_recording(path)?;
            tracing::info!(path = %path.display(), frames = recording.len(), "replaying input");
            Ok(Box::new(recording))
        }
        None => {
            let ticks_per_lap = u64::from(settings.simulation.tick_rate_hz) * 8;
            Ok(Box::new(sinks::circling_input(ticks_per_lap)))
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = cli::parse_args();
    tracing::info!("Survivors v{}", survivors_core::VERSION);

    let settings = load_settings(&args)?;
    if let Some(path) = &args.dump_config {
        settings
            .save(path)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        tracing::info!(path = %path.display(), "settings written");
        return Ok(());
    }

    let mut sim = Simulation::from_settings(&settings, Box::new(KinematicPhysics::new()))
        .context("failed to build the simulation")?;
    sim.attach_ui(Box::new(sinks::LogUi));
    sim.attach_camera(Box::new(sinks::LogCamera));

    let mut input = input_source(&args, &settings)?;
    let max_ticks = settings.simulation.max_ticks;

    tracing::info!(max_ticks, "running");
    loop {
        let tick = sim.time().tick_count();
        if max_ticks > 0 && tick >= max_ticks {
            break;
        }
        let report = sim
            .tick(input.poll(tick))
            .with_context(|| format!("tick {tick} failed"))?;
        if report.skipped_commands > 0 || report.failed_systems > 0 {
            tracing::warn!(
                tick,
                skipped_commands = report.skipped_commands,
                failed_systems = report.failed_systems,
                "tick degraded"
            );
        }
        if sim.is_game_over() {
            break;
        }
    }

    let timer = sim.tick_timer();
    let (fastest, slowest) = timer.tick_time_range_ms();
    tracing::info!(
        ticks = sim.time().tick_count(),
        sim_seconds = sim.time().elapsed_secs(),
        entities = sim.world().entity_count(),
        created = sim.counters().get("entities_created"),
        destroyed = sim.counters().get("entities_destroyed"),
        "simulation finished"
    );
    tracing::info!(
        "tick time avg {:.3} ms (min {:.3}, max {:.3}), {:.0} ticks/s",
        timer.tick_time_ms(),
        fastest,
        slowest,
        timer.ticks_per_second()
    );
    Ok(())
}
