//! Headless driver for FlexTimer
//!
//! Runs timer presets through a staged frame loop:
//! - Accelerated mode: frames run back to back with a fixed step (default)
//! - Realtime mode: frames are paced by the wall clock

mod config;
mod logging;
mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flextimer_core::timers::load_presets;

use crate::simulate::Simulation;

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "flextimer")]
#[command(about = "Drive per-frame countdown and interval timers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run presets through a frame loop and log tick/finish events
    Simulate {
        /// Preset TOML file (defaults to a built-in demo set)
        #[arg(short, long)]
        presets: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long)]
        frames: Option<u64>,

        /// Frames per second
        #[arg(long)]
        fps: Option<f32>,

        /// Multiplier applied to scaled timers
        #[arg(long)]
        time_scale: Option<f32>,

        /// Pace frames with the wall clock instead of a fixed step
        #[arg(long)]
        realtime: bool,
    },

    /// Validate a preset file and print a summary
    Check {
        /// Preset TOML file
        path: PathBuf,
    },

    /// Show where driver defaults are stored and their current values
    Config,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Entry Point
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            presets,
            frames,
            fps,
            time_scale,
            realtime,
        } => {
            let config = config::with_overrides(config::load(), frames, fps, time_scale);
            let settings = match presets {
                Some(path) => load_presets(&path)?.timers,
                None => simulate::demo_presets(),
            };

            tracing::info!(
                timers = settings.len(),
                frames = config.frames,
                fps = config.fps,
                time_scale = config.time_scale,
                realtime,
                "Starting simulation"
            );

            let mut simulation = Simulation::new(&config, &settings)?;
            if realtime {
                simulation
                    .run_realtime(config.frames, config.frame_step_secs())
                    .await;
            } else {
                simulation.run_accelerated(config.frames, config.frame_step_secs());
            }

            let report = simulation.finish();
            println!("Frames:    {}", report.frames);
            println!("Game time: {}", report.game_time);
            println!("Ticks:     {}", report.ticks);
            println!("Finished:  {}", report.finished);
            println!("Active:    {}", report.active_at_end);
        }

        Command::Check { path } => {
            let file = load_presets(&path)?;
            println!("{}: {} timer(s)", path.display(), file.timers.len());
            for settings in &file.timers {
                let kind = if settings.looping { "looping" } else { "countdown" };
                let clock = if settings.scaled { "scaled" } else { "unscaled" };
                println!(
                    "  {:<24} {:>7.2}s x {:<3} {} {}",
                    settings.display_name(),
                    settings.duration_secs,
                    settings.tick_count,
                    kind,
                    clock
                );
            }
        }

        Command::Config => {
            match config::path() {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: <no config directory>"),
            }
            let config = config::load();
            println!("  fps            = {}", config.fps);
            println!("  frames         = {}", config.frames);
            println!("  time_scale     = {}", config.time_scale);
            println!("  max_delta_secs = {}", config.max_delta_secs);
        }
    }

    Ok(())
}
