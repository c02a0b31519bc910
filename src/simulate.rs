//! Headless frame loop for exercising timer presets
//!
//! Supports two pacing modes:
//! - Accelerated: frames run back to back with a fixed step (default)
//! - Realtime: frames are paced by a tokio interval at the configured fps

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use flextimer_core::{
    FrameClock, FrameScheduler, StagedFrameLoop, Timer, TimerBuilder, TimerError, TimerRegistry,
};
use flextimer_types::{DriverConfig, MIN_FRAME_STEP_SECS, TimerSettings};

/// Counts collected while the loop runs
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub frames: u64,
    pub ticks: u64,
    pub finished: u64,
    pub active_at_end: usize,
    pub game_time: String,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: Cell<u64>,
    finished: Cell<u64>,
}

/// Presets used when no file is given
pub fn demo_presets() -> Vec<TimerSettings> {
    vec![
        TimerSettings {
            name: Some("ability cooldown".to_string()),
            ..TimerSettings::countdown(5.0)
        },
        TimerSettings {
            name: Some("poison".to_string()),
            tick_count: 3,
            ..TimerSettings::countdown(2.0)
        },
        TimerSettings {
            name: Some("regen".to_string()),
            looping: true,
            scaled: false,
            ..TimerSettings::countdown(0.5)
        },
    ]
}

pub struct Simulation {
    registry: TimerRegistry,
    frame_loop: StagedFrameLoop,
    counters: Rc<Counters>,
    timers: Vec<Timer>,
}

impl Simulation {
    /// Build the loop, install the registry and start one timer per preset
    pub fn new(config: &DriverConfig, presets: &[TimerSettings]) -> Result<Self, TimerError> {
        let clock = FrameClock::new(config.time_scale).with_max_delta(config.max_delta_secs);
        let mut frame_loop = StagedFrameLoop::new(clock);
        let registry = TimerRegistry::new();
        registry.install(&mut frame_loop);

        let counters = Rc::new(Counters::default());
        let timers = presets
            .iter()
            .map(|settings| start_logged_timer(&registry, settings, &counters))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            registry,
            frame_loop,
            counters,
            timers,
        })
    }

    /// Run `frames` frames back to back with a fixed step
    pub fn run_accelerated(&mut self, frames: u64, step_secs: f32) {
        for _ in 0..frames {
            self.frame_loop.run_frame(step_secs);
            if self.registry.is_empty() {
                tracing::info!(frame = self.registry.frame_count(), "All timers done");
                break;
            }
        }
    }

    /// Run up to `frames` frames paced by the wall clock. Stops early on
    /// Ctrl-C or once no timers remain.
    pub async fn run_realtime(&mut self, frames: u64, step_secs: f32) {
        let period = Duration::try_from_secs_f32(step_secs)
            .unwrap_or(Duration::ZERO)
            .max(Duration::from_secs_f32(MIN_FRAME_STEP_SECS));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        for _ in 0..frames {
            tokio::select! {
                _ = interval.tick() => {
                    self.frame_loop.run_frame_at(Instant::now());
                }
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
            }

            if self.registry.is_empty() {
                tracing::info!(frame = self.registry.frame_count(), "All timers done");
                break;
            }
        }
    }

    /// Tear down and summarize
    pub fn finish(mut self) -> SimulationReport {
        let active_at_end = self.registry.len();
        let frames = self.registry.frame_count();
        let game_time = self.frame_loop.clock().format_elapsed();

        self.registry.shutdown(&mut self.frame_loop);
        debug_assert!(!self.frame_loop.is_installed());
        for timer in &self.timers {
            tracing::debug!(?timer, "Final timer state");
        }

        SimulationReport {
            frames,
            ticks: self.counters.ticks.get(),
            finished: self.counters.finished.get(),
            active_at_end,
            game_time,
        }
    }
}

fn start_logged_timer(
    registry: &TimerRegistry,
    settings: &TimerSettings,
    counters: &Rc<Counters>,
) -> Result<Timer, TimerError> {
    let name = settings.display_name().to_string();

    let on_tick = {
        let counters = Rc::clone(counters);
        let name = name.clone();
        move || {
            counters.ticks.set(counters.ticks.get() + 1);
            tracing::info!(timer = %name, total_ticks = counters.ticks.get(), "tick");
        }
    };
    let on_finished = {
        let counters = Rc::clone(counters);
        move || {
            counters.finished.set(counters.finished.get() + 1);
            tracing::info!(timer = %name, "finished");
        }
    };

    let timer = TimerBuilder::from_settings(settings.clone())
        .on_tick(on_tick)
        .on_finished(on_finished)
        .build(registry)?;
    timer.start();
    Ok(timer)
}
