//! Frame clock producing scaled and unscaled deltas
//!
//! Supports two ways of advancing:
//! - Wall clock: `tick_at(Instant)` measures the time since the previous frame
//! - Fixed step: `step(dt)` for headless simulation and tests
//!
//! The scaled delta is the unscaled one multiplied by the time scale
//! (1.0 = normal speed, 0.5 = slow motion, 0.0 = paused game time).

use std::time::Instant;

use super::FrameDeltas;

/// Default clamp for a single frame's unscaled delta
const DEFAULT_MAX_DELTA_SECS: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Multiplier applied to the scaled delta
    time_scale: f32,

    /// Largest unscaled delta accepted for one frame (hitches are clamped)
    max_delta_secs: f32,

    /// Instant of the previous `tick_at` call
    last_instant: Option<Instant>,

    /// Accumulated game time
    scaled_elapsed: f64,

    /// Accumulated wall time
    unscaled_elapsed: f64,

    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl FrameClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale: sanitize_scale(time_scale),
            max_delta_secs: DEFAULT_MAX_DELTA_SECS,
            last_instant: None,
            scaled_elapsed: 0.0,
            unscaled_elapsed: 0.0,
            frame: 0,
        }
    }

    /// Clamp each frame's unscaled delta to `max_delta_secs`
    pub fn with_max_delta(mut self, max_delta_secs: f32) -> Self {
        self.set_max_delta(max_delta_secs);
        self
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative or non-finite scales are clamped to 0
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = sanitize_scale(time_scale);
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta_secs
    }

    pub fn set_max_delta(&mut self, max_delta_secs: f32) {
        if max_delta_secs.is_finite() && max_delta_secs > 0.0 {
            self.max_delta_secs = max_delta_secs;
        }
    }

    /// Advance by a fixed step of `dt` wall seconds
    pub fn step(&mut self, dt: f32) -> FrameDeltas {
        let unscaled = if dt.is_finite() && dt > 0.0 {
            dt.min(self.max_delta_secs)
        } else {
            0.0
        };
        let scaled = unscaled * self.time_scale;

        self.unscaled_elapsed += unscaled as f64;
        self.scaled_elapsed += scaled as f64;
        self.frame += 1;

        FrameDeltas::new(scaled, unscaled)
    }

    /// Advance to `now`. The first call yields zero deltas.
    pub fn tick_at(&mut self, now: Instant) -> FrameDeltas {
        let dt = self
            .last_instant
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_instant = Some(now);
        self.step(dt)
    }

    /// Advance using the current wall clock
    pub fn tick(&mut self) -> FrameDeltas {
        self.tick_at(Instant::now())
    }

    /// Game seconds since the clock was created
    pub fn elapsed_secs(&self) -> f64 {
        self.scaled_elapsed
    }

    /// Wall seconds since the clock was created
    pub fn unscaled_elapsed_secs(&self) -> f64 {
        self.unscaled_elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Format game time as MM:SS.ms
    pub fn format_elapsed(&self) -> String {
        let secs = self.scaled_elapsed;
        let mins = (secs / 60.0).floor() as u32;
        let secs_remainder = secs % 60.0;
        format!("{:02}:{:05.2}", mins, secs_remainder)
    }
}

fn sanitize_scale(time_scale: f32) -> f32 {
    if time_scale.is_finite() {
        time_scale.max(0.0)
    } else {
        0.0
    }
}
