//! Shared configuration types for FlexTimer
//!
//! This crate contains serializable configuration types that are shared between
//! the timer library (flextimer-core) and the frame-loop driver binary.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Timer Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Behavior options for a single timer.
///
/// Callbacks are attached in code; everything else can come from a preset file:
///
/// ```toml
/// [[timers]]
/// name = "regen"
/// duration_secs = 0.5
/// looping = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Label used in logs and CLI output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Duration of one tick in seconds (must be > 0)
    pub duration_secs: f32,

    /// Number of ticks before the timer finishes (ignored when looping)
    #[serde(default = "default_tick_count")]
    pub tick_count: u32,

    /// Tick forever until cancelled
    #[serde(default)]
    pub looping: bool,

    /// Follow the host's scaled delta (false = unscaled wall time)
    #[serde(default = "default_true")]
    pub scaled: bool,
}

impl TimerSettings {
    /// Single countdown of `duration_secs` with default flags
    pub fn countdown(duration_secs: f32) -> Self {
        Self {
            name: None,
            duration_secs,
            tick_count: default_tick_count(),
            looping: false,
            scaled: true,
        }
    }

    /// Label for display, falling back to a placeholder
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Total seconds until a non-looping timer finishes. Computed in f64 so
    /// long runs do not overflow.
    pub fn total_secs(&self) -> f64 {
        let duration = f64::from(self.duration_secs);
        if self.looping {
            duration
        } else {
            duration * f64::from(self.tick_count.max(1))
        }
    }
}

/// Contents of a preset file: a list of `[[timers]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetFile {
    #[serde(default)]
    pub timers: Vec<TimerSettings>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Defaults for the headless frame-loop driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Simulated frames per second
    #[serde(default = "default_fps")]
    pub fps: f32,

    /// Frames to run when none are given on the command line
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// Multiplier applied to the scaled delta (0 = frozen game time)
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// Largest unscaled delta fed into a single frame
    #[serde(default = "default_max_delta_secs")]
    pub max_delta_secs: f32,
}

/// Shortest frame step the driver will run (1000 fps)
pub const MIN_FRAME_STEP_SECS: f32 = 0.001;
/// Longest frame step the driver will run
pub const MAX_FRAME_STEP_SECS: f32 = 60.0;

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            frames: default_frames(),
            time_scale: default_time_scale(),
            max_delta_secs: default_max_delta_secs(),
        }
    }
}

impl DriverConfig {
    /// Fixed frame step derived from `fps`, kept within
    /// [`MIN_FRAME_STEP_SECS`, `MAX_FRAME_STEP_SECS`]
    pub fn frame_step_secs(&self) -> f32 {
        let fps = if self.fps.is_finite() && self.fps > 0.0 { self.fps } else { default_fps() };
        (1.0 / fps).clamp(MIN_FRAME_STEP_SECS, MAX_FRAME_STEP_SECS)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serde Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_tick_count() -> u32 {
    1
}

fn default_fps() -> f32 {
    60.0
}

fn default_frames() -> u64 {
    600
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_max_delta_secs() -> f32 {
    0.25
}
