//! Timer system
//!
//! This module provides:
//! - **Timers**: countdown/interval state machines with update, tick and
//!   finished callbacks
//! - **Registry**: the active set, driven once per frame by the host
//! - **Presets**: timer settings loaded from TOML
//!
//! # Timer Kinds
//!
//! One configurable type covers every variant:
//! - Countdown: `tick_count = 1` (the default)
//! - Interval: `tick_count = N`, finishes after N ticks
//! - Repeating: `looping = true`, ticks until cancelled

mod callbacks;
mod error;
mod presets;
mod registry;
mod timer;

#[cfg(test)]
mod registry_tests;

pub use callbacks::{Callback, CallbackId, CallbackList, CallbackSlot};
pub use error::TimerError;
pub use presets::{load_presets, load_presets_from_dir, parse_presets, validate_settings};
pub use registry::TimerRegistry;
pub use timer::{Liveness, Timer, TimerBuilder, WeakTimer};
