pub mod scheduler;
pub mod timers;

// Re-exports for convenience
pub use flextimer_types::{DriverConfig, PresetFile, TimerSettings};
pub use scheduler::{FrameClock, FrameDeltas, FrameHook, FrameScheduler, StagedFrameLoop};
pub use timers::{
    CallbackId, CallbackSlot, Timer, TimerBuilder, TimerError, TimerRegistry, WeakTimer,
};
