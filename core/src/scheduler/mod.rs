//! Host scheduler boundary
//!
//! The registry never reaches into a host's frame pipeline directly. A host
//! implements [`FrameScheduler`] to accept one per-frame hook, and feeds it
//! [`FrameDeltas`] after its own time update. [`FrameClock`] and
//! [`StagedFrameLoop`] are a small reference host used by the driver binary
//! and by tests.

mod clock;
mod frame_loop;
mod hook;

pub use clock::FrameClock;
pub use frame_loop::{StagedFrameLoop, TIMER_STAGE};
pub use hook::{FrameDeltas, FrameHook, FrameScheduler};
