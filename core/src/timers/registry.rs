//! Timer registry
//!
//! Owns the ordered set of active timers and drives them once per frame.
//! Timers register themselves on `start()` and leave on finish or cancel.
//! Callbacks fired during a pass may register, cancel or restart any timer;
//! the pass iterates a snapshot taken when it began, so that churn never
//! corrupts it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::scheduler::{FrameDeltas, FrameScheduler};

use super::error::TimerError;
use super::timer::Timer;

#[derive(Default)]
pub(crate) struct RegistryShared {
    /// Active timers in registration order
    timers: RefCell<Vec<Timer>>,
    /// Set while a pass is running
    driving: Cell<bool>,
    /// Completed passes
    frames: Cell<u64>,
}

/// Clears the driving flag even if a callback unwinds out of the pass
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

thread_local! {
    static DEFAULT_REGISTRY: TimerRegistry = TimerRegistry::new();
}

/// Ordered collection of active timers, driven by the host once per frame.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct TimerRegistry {
    shared: Rc<RegistryShared>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-thread default registry for hosts that only ever need one
    pub fn current() -> Self {
        DEFAULT_REGISTRY.with(Clone::clone)
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryShared> {
        Rc::downgrade(&self.shared)
    }

    pub(crate) fn from_weak(weak: &Weak<RegistryShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// Whether both handles refer to the same registry
    pub fn ptr_eq(&self, other: &TimerRegistry) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // ─── Membership ─────────────────────────────────────────────────────────

    /// Add a timer to the active set. Returns false if it was already there.
    ///
    /// Timers belong to the registry they were built with; a timer built
    /// against another registry is rejected.
    pub fn register(&self, timer: &Timer) -> bool {
        if !timer.belongs_to(&self.shared) {
            tracing::warn!(timer = %timer.label(), "Refusing to register timer built for another registry");
            return false;
        }

        let added = {
            let mut timers = self.shared.timers.borrow_mut();
            if timers.iter().any(|t| t.ptr_eq(timer)) {
                false
            } else {
                timers.push(timer.clone());
                true
            }
        };

        timer.set_registered(true);
        if added {
            tracing::trace!(timer = %timer.label(), active = self.len(), "Timer registered");
        }
        added
    }

    /// Remove a timer from the active set. No-op if absent.
    pub fn unregister(&self, timer: &Timer) -> bool {
        let removed = {
            let mut timers = self.shared.timers.borrow_mut();
            let before = timers.len();
            timers.retain(|t| !t.ptr_eq(timer));
            timers.len() != before
        };

        if removed {
            timer.set_registered(false);
            tracing::trace!(timer = %timer.label(), active = self.len(), "Timer unregistered");
        }
        removed
    }

    pub fn contains(&self, timer: &Timer) -> bool {
        self.shared.timers.borrow().iter().any(|t| t.ptr_eq(timer))
    }

    pub fn len(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.timers.borrow().is_empty()
    }

    /// Snapshot of the active timers in registration order
    pub fn timers(&self) -> Vec<Timer> {
        self.shared.timers.borrow().clone()
    }

    /// Number of completed passes
    pub fn frame_count(&self) -> u64 {
        self.shared.frames.get()
    }

    /// Whether a pass is in progress (true only inside callbacks)
    pub fn is_driving(&self) -> bool {
        self.shared.driving.get()
    }

    // ─── Per-frame pass ─────────────────────────────────────────────────────

    pub fn drive(&self, deltas: FrameDeltas) {
        self.drive_all(deltas.scaled, deltas.unscaled);
    }

    /// Advance every timer that was active when the pass began, once each,
    /// in registration order. Scaled timers receive `scaled_delta`, the rest
    /// `unscaled_delta`.
    ///
    /// Timers registered during the pass wait for the next one; timers that
    /// leave the set before their turn are skipped. A nested call from inside
    /// a callback is ignored.
    pub fn drive_all(&self, scaled_delta: f32, unscaled_delta: f32) {
        if self.shared.driving.replace(true) {
            tracing::warn!("Ignoring nested timer pass started from a callback");
            return;
        }
        let _guard = PassGuard(&self.shared.driving);

        let snapshot = self.timers();
        for timer in &snapshot {
            if !timer.is_registered() {
                continue;
            }
            let delta = if timer.is_scaled() {
                scaled_delta
            } else {
                unscaled_delta
            };
            timer.advance(delta);
        }

        self.shared.frames.set(self.shared.frames.get() + 1);
    }

    // ─── Convenience ────────────────────────────────────────────────────────

    /// Fire `callback` once after `duration_secs`.
    ///
    /// The registry's active set is the only owner of the timer; the returned
    /// handle may be dropped, or kept to cancel the event early.
    pub fn register_one_shot_event(
        &self,
        duration_secs: f32,
        callback: impl Fn() + 'static,
        scaled: bool,
    ) -> Result<Timer, TimerError> {
        let timer = Timer::builder(duration_secs)
            .name("one-shot event")
            .scaled(scaled)
            .on_tick(callback)
            .build(self)?;
        timer.start();
        Ok(timer)
    }

    /// Abort every active timer: pause it and drop its callbacks without
    /// firing `on_finished`, then empty the set. Returns how many were
    /// cleared.
    pub fn clear_all(&self) -> usize {
        let timers = std::mem::take(&mut *self.shared.timers.borrow_mut());
        for timer in &timers {
            timer.abort();
        }

        if !timers.is_empty() {
            tracing::debug!(count = timers.len(), "Cleared all timers");
        }
        timers.len()
    }

    // ─── Host scheduler ─────────────────────────────────────────────────────

    /// Hook this registry into the host's frame pipeline.
    /// Returns false if a hook was already installed.
    pub fn install<S: FrameScheduler + ?Sized>(&self, scheduler: &mut S) -> bool {
        let registry = self.downgrade();
        let installed = scheduler.install(Box::new(move |deltas| {
            if let Some(registry) = TimerRegistry::from_weak(&registry) {
                registry.drive(deltas);
            }
        }));

        if installed {
            tracing::debug!("Timer registry installed into frame scheduler");
        }
        installed
    }

    /// Remove the hook. Safe to call when it was never installed.
    pub fn uninstall<S: FrameScheduler + ?Sized>(&self, scheduler: &mut S) -> bool {
        let removed = scheduler.uninstall();
        if removed {
            tracing::debug!("Timer registry removed from frame scheduler");
        }
        removed
    }

    /// Teardown for application shutdown or context changes: abort every
    /// timer, then unhook from the scheduler.
    pub fn shutdown<S: FrameScheduler + ?Sized>(&self, scheduler: &mut S) {
        let cleared = self.clear_all();
        self.uninstall(scheduler);
        tracing::info!(cleared, "Timer registry shut down");
    }
}

impl std::fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("active", &self.len())
            .field("frames", &self.frame_count())
            .field("driving", &self.is_driving())
            .finish()
    }
}
