//! Timer instances (runtime state)
//!
//! A `Timer` is a countdown that resolves one or more ticks of a fixed
//! duration. A single tick is a plain countdown, `tick_count > 1` is an
//! interval timer that finishes after N ticks, and `looping` ticks forever.
//!
//! # Lifecycle
//!
//! 1. Built from a `TimerBuilder` (or `TimerSettings`) → idle, not registered
//! 2. `start()` → registered with its `TimerRegistry` and running
//! 3. The registry calls `advance(delta)` once per frame
//! 4. Ticks exhausted → finished (fires `on_finished`), or `cancel()` →
//!    cancelled (fires nothing). Either way the timer leaves the registry
//!    and drops its callbacks. `start()` re-arms it.
//!
//! `Timer` is a cheap handle; clones refer to the same timer. Callbacks run
//! with no internal borrow held, so they may freely start, cancel or reset
//! any timer, including the one that is firing.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use flextimer_types::TimerSettings;

use super::callbacks::{Callback, CallbackId, CallbackList, CallbackSlot};
use super::error::TimerError;
use super::registry::{RegistryShared, TimerRegistry};

/// Owner liveness query; `false` cancels the timer on its next advance
pub type Liveness = Rc<dyn Fn() -> bool>;

const UNNAMED: &str = "<unnamed>";

pub(crate) struct TimerState {
    name: Option<String>,

    // ─── Configuration ──────────────────────────────────────────────────────
    tick_duration: f32,
    tick_count: u32,
    looping: bool,
    scaled: bool,

    // ─── Progress ───────────────────────────────────────────────────────────
    /// Seconds left in the current tick window (may dip below zero for one
    /// frame before the tick resolves; reads clamp)
    remaining: f32,
    ticks_remaining: u32,
    running: bool,
    registered: bool,

    /// Bumped whenever the window is rewound or the timer is aborted.
    /// `advance` compares it across callback invocations to notice that a
    /// callback reset, restarted or cancelled the timer.
    epoch: u64,

    // ─── Callbacks ──────────────────────────────────────────────────────────
    on_update: CallbackList,
    on_tick: CallbackList,
    on_finished: CallbackList,
    liveness: Option<Liveness>,
}

impl TimerState {
    fn slot(&self, slot: CallbackSlot) -> &CallbackList {
        match slot {
            CallbackSlot::Update => &self.on_update,
            CallbackSlot::Tick => &self.on_tick,
            CallbackSlot::Finished => &self.on_finished,
        }
    }

    fn slot_mut(&mut self, slot: CallbackSlot) -> &mut CallbackList {
        match slot {
            CallbackSlot::Update => &mut self.on_update,
            CallbackSlot::Tick => &mut self.on_tick,
            CallbackSlot::Finished => &mut self.on_finished,
        }
    }

    fn rewind(&mut self) {
        self.remaining = self.tick_duration;
        self.ticks_remaining = self.tick_count;
        self.epoch += 1;
    }

    /// Stop and drop every subscription without invoking any
    fn abort(&mut self) {
        self.running = false;
        self.remaining = self.remaining.max(0.0);
        self.on_update.clear();
        self.on_tick.clear();
        self.on_finished.clear();
        self.epoch += 1;
    }

    fn time_to_tick(&self) -> f32 {
        self.remaining.clamp(0.0, self.tick_duration)
    }

    /// Whole-run length; f64 so `duration * tick_count` cannot overflow
    fn total_secs(&self) -> f64 {
        let duration = f64::from(self.tick_duration);
        if self.looping {
            duration
        } else {
            duration * f64::from(self.tick_count)
        }
    }

    fn time_to_finish(&self) -> f64 {
        if self.looping {
            return f64::from(self.time_to_tick());
        }
        let later_ticks = f64::from(self.ticks_remaining.saturating_sub(1));
        let secs = f64::from(self.time_to_tick()) + later_ticks * f64::from(self.tick_duration);
        secs.clamp(0.0, self.total_secs())
    }
}

struct TimerInner {
    state: RefCell<TimerState>,
    registry: Weak<RegistryShared>,
}

/// Handle to a countdown/interval timer
#[derive(Clone)]
pub struct Timer {
    inner: Rc<TimerInner>,
}

/// Non-owning timer handle, for callbacks that refer back to their own timer
#[derive(Clone)]
pub struct WeakTimer {
    inner: Weak<TimerInner>,
}

impl WeakTimer {
    pub fn upgrade(&self) -> Option<Timer> {
        self.inner.upgrade().map(|inner| Timer { inner })
    }
}

impl Timer {
    /// Start building a timer with the given tick duration (seconds)
    pub fn builder(duration_secs: f32) -> TimerBuilder {
        TimerBuilder::new(duration_secs)
    }

    /// Build a callback-less timer from settings
    pub fn new(registry: &TimerRegistry, settings: TimerSettings) -> Result<Self, TimerError> {
        TimerBuilder::from_settings(settings).build(registry)
    }

    pub fn downgrade(&self) -> WeakTimer {
        WeakTimer {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same timer
    pub fn ptr_eq(&self, other: &Timer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn state(&self) -> Ref<'_, TimerState> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, TimerState> {
        self.inner.state.borrow_mut()
    }

    fn registry(&self) -> Option<TimerRegistry> {
        TimerRegistry::from_weak(&self.inner.registry)
    }

    pub(crate) fn belongs_to(&self, shared: &Rc<RegistryShared>) -> bool {
        std::ptr::eq(self.inner.registry.as_ptr(), Rc::as_ptr(shared))
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        self.state_mut().registered = registered;
    }

    /// Label for logs
    pub fn label(&self) -> String {
        self.state().name.clone().unwrap_or_else(|| UNNAMED.to_string())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Register with the registry (if not already) and start counting.
    ///
    /// A timer that is not registered (new, finished or cancelled) starts from
    /// a fresh window with its full tick count. An already registered timer
    /// simply resumes.
    pub fn start(&self) {
        let fresh = {
            let mut state = self.state_mut();
            let fresh = !state.registered;
            if fresh {
                state.rewind();
            }
            state.running = true;
            fresh
        };

        if !fresh {
            return;
        }

        match self.registry() {
            Some(registry) => {
                registry.register(self);
                tracing::debug!(timer = %self.label(), "Timer started");
            }
            None => {
                tracing::warn!(timer = %self.label(), "Timer registry dropped; timer will not be driven");
            }
        }
    }

    pub fn pause(&self) {
        self.state_mut().running = false;
    }

    pub fn resume(&self) {
        self.state_mut().running = true;
    }

    /// Pause and rewind to a fresh window with the full tick count.
    /// Registration is untouched.
    pub fn reset(&self) {
        let mut state = self.state_mut();
        state.running = false;
        state.rewind();
    }

    /// Like [`reset`](Self::reset), replacing the tick duration.
    /// An invalid duration is rejected and the timer is left as it was.
    pub fn reset_with(&self, duration_secs: f32) -> Result<(), TimerError> {
        let duration = TimerError::check_duration(duration_secs)?;
        let mut state = self.state_mut();
        state.tick_duration = duration;
        state.running = false;
        state.rewind();
        Ok(())
    }

    /// Reset, then start counting immediately
    pub fn restart(&self) {
        self.reset();
        self.start();
    }

    /// Reset with a new duration, then start counting immediately
    pub fn restart_with(&self, duration_secs: f32) -> Result<(), TimerError> {
        self.reset_with(duration_secs)?;
        self.start();
        Ok(())
    }

    /// Stop, leave the registry and drop every callback without invoking any
    pub fn cancel(&self) {
        let was_registered = {
            let mut state = self.state_mut();
            state.abort();
            state.registered
        };

        if was_registered {
            self.leave_registry();
            tracing::debug!(timer = %self.label(), "Timer cancelled");
        }
    }

    /// Cancellation performed by `TimerRegistry::clear_all`, which empties its
    /// collection itself.
    pub(crate) fn abort(&self) {
        let mut state = self.state_mut();
        state.abort();
        state.registered = false;
    }

    fn leave_registry(&self) {
        match self.registry() {
            Some(registry) => {
                registry.unregister(self);
            }
            None => self.set_registered(false),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Per-frame update
    // ═══════════════════════════════════════════════════════════════════════

    /// Advance by one frame's delta (seconds). Normally called by
    /// `TimerRegistry::drive_all`.
    ///
    /// Resolves at most one tick per call; excess delta beyond the tick
    /// boundary is dropped rather than carried into the next window.
    pub fn advance(&self, delta: f32) {
        if !self.owner_alive() {
            tracing::debug!(timer = %self.label(), "Timer owner gone");
            self.cancel();
            return;
        }

        let delta = if delta.is_finite() && delta > 0.0 { delta } else { 0.0 };

        let epoch = {
            let state = self.state();
            if !state.running {
                return;
            }
            state.epoch
        };

        self.emit(CallbackSlot::Update);

        let crossed = {
            let mut state = self.state_mut();
            if !state.running || state.epoch != epoch {
                return;
            }
            state.remaining -= delta;
            state.remaining <= 0.0
        };

        if !crossed {
            return;
        }

        self.emit(CallbackSlot::Tick);

        let exhausted = {
            let mut state = self.state_mut();
            if state.epoch != epoch {
                // A tick callback reset, restarted or cancelled this timer
                return;
            }
            if !state.looping {
                state.ticks_remaining = state.ticks_remaining.saturating_sub(1);
            }
            let exhausted = !state.looping && state.ticks_remaining == 0;
            state.remaining = if exhausted { 0.0 } else { state.tick_duration };
            exhausted
        };

        if exhausted {
            self.finish();
        } else {
            tracing::trace!(
                timer = %self.label(),
                ticks_remaining = self.ticks_remaining(),
                "Timer ticked"
            );
        }
    }

    /// Natural end: leave the registry, fire `on_finished`, then drop every
    /// subscription, including any added from inside `on_finished`.
    fn finish(&self) {
        self.state_mut().running = false;
        self.leave_registry();
        tracing::debug!(timer = %self.label(), "Timer finished");

        self.emit(CallbackSlot::Finished);

        let mut state = self.state_mut();
        state.on_update.clear();
        state.on_tick.clear();
        state.on_finished.clear();
    }

    /// Invoke one slot. Each callback is re-checked right before it runs, so
    /// one that was unsubscribed (or cleared by cancel) earlier in the same
    /// emission never fires.
    fn emit(&self, slot: CallbackSlot) {
        let callbacks = self.state().slot(slot).snapshot();
        for (id, callback) in callbacks {
            let live = self.state().slot(slot).contains(id);
            if live {
                callback();
            }
        }
    }

    fn owner_alive(&self) -> bool {
        let Some(liveness) = self.state().liveness.clone() else {
            return true;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| liveness())) {
            Ok(alive) => alive,
            Err(_) => {
                tracing::warn!(timer = %self.label(), "Liveness check panicked; treating owner as gone");
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subscriptions
    // ═══════════════════════════════════════════════════════════════════════

    /// Fires every advance while running, before tick resolution
    pub fn on_update(&self, callback: impl Fn() + 'static) -> CallbackId {
        self.subscribe(CallbackSlot::Update, Rc::new(callback))
    }

    /// Fires each time a tick boundary is crossed
    pub fn on_tick(&self, callback: impl Fn() + 'static) -> CallbackId {
        self.subscribe(CallbackSlot::Tick, Rc::new(callback))
    }

    /// Fires once when a non-looping timer exhausts its ticks
    pub fn on_finished(&self, callback: impl Fn() + 'static) -> CallbackId {
        self.subscribe(CallbackSlot::Finished, Rc::new(callback))
    }

    pub fn subscribe(&self, slot: CallbackSlot, callback: Callback) -> CallbackId {
        self.state_mut().slot_mut(slot).subscribe_shared(callback)
    }

    /// Remove a subscription from whichever slot holds it
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        let mut state = self.state_mut();
        state.on_update.unsubscribe(id)
            || state.on_tick.unsubscribe(id)
            || state.on_finished.unsubscribe(id)
    }

    pub fn subscriber_count(&self, slot: CallbackSlot) -> usize {
        self.state().slot(slot).len()
    }

    /// Cancel automatically once `alive` reports false
    pub fn set_liveness(&self, alive: impl Fn() -> bool + 'static) {
        self.state_mut().liveness = Some(Rc::new(alive));
    }

    /// Cancel automatically once `owner` has been dropped
    pub fn attach_to<T: 'static>(&self, owner: &Rc<T>) {
        let owner = Rc::downgrade(owner);
        self.set_liveness(move || owner.strong_count() > 0);
    }

    pub fn clear_liveness(&self) {
        self.state_mut().liveness = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn name(&self) -> Option<String> {
        self.state().name.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Whether the timer is in its registry's active set
    pub fn is_registered(&self) -> bool {
        self.state().registered
    }

    pub fn is_looping(&self) -> bool {
        self.state().looping
    }

    /// Whether the timer follows the scaled (game) delta
    pub fn is_scaled(&self) -> bool {
        self.state().scaled
    }

    pub fn tick_duration(&self) -> f32 {
        self.state().tick_duration
    }

    pub fn tick_count(&self) -> u32 {
        self.state().tick_count
    }

    pub fn ticks_remaining(&self) -> u32 {
        self.state().ticks_remaining
    }

    /// Seconds until the next tick, in [0, tick_duration]
    pub fn time_to_tick(&self) -> f32 {
        self.state().time_to_tick()
    }

    /// Remaining share of the current window: 1.0 fresh, 0.0 at the boundary
    pub fn time_to_tick_normalized(&self) -> f32 {
        let state = self.state();
        (state.time_to_tick() / state.tick_duration).clamp(0.0, 1.0)
    }

    /// Seconds elapsed in the current window, in [0, tick_duration]
    pub fn tick_progress(&self) -> f32 {
        let state = self.state();
        (state.tick_duration - state.time_to_tick()).clamp(0.0, state.tick_duration)
    }

    /// Elapsed share of the current window: 0.0 fresh, 1.0 at the boundary
    pub fn tick_progress_normalized(&self) -> f32 {
        1.0 - self.time_to_tick_normalized()
    }

    /// Seconds until the timer finishes, counting the ticks still to come.
    /// Looping timers never finish and report the current window instead.
    /// Saturates at `f32::MAX` for runs longer than an `f32` can hold.
    pub fn time_to_finish(&self) -> f32 {
        self.state().time_to_finish().min(f64::from(f32::MAX)) as f32
    }

    /// Share of the whole run still ahead, in [0, 1]
    pub fn time_to_finish_normalized(&self) -> f32 {
        let state = self.state();
        (state.time_to_finish() / state.total_secs()).clamp(0.0, 1.0) as f32
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Timer {}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Timer")
            .field("name", &state.name.as_deref().unwrap_or(UNNAMED))
            .field("tick_duration", &state.tick_duration)
            .field("remaining", &state.time_to_tick())
            .field("ticks_remaining", &state.ticks_remaining)
            .field("running", &state.running)
            .field("registered", &state.registered)
            .field("looping", &state.looping)
            .field("scaled", &state.scaled)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════

/// Configures a timer before it is bound to a registry
///
/// ```ignore
/// let timer = Timer::builder(2.0)
///     .tick_count(3)
///     .on_tick(|| println!("damage"))
///     .build(&registry)?;
/// timer.start();
/// ```
pub struct TimerBuilder {
    settings: TimerSettings,
    on_update: CallbackList,
    on_tick: CallbackList,
    on_finished: CallbackList,
    liveness: Option<Liveness>,
}

impl TimerBuilder {
    pub fn new(duration_secs: f32) -> Self {
        Self::from_settings(TimerSettings::countdown(duration_secs))
    }

    pub fn from_settings(settings: TimerSettings) -> Self {
        Self {
            settings,
            on_update: CallbackList::new(),
            on_tick: CallbackList::new(),
            on_finished: CallbackList::new(),
            liveness: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Ticks before finishing (ignored when looping)
    pub fn tick_count(mut self, tick_count: u32) -> Self {
        self.settings.tick_count = tick_count;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.settings.looping = looping;
        self
    }

    /// Follow the scaled delta (default) or unscaled wall time
    pub fn scaled(mut self, scaled: bool) -> Self {
        self.settings.scaled = scaled;
        self
    }

    pub fn on_update(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_update.subscribe(callback);
        self
    }

    pub fn on_tick(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_tick.subscribe(callback);
        self
    }

    pub fn on_finished(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_finished.subscribe(callback);
        self
    }

    pub fn alive_while(mut self, alive: impl Fn() -> bool + 'static) -> Self {
        self.liveness = Some(Rc::new(alive));
        self
    }

    /// Cancel the timer once `owner` has been dropped
    pub fn attached_to<T: 'static>(self, owner: &Rc<T>) -> Self {
        let owner = Rc::downgrade(owner);
        self.alive_while(move || owner.strong_count() > 0)
    }

    /// Validate settings and bind the timer to `registry` (not started)
    pub fn build(self, registry: &TimerRegistry) -> Result<Timer, TimerError> {
        let tick_duration = TimerError::check_duration(self.settings.duration_secs)?;
        let tick_count = if self.settings.looping {
            self.settings.tick_count.max(1)
        } else {
            TimerError::check_tick_count(self.settings.tick_count)?
        };

        let state = TimerState {
            name: self.settings.name,
            tick_duration,
            tick_count,
            looping: self.settings.looping,
            scaled: self.settings.scaled,
            remaining: tick_duration,
            ticks_remaining: tick_count,
            running: false,
            registered: false,
            epoch: 0,
            on_update: self.on_update,
            on_tick: self.on_tick,
            on_finished: self.on_finished,
            liveness: self.liveness,
        };

        Ok(Timer {
            inner: Rc::new(TimerInner {
                state: RefCell::new(state),
                registry: registry.downgrade(),
            }),
        })
    }
}
