//! Reference host pipeline
//!
//! A frame is a time update followed by an ordered list of named stages.
//! The timer hook lives in its own slot that runs right after the time
//! update, so gameplay stages added by the host observe timers that have
//! already been advanced this frame. Host stages never share that slot,
//! whatever they are named.

use std::time::Instant;

use super::{FrameClock, FrameDeltas, FrameHook, FrameScheduler};

/// Name reported for the timer hook by [`StagedFrameLoop::stage_names`]
pub const TIMER_STAGE: &str = "flextimer";

struct Stage {
    name: String,
    system: FrameHook,
}

/// Ordered per-frame pipeline driven by a [`FrameClock`]
pub struct StagedFrameLoop {
    clock: FrameClock,
    timer_hook: Option<FrameHook>,
    stages: Vec<Stage>,
}

impl Default for StagedFrameLoop {
    fn default() -> Self {
        Self::new(FrameClock::default())
    }
}

impl StagedFrameLoop {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            timer_hook: None,
            stages: Vec::new(),
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// Append a host stage, run after every stage added before it
    pub fn add_stage(&mut self, name: impl Into<String>, system: impl FnMut(FrameDeltas) + 'static) {
        self.stages.push(Stage {
            name: name.into(),
            system: Box::new(system),
        });
    }

    /// Remove every host stage with this name. The timer hook is only
    /// removed through [`FrameScheduler::uninstall`].
    pub fn remove_stage(&mut self, name: &str) -> bool {
        let before = self.stages.len();
        self.stages.retain(|stage| stage.name != name);
        self.stages.len() != before
    }

    /// Stages in run order, with the timer hook (if installed) first
    pub fn stage_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.stages.len() + 1);
        if self.timer_hook.is_some() {
            names.push(TIMER_STAGE);
        }
        names.extend(self.stages.iter().map(|stage| stage.name.as_str()));
        names
    }

    /// Run one frame with a fixed wall-clock step
    pub fn run_frame(&mut self, dt: f32) -> FrameDeltas {
        let deltas = self.clock.step(dt);
        self.run_stages(deltas);
        deltas
    }

    /// Run one frame measured against the wall clock
    pub fn run_frame_at(&mut self, now: Instant) -> FrameDeltas {
        let deltas = self.clock.tick_at(now);
        self.run_stages(deltas);
        deltas
    }

    fn run_stages(&mut self, deltas: FrameDeltas) {
        if let Some(hook) = self.timer_hook.as_mut() {
            hook(deltas);
        }
        for stage in &mut self.stages {
            (stage.system)(deltas);
        }
    }
}

impl FrameScheduler for StagedFrameLoop {
    fn install(&mut self, hook: FrameHook) -> bool {
        if self.timer_hook.is_some() {
            return false;
        }
        self.timer_hook = Some(hook);
        true
    }

    fn uninstall(&mut self) -> bool {
        self.timer_hook.take().is_some()
    }

    fn is_installed(&self) -> bool {
        self.timer_hook.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_timer_hook_runs_before_host_stages() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = StagedFrameLoop::default();

        let log = Rc::clone(&order);
        frame_loop.add_stage("update", move |_| log.borrow_mut().push("update"));

        let log = Rc::clone(&order);
        assert!(frame_loop.install(Box::new(move |_| log.borrow_mut().push("timers"))));

        frame_loop.run_frame(0.016);
        assert_eq!(*order.borrow(), vec!["timers", "update"]);
        assert_eq!(frame_loop.stage_names(), vec![TIMER_STAGE, "update"]);
    }

    #[test]
    fn test_install_is_exclusive_and_uninstall_idempotent() {
        let mut frame_loop = StagedFrameLoop::default();

        assert!(!frame_loop.uninstall());
        assert!(frame_loop.install(Box::new(|_| {})));
        assert!(!frame_loop.install(Box::new(|_| {})));
        assert_eq!(frame_loop.stage_names().len(), 1);

        assert!(frame_loop.uninstall());
        assert!(!frame_loop.uninstall());
        assert!(!frame_loop.is_installed());
    }

    #[test]
    fn test_stages_receive_clock_deltas() {
        let seen = Rc::new(RefCell::new(None));
        let mut frame_loop = StagedFrameLoop::new(FrameClock::new(0.5));

        let sink = Rc::clone(&seen);
        frame_loop.add_stage("probe", move |deltas| *sink.borrow_mut() = Some(deltas));

        let deltas = frame_loop.run_frame(0.2);
        assert_eq!(*seen.borrow(), Some(deltas));
        assert!((deltas.scaled - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_host_stage_sharing_the_timer_name_is_independent() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = StagedFrameLoop::default();

        let log = Rc::clone(&calls);
        frame_loop.add_stage(TIMER_STAGE, move |_| log.borrow_mut().push("host"));
        assert!(!frame_loop.is_installed());

        let log = Rc::clone(&calls);
        assert!(frame_loop.install(Box::new(move |_| log.borrow_mut().push("timers"))));

        assert!(frame_loop.uninstall());
        assert!(!frame_loop.uninstall());
        frame_loop.run_frame(0.016);
        assert_eq!(*calls.borrow(), vec!["host"]);

        let log = Rc::clone(&calls);
        assert!(frame_loop.install(Box::new(move |_| log.borrow_mut().push("timers"))));
        assert!(frame_loop.remove_stage(TIMER_STAGE));
        assert!(frame_loop.is_installed());
        frame_loop.run_frame(0.016);
        assert_eq!(*calls.borrow(), vec!["host", "timers"]);
    }
}
