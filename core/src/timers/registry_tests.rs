//! Tests for TimerRegistry passes
//!
//! Verifies that a pass advances exactly the timers active when it began,
//! even when callbacks register, cancel or clear timers mid-pass.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::scheduler::{FrameClock, FrameScheduler, StagedFrameLoop};

use super::{Timer, TimerError, TimerRegistry};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn bump(count: &Rc<Cell<u32>>) -> impl Fn() + 'static {
    let count = Rc::clone(count);
    move || count.set(count.get() + 1)
}

/// Started timer with the given duration and an update counter
fn started_timer(registry: &TimerRegistry, duration: f32, updates: &Rc<Cell<u32>>) -> Timer {
    let timer = Timer::builder(duration)
        .on_update(bump(updates))
        .build(registry)
        .unwrap();
    timer.start();
    timer
}

// ═══════════════════════════════════════════════════════════════════════════
// Membership
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_register_is_idempotent() {
    let registry = TimerRegistry::new();
    let updates = counter();
    let timer = started_timer(&registry, 10.0, &updates);

    assert!(!registry.register(&timer));
    assert_eq!(registry.len(), 1);

    registry.drive_all(0.1, 0.1);
    assert_eq!(updates.get(), 1);
}

#[test]
fn test_unregister_absent_is_noop() {
    let registry = TimerRegistry::new();
    let timer = Timer::builder(1.0).build(&registry).unwrap();

    assert!(!registry.unregister(&timer));

    timer.start();
    assert!(registry.unregister(&timer));
    assert!(!timer.is_registered());
    assert!(!registry.unregister(&timer));
}

#[test]
fn test_rejects_timer_from_other_registry() {
    let home = TimerRegistry::new();
    let other = TimerRegistry::new();
    let timer = Timer::builder(1.0).build(&home).unwrap();

    assert!(!other.register(&timer));
    assert!(other.is_empty());
    assert!(!timer.is_registered());
}

#[test]
fn test_current_registry_is_shared_per_thread() {
    let first = TimerRegistry::current();
    let second = TimerRegistry::current();
    assert!(first.ptr_eq(&second));
    assert!(!first.ptr_eq(&TimerRegistry::new()));
}

// ═══════════════════════════════════════════════════════════════════════════
// Passes
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_pass_uses_delta_matching_scale_flag() {
    let registry = TimerRegistry::new();
    let scaled_ticks = counter();
    let unscaled_ticks = counter();

    let scaled = Timer::builder(1.0)
        .on_tick(bump(&scaled_ticks))
        .build(&registry)
        .unwrap();
    let unscaled = Timer::builder(1.0)
        .scaled(false)
        .on_tick(bump(&unscaled_ticks))
        .build(&registry)
        .unwrap();
    scaled.start();
    unscaled.start();

    // Game time frozen, wall time moving
    registry.drive_all(0.0, 1.0);
    assert_eq!(scaled_ticks.get(), 0);
    assert_eq!(unscaled_ticks.get(), 1);
    assert!(registry.contains(&scaled));
    assert!(!registry.contains(&unscaled));
}

#[test]
fn test_pass_runs_in_registration_order() {
    let registry = TimerRegistry::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["a", "b", "c"] {
        let log = Rc::clone(&log);
        let timer = Timer::builder(10.0)
            .on_update(move || log.borrow_mut().push(name))
            .build(&registry)
            .unwrap();
        timer.start();
    }

    registry.drive_all(0.1, 0.1);
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    assert_eq!(registry.frame_count(), 1);
}

#[test]
fn test_finished_timer_leaves_active_set() {
    let registry = TimerRegistry::new();
    let finished = counter();

    let timer = Timer::builder(1.0)
        .tick_count(2)
        .on_finished(bump(&finished))
        .build(&registry)
        .unwrap();
    timer.start();

    registry.drive_all(1.0, 1.0);
    assert!(registry.contains(&timer));
    registry.drive_all(1.0, 1.0);
    assert_eq!(finished.get(), 1);
    assert!(registry.is_empty());

    registry.drive_all(1.0, 1.0);
    assert_eq!(finished.get(), 1);
}

#[test]
fn test_timer_registered_mid_pass_waits_for_next_pass() {
    let registry = TimerRegistry::new();
    let child_updates = counter();
    let child: Rc<RefCell<Option<Timer>>> = Rc::new(RefCell::new(None));

    let parent = {
        let host = registry.clone();
        let child = Rc::clone(&child);
        let child_updates = Rc::clone(&child_updates);
        Timer::builder(10.0)
            .on_update(move || {
                if child.borrow().is_some() {
                    return;
                }
                let spawned = Timer::builder(10.0)
                    .on_update(bump(&child_updates))
                    .build(&host)
                    .unwrap();
                spawned.start();
                *child.borrow_mut() = Some(spawned);
            })
            .build(&registry)
            .unwrap()
    };
    parent.start();

    registry.drive_all(0.1, 0.1);
    assert_eq!(registry.len(), 2);
    assert_eq!(child_updates.get(), 0);

    registry.drive_all(0.1, 0.1);
    assert_eq!(child_updates.get(), 1);
}

#[test]
fn test_cancelling_later_timer_mid_pass_prevents_its_tick() {
    let registry = TimerRegistry::new();
    let b_ticks = counter();

    let b = Timer::builder(1.0)
        .on_tick(bump(&b_ticks))
        .build(&registry)
        .unwrap();
    let victim = b.clone();
    let a = Timer::builder(1.0)
        .on_tick(move || victim.cancel())
        .build(&registry)
        .unwrap();
    a.start();
    b.start();

    registry.drive_all(1.0, 1.0);
    assert_eq!(b_ticks.get(), 0);
    assert!(!b.is_registered());
    assert!(registry.is_empty());
}

#[test]
fn test_self_cancel_does_not_skip_next_timer() {
    let registry = TimerRegistry::new();
    let b_updates = counter();

    let a = Timer::builder(10.0).build(&registry).unwrap();
    let weak = a.downgrade();
    a.on_update(move || {
        if let Some(a) = weak.upgrade() {
            a.cancel();
        }
    });
    a.start();
    let _b = started_timer(&registry, 10.0, &b_updates);

    registry.drive_all(0.1, 0.1);
    assert_eq!(b_updates.get(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_cancel_then_start_mid_pass_advances_once() {
    let registry = TimerRegistry::new();
    let updates = counter();

    let timer = Timer::builder(10.0).build(&registry).unwrap();
    let weak = timer.downgrade();
    let seen = Rc::clone(&updates);
    let rearmed = Rc::new(Cell::new(false));
    let once = Rc::clone(&rearmed);
    timer.on_update(move || {
        seen.set(seen.get() + 1);
        if once.replace(true) {
            return;
        }
        if let Some(timer) = weak.upgrade() {
            timer.cancel();
            timer.start();
        }
    });
    timer.start();

    registry.drive_all(0.1, 0.1);
    assert_eq!(updates.get(), 1);
    assert!(timer.is_registered());
    assert!(rearmed.get());
}

#[test]
fn test_nested_pass_is_ignored() {
    let registry = TimerRegistry::new();
    let updates = counter();

    let timer = {
        let host = registry.clone();
        let updates = Rc::clone(&updates);
        Timer::builder(10.0)
            .on_update(move || {
                updates.set(updates.get() + 1);
                assert!(host.is_driving());
                host.drive_all(1.0, 1.0);
            })
            .build(&registry)
            .unwrap()
    };
    timer.start();

    registry.drive_all(0.1, 0.1);
    assert_eq!(updates.get(), 1);
    assert_eq!(registry.frame_count(), 1);
    assert!(!registry.is_driving());
}

// ═══════════════════════════════════════════════════════════════════════════
// One-Shot Events
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_one_shot_event_fires_once() {
    let registry = TimerRegistry::new();
    let fired = counter();

    registry
        .register_one_shot_event(0.5, bump(&fired), true)
        .unwrap();
    assert_eq!(registry.len(), 1);

    registry.drive_all(0.25, 0.25);
    assert_eq!(fired.get(), 0);
    registry.drive_all(0.25, 0.25);
    assert_eq!(fired.get(), 1);
    assert!(registry.is_empty());

    registry.drive_all(1.0, 1.0);
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_unscaled_one_shot_ignores_time_scale() {
    let registry = TimerRegistry::new();
    let fired = counter();

    registry
        .register_one_shot_event(0.5, bump(&fired), false)
        .unwrap();
    registry.drive_all(0.0, 0.5);
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_one_shot_event_can_be_cancelled() {
    let registry = TimerRegistry::new();
    let fired = counter();

    let event = registry
        .register_one_shot_event(0.5, bump(&fired), true)
        .unwrap();
    event.cancel();
    registry.drive_all(1.0, 1.0);
    assert_eq!(fired.get(), 0);
}

#[test]
fn test_one_shot_event_rejects_bad_duration() {
    let registry = TimerRegistry::new();
    let result = registry.register_one_shot_event(-1.0, || {}, true);
    assert!(matches!(result, Err(TimerError::InvalidDuration { .. })));
    assert!(registry.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Clear All
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_clear_all_silences_every_timer() {
    let registry = TimerRegistry::new();
    let ticks = counter();
    let finished = counter();

    let timers: Vec<Timer> = (0..5)
        .map(|_| {
            let timer = Timer::builder(1.0)
                .on_tick(bump(&ticks))
                .on_finished(bump(&finished))
                .build(&registry)
                .unwrap();
            timer.start();
            timer
        })
        .collect();

    assert_eq!(registry.clear_all(), 5);
    assert!(registry.is_empty());

    for timer in &timers {
        assert!(!timer.is_running());
        assert!(!timer.is_registered());
        // Stale handle still being advanced by mistake
        timer.advance(100.0);
        timer.resume();
        timer.advance(100.0);
    }
    registry.drive_all(100.0, 100.0);

    assert_eq!(ticks.get(), 0);
    assert_eq!(finished.get(), 0);
}

#[test]
fn test_clear_all_mid_pass_skips_remaining_timers() {
    let registry = TimerRegistry::new();
    let a_ticks = counter();
    let b_updates = counter();

    let a = {
        let host = registry.clone();
        Timer::builder(1.0)
            .on_update(move || {
                host.clear_all();
            })
            .on_tick(bump(&a_ticks))
            .build(&registry)
            .unwrap()
    };
    a.start();
    let _b = started_timer(&registry, 1.0, &b_updates);

    registry.drive_all(1.0, 1.0);
    assert_eq!(a_ticks.get(), 0);
    assert_eq!(b_updates.get(), 0);
    assert!(registry.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Host Scheduler
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_install_drives_timers_each_frame() {
    let registry = TimerRegistry::new();
    let mut frame_loop = StagedFrameLoop::new(FrameClock::new(1.0));
    let ticks = counter();

    assert!(registry.install(&mut frame_loop));
    assert!(!registry.install(&mut frame_loop));

    let timer = Timer::builder(0.2)
        .looping(true)
        .on_tick(bump(&ticks))
        .build(&registry)
        .unwrap();
    timer.start();

    frame_loop.run_frame(0.125);
    frame_loop.run_frame(0.125);
    assert_eq!(ticks.get(), 1);
    assert_eq!(registry.frame_count(), 2);
}

#[test]
fn test_shutdown_clears_and_uninstalls() {
    let registry = TimerRegistry::new();
    let mut frame_loop = StagedFrameLoop::default();
    let updates = counter();

    registry.install(&mut frame_loop);
    let timer = started_timer(&registry, 1.0, &updates);

    registry.shutdown(&mut frame_loop);
    assert!(registry.is_empty());
    assert!(!frame_loop.is_installed());
    assert!(!timer.is_running());
    assert!(!registry.uninstall(&mut frame_loop));

    frame_loop.run_frame(0.1);
    assert_eq!(updates.get(), 0);
    assert_eq!(registry.frame_count(), 0);
}

#[test]
fn test_hook_does_not_keep_registry_alive() {
    let mut frame_loop = StagedFrameLoop::default();
    let updates = counter();

    {
        let registry = TimerRegistry::new();
        registry.install(&mut frame_loop);
        let timer = started_timer(&registry, 1.0, &updates);
        drop(timer);
    }

    frame_loop.run_frame(0.1);
    assert_eq!(updates.get(), 0);
}
