// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_irqc::clock::VirtualClock;
use labwired_irqc::cpu::Cpu0;
use labwired_irqc::{HwScheduler, IrqController, IrqSource, RaiseContext, N_IRQS};

type Ctrl = IrqController<VirtualClock, Cpu0>;

fn new_ctrl() -> Ctrl {
    IrqController::new(VirtualClock::new(), Cpu0::new())
}

fn wakes(ctrl: &Ctrl) -> (u64, u64) {
    (ctrl.cpu().hw_wakes(), ctrl.cpu().sw_wakes())
}

#[test]
fn test_enabling_latched_line_sets_status_and_wakes_once() {
    let mut ctrl = new_ctrl();
    ctrl.raise(17, RaiseContext::Software);
    assert_eq!(ctrl.status(), 0);
    assert_eq!(ctrl.premask(), 1 << 17);

    ctrl.enable(17);
    assert_eq!(ctrl.status(), 1 << 17);
    assert_eq!(wakes(&ctrl), (0, 1));
}

#[test]
fn test_select_next_none_while_locked() {
    let mut ctrl = new_ctrl();
    for irq in 0..8 {
        ctrl.enable(irq);
        ctrl.raise(irq, RaiseContext::Hardware);
    }
    ctrl.set_lock(true);
    assert_eq!(ctrl.select_next(), None);
    ctrl.set_running_priority(Some(255));
    assert_eq!(ctrl.select_next(), None);
}

#[test]
fn test_tied_priority_goes_to_lowest_index() {
    let mut ctrl = new_ctrl();
    for (irq, prio) in [(0, 100), (1, 10), (2, 10)] {
        ctrl.set_priority(irq, prio);
        ctrl.enable(irq);
        ctrl.raise(irq, RaiseContext::Hardware);
    }
    assert_eq!(ctrl.running_priority(), None);
    assert_eq!(ctrl.select_next(), Some(1));
}

#[test]
fn test_pending_lines_that_do_not_beat_running_priority() {
    let mut ctrl = new_ctrl();
    ctrl.set_priority(5, 40);
    ctrl.enable(5);
    ctrl.raise(5, RaiseContext::Hardware);

    ctrl.set_running_priority(Some(40));
    assert_eq!(ctrl.select_next(), None);
    ctrl.set_running_priority(Some(41));
    assert_eq!(ctrl.select_next(), Some(5));
}

#[test]
fn test_unlock_with_pending_status_wakes_from_sw_only() {
    let mut ctrl = new_ctrl();
    ctrl.enable(30);
    assert!(!ctrl.set_lock(true));
    ctrl.raise(30, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (0, 0));

    assert!(ctrl.set_lock(false));
    assert_eq!(wakes(&ctrl), (0, 1));
}

#[test]
fn test_disable_then_enable_reproduces_status() {
    let mut ctrl = new_ctrl();
    ctrl.enable(44);
    ctrl.raise(44, RaiseContext::Hardware);
    ctrl.disable(44);
    assert_eq!(ctrl.status(), 0);
    assert_eq!(ctrl.premask(), 1 << 44);
    assert!(!ctrl.is_enabled(44));

    ctrl.enable(44);
    assert_eq!(ctrl.status(), 1 << 44);
}

#[test]
fn test_clear_all_variants() {
    let mut ctrl = new_ctrl();
    ctrl.enable(1);
    ctrl.raise(1, RaiseContext::Hardware);
    ctrl.raise(2, RaiseContext::Hardware);

    ctrl.clear_all_enabled_irqs();
    assert_eq!(ctrl.status(), 0);
    assert_eq!(ctrl.premask(), 1 << 2);

    ctrl.raise(1, RaiseContext::Hardware);
    ctrl.clear_all_irqs();
    assert_eq!(ctrl.status(), 0);
    assert_eq!(ctrl.premask(), 0);
    assert_eq!(ctrl.mask(), 1 << 1);
}

#[test]
fn test_raise_clear_round_trip_leaves_other_lines() {
    let mut ctrl = new_ctrl();
    for irq in [0, N_IRQS - 1] {
        ctrl.enable(irq);
    }
    ctrl.raise(0, RaiseContext::Hardware);
    let before = (ctrl.premask(), ctrl.status());

    ctrl.raise(N_IRQS - 1, RaiseContext::Hardware);
    ctrl.clear(N_IRQS - 1);
    assert_eq!((ctrl.premask(), ctrl.status()), before);
}

#[test]
fn test_hard_phony_override_is_one_shot() {
    let mut ctrl = new_ctrl();
    ctrl.enable(3);
    ctrl.set_lock(true);

    ctrl.raise(IrqSource::PhonyHard, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (1, 0));

    ctrl.raise(3, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (1, 0));
    assert_eq!(ctrl.status(), 1 << 3);
}

#[test]
fn test_raw_phony_codes_are_accepted() {
    let mut ctrl = new_ctrl();
    ctrl.set_lock(true);
    ctrl.raise(0xFFFEu32, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (0, 0));
    ctrl.raise(0xFFFFu32, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (1, 0));
    assert_eq!(ctrl.premask(), 0);
}

#[test]
fn test_delta_raise_arms_deadline_at_current_time() {
    let mut ctrl = new_ctrl();
    ctrl.scheduler_mut().advance_to(1234);
    ctrl.raise(7, RaiseContext::Software);
    assert_eq!(ctrl.next_deadline(), Some(ctrl.scheduler().now()));
    assert_eq!(ctrl.scheduler().recompute_requests(), 1);

    ctrl.on_timer_expired();
    assert_eq!(ctrl.next_deadline(), None);
    assert_eq!(wakes(&ctrl), (1, 0));
    assert_eq!(ctrl.scheduler().recompute_requests(), 2);
}

#[test]
fn test_unlocked_weak_phony_follows_context_wake_path() {
    let mut ctrl = new_ctrl();
    ctrl.raise(IrqSource::PhonyWeak, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (1, 0));
    assert_eq!(ctrl.premask(), 0);
    assert_eq!(ctrl.status(), 0);

    let mut ctrl = new_ctrl();
    ctrl.raise(IrqSource::PhonyWeak, RaiseContext::Software);
    assert_eq!(ctrl.next_deadline(), Some(0));
    assert_eq!(wakes(&ctrl), (0, 0));
    ctrl.on_timer_expired();
    assert_eq!(wakes(&ctrl), (1, 0));
    assert_eq!(ctrl.premask(), 0);
}

#[test]
fn test_disable_does_not_retract_issued_wake() {
    let mut ctrl = new_ctrl();
    ctrl.enable(21);
    ctrl.raise(21, RaiseContext::Hardware);
    assert_eq!(wakes(&ctrl), (1, 0));

    ctrl.disable(21);
    assert_eq!(ctrl.status(), 0);
    assert_eq!(ctrl.select_next(), None);
    // The CPU still sees the wake; only arbitration stops offering the line.
    assert!(ctrl.cpu_mut().take_wake());
    assert_eq!(wakes(&ctrl), (1, 0));
}

#[test]
fn test_immediate_software_raise_keeps_override_while_locked() {
    let mut ctrl = new_ctrl();
    ctrl.set_lock(true);
    ctrl.raise(IrqSource::PhonyHard, RaiseContext::Software);
    assert!(ctrl.snapshot().override_armed);

    ctrl.raise_now_from_sw(11);
    assert_eq!(wakes(&ctrl), (0, 0));
    assert!(ctrl.snapshot().override_armed);

    ctrl.on_timer_expired();
    assert_eq!(wakes(&ctrl), (1, 0));
    assert!(!ctrl.snapshot().override_armed);
}
