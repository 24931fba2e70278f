// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::IrqController;
use crate::interrupt::{CpuWake, HwScheduler};
use tracing::trace;

/// The controller's single deadline slot on the hardware scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrqTimer {
    deadline: Option<u64>,
}

impl IrqTimer {
    pub fn arm(&mut self, at: u64) {
        self.deadline = Some(at);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.deadline.is_some_and(|at| at <= now)
    }
}

impl<S: HwScheduler, C: CpuWake> IrqController<S, C> {
    /// Arm the deadline at the current time so the CPU is woken on the next
    /// scheduler pass instead of synchronously.
    pub(crate) fn raise_in_delta(&mut self) {
        if self.lock.allows_wake() {
            let now = self.scheduler.now();
            trace!("IRQ wake deferred to delta cycle at t={}", now);
            self.timer.arm(now);
            self.scheduler.find_next_event();
        }
    }

    /// Virtual time at which [`on_timer_expired`](Self::on_timer_expired) must run.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timer.deadline()
    }

    pub fn timer_due(&self, now: u64) -> bool {
        self.timer.is_due(now)
    }

    /// Called by the scheduler when the deadline is reached. Wakes the CPU as
    /// a hardware-context raise would.
    pub fn on_timer_expired(&mut self) {
        self.timer.disarm();
        self.wake_from_hw();
        self.scheduler.find_next_event();
    }
}
