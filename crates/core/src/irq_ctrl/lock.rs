// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::IrqController;
use crate::interrupt::{CpuWake, HwScheduler};
use tracing::debug;

/// Global interrupt lock.
///
/// While locked, raises are still latched but do not wake the CPU. The
/// override is armed by the hard phony line and lets exactly one
/// hardware-context wake through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrqLock {
    locked: bool,
    ignore_once: bool,
}

impl IrqLock {
    /// Returns the previous value.
    pub fn set(&mut self, locked: bool) -> bool {
        std::mem::replace(&mut self.locked, locked)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn arm_override(&mut self) {
        self.ignore_once = true;
    }

    pub fn override_armed(&self) -> bool {
        self.ignore_once
    }

    /// Whether a wake may proceed right now, without consuming the override.
    pub fn allows_wake(&self) -> bool {
        !self.locked || self.ignore_once
    }

    /// Like [`allows_wake`](Self::allows_wake), but consumes the override.
    pub fn take_wake_permit(&mut self) -> bool {
        if self.allows_wake() {
            self.ignore_once = false;
            true
        } else {
            false
        }
    }
}

impl<S: HwScheduler, C: CpuWake> IrqController<S, C> {
    /// Change the global interrupt lock, returning the previous value.
    ///
    /// Unlocking while any line is active wakes the CPU once from software
    /// context, since only firmware changes the lock.
    pub fn set_lock(&mut self, locked: bool) -> bool {
        let previous = self.lock.set(locked);
        if previous != locked {
            debug!("IRQ lock {}", if locked { "set" } else { "cleared" });
            for obs in &self.observers {
                obs.on_lock_change(locked);
            }
        }
        if previous && !locked && self.state.status() != 0 {
            self.wake_from_sw();
        }
        previous
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}
