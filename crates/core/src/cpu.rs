// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interrupt::CpuWake;

/// Minimal model of the simulated CPU's wake input.
///
/// A wake only records that the CPU must look at the controller; servicing is
/// done by whoever owns the CPU thread.
#[derive(Debug, Default, Clone)]
pub struct Cpu0 {
    wake_pending: bool,
    hw_wakes: u64,
    sw_wakes: u64,
}

impl Cpu0 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the pending wake flag.
    pub fn take_wake(&mut self) -> bool {
        std::mem::take(&mut self.wake_pending)
    }

    pub fn hw_wakes(&self) -> u64 {
        self.hw_wakes
    }

    pub fn sw_wakes(&self) -> u64 {
        self.sw_wakes
    }
}

impl CpuWake for Cpu0 {
    fn irq_raised(&mut self) {
        self.hw_wakes += 1;
        self.wake_pending = true;
    }

    fn irq_raised_from_sw(&mut self) {
        self.sw_wakes += 1;
        self.wake_pending = true;
    }
}
