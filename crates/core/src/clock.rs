// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interrupt::HwScheduler;

/// Virtual time source for the hardware scheduler.
///
/// Time only moves when the simulation loop advances it to the next event.
#[derive(Debug, Default, Clone)]
pub struct VirtualClock {
    now: u64,
    recompute_requests: u64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Never moves it backwards.
    pub fn advance_to(&mut self, t: u64) {
        self.now = self.now.max(t);
    }

    pub fn recompute_requests(&self) -> u64 {
        self.recompute_requests
    }
}

impl HwScheduler for VirtualClock {
    fn now(&self) -> u64 {
        self.now
    }

    fn find_next_event(&mut self) {
        // The simulation loop rescans every event source before each step.
        self.recompute_requests += 1;
    }
}
