// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::state::IrqState;
use super::IrqController;
use crate::interrupt::{CpuWake, HwScheduler};

/// Highest-priority active line that would preempt `running`.
///
/// Lines are scanned from the lowest index up and a candidate only wins on a
/// strictly lower priority value, so ties go to the lowest index. Any
/// configured priority preempts `None`.
pub fn highest_priority_irq(state: &IrqState, running: Option<u8>) -> Option<u32> {
    let mut winner: Option<(u32, u8)> = None;

    for irq in state.active_lines() {
        let prio = state.priority(irq);
        let beats_winner = winner.map_or(true, |(_, best)| prio < best);
        let beats_running = running.map_or(true, |cur| prio < cur);
        if beats_winner && beats_running {
            winner = Some((irq, prio));
        }
    }

    winner.map(|(irq, _)| irq)
}

impl<S: HwScheduler, C: CpuWake> IrqController<S, C> {
    /// Next line the CPU should vector to, or `None` if interrupts are locked
    /// or nothing pending beats the currently running priority.
    pub fn select_next(&self) -> Option<u32> {
        if self.lock.is_locked() {
            return None;
        }
        highest_priority_irq(&self.state, self.running_prio)
    }
}
