// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_irqc_config::{PhonyLine, RaiseLine};
use std::fmt::Debug;

/// Number of real interrupt lines the controller tracks.
pub const N_IRQS: u32 = 64;

/// Raw code of the weak phony line.
pub const PHONY_WEAK_IRQ: u32 = 0xFFFE;
/// Raw code of the hard phony line.
pub const PHONY_HARD_IRQ: u32 = 0xFFFF;

/// Something that can be raised on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IrqSource {
    /// A real line in `0..N_IRQS`.
    Line(u32),
    /// Wakes the CPU once even while interrupts are locked.
    PhonyHard,
    /// Reserved. Changes no controller state.
    PhonyWeak,
}

impl IrqSource {
    pub fn code(self) -> u32 {
        match self {
            IrqSource::Line(n) => n,
            IrqSource::PhonyHard => PHONY_HARD_IRQ,
            IrqSource::PhonyWeak => PHONY_WEAK_IRQ,
        }
    }
}

impl From<u32> for IrqSource {
    fn from(code: u32) -> Self {
        match code {
            PHONY_HARD_IRQ => IrqSource::PhonyHard,
            PHONY_WEAK_IRQ => IrqSource::PhonyWeak,
            n => IrqSource::Line(n),
        }
    }
}

impl From<RaiseLine> for IrqSource {
    fn from(line: RaiseLine) -> Self {
        match line {
            RaiseLine::Line(n) => IrqSource::Line(n),
            RaiseLine::Phony(PhonyLine::PhonyHard) => IrqSource::PhonyHard,
            RaiseLine::Phony(PhonyLine::PhonyWeak) => IrqSource::PhonyWeak,
        }
    }
}

/// Execution context a caller is running in.
///
/// The context selects both the raise latency and the wake primitive:
/// hardware callers wake the CPU synchronously, software callers defer the
/// wake by one delta cycle so the CPU context never re-enters itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RaiseContext {
    Hardware,
    Software,
}

/// Discrete-event virtual clock provided by the surrounding harness.
pub trait HwScheduler: Debug + Send {
    /// Current virtual time.
    fn now(&self) -> u64;

    /// Ask the scheduler to recompute its next wake point from all armed deadlines.
    fn find_next_event(&mut self);
}

/// Cross-context wake primitives of the simulated CPU.
///
/// Calling the variant that does not match the caller's context is a
/// precondition violation.
pub trait CpuWake: Debug + Send {
    /// Wake the CPU from the hardware-model context.
    fn irq_raised(&mut self);

    /// Wake the CPU from its own software context.
    fn irq_raised_from_sw(&mut self);
}
