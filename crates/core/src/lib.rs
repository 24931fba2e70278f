// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod clock;
pub mod cpu;
pub mod interrupt;
pub mod irq_ctrl;
pub mod metrics;
pub mod simulation;
pub mod source;


pub use interrupt::{CpuWake, HwScheduler, IrqSource, RaiseContext, N_IRQS};
pub use irq_ctrl::{ControllerSnapshot, IrqController, SharedIrqController};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Interrupt line {0} is out of range")]
    LineOutOfRange(u32),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing interrupt controller activity.
pub trait IrqObserver: std::fmt::Debug + Send + Sync {
    fn on_raise(&self, _irq: IrqSource, _ctx: RaiseContext) {}
    fn on_wake(&self, _ctx: RaiseContext) {}
    fn on_deliver(&self, _irq: u32, _priority: u8) {}
    fn on_lock_change(&self, _locked: bool) {}
}
