// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Software model of the CPU's interrupt controller.
//!
//! The controller is shared by two logical execution contexts: the hardware
//! models and the CPU running firmware. It does no locking of its own. The
//! harness must guarantee that only one context touches it at a time; every
//! mutating call takes `&mut self`, and callers that really run the contexts on
//! separate host threads go through [`SharedIrqController`].

pub mod arbiter;
pub mod lock;
pub mod state;
pub mod timer;

use crate::interrupt::{CpuWake, HwScheduler, IrqSource, RaiseContext};
use crate::IrqObserver;
use lock::IrqLock;
use state::IrqState;
use std::sync::{Arc, Mutex};
use timer::IrqTimer;
use tracing::{debug, trace};

/// Controller guarded by a mutex, for harnesses whose contexts are real threads.
pub type SharedIrqController<S, C> = Arc<Mutex<IrqController<S, C>>>;

/// Read-only view of the controller, for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ControllerSnapshot {
    pub premask: u64,
    pub status: u64,
    pub mask: u64,
    pub locked: bool,
    pub running_priority: Option<u8>,
    pub deadline: Option<u64>,
    /// A hard-phony raise is waiting to bypass the lock.
    pub override_armed: bool,
}

#[derive(Debug)]
pub struct IrqController<S: HwScheduler, C: CpuWake> {
    state: IrqState,
    lock: IrqLock,
    timer: IrqTimer,
    /// Priority of the handler the CPU is currently in. `None` when not in a handler.
    running_prio: Option<u8>,
    scheduler: S,
    cpu: C,
    observers: Vec<Arc<dyn IrqObserver>>,
}

impl<S: HwScheduler, C: CpuWake> IrqController<S, C> {
    /// All lines disabled and idle, lock cleared, every priority at the lowest level.
    pub fn new(scheduler: S, cpu: C) -> Self {
        Self {
            state: IrqState::new(),
            lock: IrqLock::default(),
            timer: IrqTimer::default(),
            running_prio: None,
            scheduler,
            cpu,
            observers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedIrqController<S, C> {
        Arc::new(Mutex::new(self))
    }

    pub fn add_observer(&mut self, observer: Arc<dyn IrqObserver>) {
        self.observers.push(observer);
    }

    pub fn observers(&self) -> &[Arc<dyn IrqObserver>] {
        &self.observers
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    /// Raise (pend) an interrupt.
    ///
    /// From [`RaiseContext::Hardware`] the CPU is woken synchronously. From
    /// [`RaiseContext::Software`] the wake is deferred to the next scheduler
    /// pass at the current virtual time. In both cases the latch and status
    /// bits are updated before this returns, locked or not. The CPU is woken
    /// even when the line is disabled; it may be idling and only needs to
    /// notice the pending latch.
    pub fn raise(&mut self, irq: impl Into<IrqSource>, ctx: RaiseContext) {
        let irq = irq.into();
        self.latch(irq);
        for obs in &self.observers {
            obs.on_raise(irq, ctx);
        }
        match ctx {
            RaiseContext::Hardware => self.wake_from_hw(),
            RaiseContext::Software => self.raise_in_delta(),
        }
    }

    /// Raise an interrupt from software context and wake the CPU at once.
    ///
    /// For software-pended interrupts that must be observed before the caller
    /// continues. Only the lock gates the wake; a pending hard-phony override
    /// is neither honoured nor consumed here.
    pub fn raise_now_from_sw(&mut self, irq: impl Into<IrqSource>) {
        let irq = irq.into();
        self.latch(irq);
        for obs in &self.observers {
            obs.on_raise(irq, RaiseContext::Software);
        }
        if !self.lock.is_locked() {
            self.wake_from_sw();
        }
    }

    fn latch(&mut self, irq: IrqSource) {
        match irq {
            IrqSource::Line(n) => {
                trace!("IRQ {} latched", n);
                self.state.latch(n);
            }
            IrqSource::PhonyHard => self.lock.arm_override(),
            IrqSource::PhonyWeak => {}
        }
    }

    /// Wake the CPU through the hardware-context primitive unless locked.
    /// A pending hard-phony override lets exactly one wake through.
    pub(crate) fn wake_from_hw(&mut self) {
        if self.lock.take_wake_permit() {
            debug!("CPU woken from hardware context");
            self.cpu.irq_raised();
            self.notify_wake(RaiseContext::Hardware);
        }
    }

    pub(crate) fn wake_from_sw(&mut self) {
        debug!("CPU woken from software context");
        self.cpu.irq_raised_from_sw();
        self.notify_wake(RaiseContext::Software);
    }

    fn notify_wake(&self, ctx: RaiseContext) {
        for obs in &self.observers {
            obs.on_wake(ctx);
        }
    }

    /// Un-pend a line. Called by the CPU side when it starts servicing it.
    pub fn clear(&mut self, irq: u32) {
        trace!("IRQ {} cleared", irq);
        self.state.clear(irq);
    }

    /// Enable a line. Software context only.
    ///
    /// A line that was already latched becomes active at once and, unless
    /// locked, the CPU is woken immediately from software context.
    pub fn enable(&mut self, irq: u32) {
        trace!("IRQ {} enabled", irq);
        if self.state.enable(irq) && !self.lock.is_locked() {
            self.wake_from_sw();
        }
    }

    /// Disable a line. Its latch survives and resurfaces when re-enabled.
    /// A wake that was already issued is not retracted.
    pub fn disable(&mut self, irq: u32) {
        trace!("IRQ {} disabled", irq);
        self.state.disable(irq);
    }

    pub fn is_enabled(&self, irq: u32) -> bool {
        self.state.is_enabled(irq)
    }

    pub fn clear_all_enabled_irqs(&mut self) {
        self.state.clear_all_enabled();
    }

    pub fn clear_all_irqs(&mut self) {
        self.state.clear_all();
    }

    pub fn set_priority(&mut self, irq: u32, prio: u8) {
        self.state.set_priority(irq, prio);
    }

    pub fn priority(&self, irq: u32) -> u8 {
        self.state.priority(irq)
    }

    pub fn set_running_priority(&mut self, prio: Option<u8>) {
        self.running_prio = prio;
    }

    pub fn running_priority(&self) -> Option<u8> {
        self.running_prio
    }

    pub fn premask(&self) -> u64 {
        self.state.premask()
    }

    pub fn mask(&self) -> u64 {
        self.state.mask()
    }

    pub fn status(&self) -> u64 {
        self.state.status()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            premask: self.state.premask(),
            status: self.state.status(),
            mask: self.state.mask(),
            locked: self.lock.is_locked(),
            running_priority: self.running_prio,
            deadline: self.timer.deadline(),
            override_armed: self.lock.override_armed(),
        }
    }
}
