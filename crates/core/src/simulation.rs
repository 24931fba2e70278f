// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Deterministic discrete-event harness around the interrupt controller.
//!
//! The loop alternates the two logical contexts on one host thread, so the
//! single-active-context precondition of the controller holds by
//! construction. Events at the same virtual time run in a fixed order:
//! hardware sources (registration order), then firmware steps, then the
//! controller's own deadline. That last slot is the delta cycle that carries
//! software-context raises.

use crate::clock::VirtualClock;
use crate::cpu::Cpu0;
use crate::interrupt::{HwScheduler, RaiseContext, N_IRQS};
use crate::irq_ctrl::{ControllerSnapshot, IrqController};
use crate::source::IrqSourceModel;
use crate::{SimResult, SimulationError};
use labwired_irqc_config::{
    Action, ControllerConfig, FirmwareStep, Scenario, ScenarioAssertion, ScenarioLimits,
    StopReason,
};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

pub type SimController = IrqController<VirtualClock, Cpu0>;

/// One interrupt handler entry by the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Delivery {
    pub time: u64,
    pub line: u32,
    pub priority: u8,
    /// 0 for a handler entered from thread level, 1 for one that preempted it, etc.
    pub depth: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationReport {
    pub stop_reason: StopReason,
    pub end_time: u64,
    pub events: u64,
    pub deliveries: Vec<Delivery>,
    pub hw_wakes: u64,
    pub sw_wakes: u64,
    pub controller: ControllerSnapshot,
}

impl SimulationReport {
    pub fn delivered_count(&self, line: u32) -> u64 {
        self.deliveries.iter().filter(|d| d.line == line).count() as u64
    }

    pub fn delivery_order(&self) -> Vec<u32> {
        self.deliveries.iter().map(|d| d.line).collect()
    }

    pub fn is_latched(&self, line: u32) -> bool {
        self.controller
            .premask
            .checked_shr(line)
            .is_some_and(|v| v & 1 == 1)
    }

    pub fn check(&self, assertion: &ScenarioAssertion) -> bool {
        match assertion {
            ScenarioAssertion::DeliveredCount(a) => {
                self.delivered_count(a.delivered_count.line) == a.delivered_count.count
            }
            ScenarioAssertion::DeliveryOrder(a) => self.delivery_order() == a.delivery_order,
            ScenarioAssertion::LatchedAtEnd(a) => {
                self.is_latched(a.latched_at_end.line) == a.latched_at_end.latched
            }
            ScenarioAssertion::ExpectedStopReason(a) => {
                self.stop_reason == a.expected_stop_reason
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Source(usize),
    Firmware,
    Timer,
}

#[derive(Debug)]
pub struct Simulation {
    ctrl: SimController,
    sources: Vec<IrqSourceModel>,
    firmware: VecDeque<FirmwareStep>,
    handlers: BTreeMap<u32, Vec<Action>>,
    limits: ScenarioLimits,
    deliveries: Vec<Delivery>,
    /// Dispatched events plus deliveries; bounded by `limits.max_events`.
    events: u64,
    depth: u32,
}

fn check_line(line: u32) -> SimResult<()> {
    if line >= N_IRQS {
        return Err(SimulationError::LineOutOfRange(line));
    }
    Ok(())
}

impl Simulation {
    pub fn new(limits: ScenarioLimits) -> Self {
        Self {
            ctrl: IrqController::new(VirtualClock::new(), Cpu0::new()),
            sources: Vec::new(),
            firmware: VecDeque::new(),
            handlers: BTreeMap::new(),
            limits,
            deliveries: Vec::new(),
            events: 0,
            depth: 0,
        }
    }

    pub fn from_scenario(scenario: &Scenario) -> SimResult<Self> {
        scenario
            .validate()
            .map_err(|e| SimulationError::InvalidScenario(format!("{:#}", e)))?;

        let mut sim = Self::new(scenario.limits);
        sim.configure(&scenario.controller)?;
        for cfg in &scenario.sources {
            check_line(cfg.line)?;
            sim.add_source(IrqSourceModel::from_config(cfg));
        }
        for step in &scenario.firmware {
            sim.schedule_firmware(step.clone());
        }
        for (line, actions) in &scenario.handlers {
            sim.set_handler(*line, actions.clone())?;
        }
        Ok(sim)
    }

    /// Apply boot-time controller settings. No wake can result since nothing
    /// is latched yet.
    pub fn configure(&mut self, cfg: &ControllerConfig) -> SimResult<()> {
        for entry in &cfg.priorities {
            check_line(entry.line)?;
            self.ctrl.set_priority(entry.line, entry.priority);
        }
        for &line in &cfg.enabled {
            check_line(line)?;
            self.ctrl.enable(line);
        }
        self.ctrl.set_lock(cfg.locked);
        Ok(())
    }

    pub fn add_source(&mut self, source: IrqSourceModel) {
        self.sources.push(source);
    }

    /// Queue a firmware step. Steps with equal times keep insertion order.
    pub fn schedule_firmware(&mut self, step: FirmwareStep) {
        let idx = self.firmware.partition_point(|s| s.at <= step.at);
        self.firmware.insert(idx, step);
    }

    pub fn set_handler(&mut self, line: u32, actions: Vec<Action>) -> SimResult<()> {
        check_line(line)?;
        self.handlers.insert(line, actions);
        Ok(())
    }

    pub fn controller(&self) -> &SimController {
        &self.ctrl
    }

    pub fn controller_mut(&mut self) -> &mut SimController {
        &mut self.ctrl
    }

    pub fn now(&self) -> u64 {
        self.ctrl.scheduler().now()
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Perform a firmware action on the controller from software context.
    pub fn apply(&mut self, action: &Action) {
        match *action {
            Action::Raise { line } => self.ctrl.raise(line, RaiseContext::Software),
            Action::RaiseNow { line } => self.ctrl.raise_now_from_sw(line),
            Action::Clear { line } => self.ctrl.clear(line),
            Action::Enable { line } => self.ctrl.enable(line),
            Action::Disable { line } => self.ctrl.disable(line),
            Action::ClearAll => self.ctrl.clear_all_irqs(),
            Action::ClearAllEnabled => self.ctrl.clear_all_enabled_irqs(),
            Action::SetPriority { line, priority } => self.ctrl.set_priority(line, priority),
            Action::Lock => {
                self.ctrl.set_lock(true);
            }
            Action::Unlock => {
                self.ctrl.set_lock(false);
            }
        }
    }

    fn next_event(&self) -> Option<(u64, Event)> {
        let sources = self
            .sources
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.next_event().map(|t| (t, 0u8, Event::Source(i))));
        let firmware = self.firmware.front().map(|s| (s.at, 1u8, Event::Firmware));
        let timer = self.ctrl.next_deadline().map(|t| (t, 2u8, Event::Timer));

        // Ties: lower class first, then lower source index (min_by_key keeps the first).
        sources
            .chain(firmware)
            .chain(timer)
            .min_by_key(|&(t, class, _)| (t, class))
            .map(|(t, _, ev)| (t, ev))
    }

    fn budget_exhausted(&self) -> bool {
        self.events >= self.limits.max_events
    }

    /// Dispatch the next event, if any falls within `max_time`.
    pub fn step(&mut self) -> Option<StopReason> {
        if self.budget_exhausted() {
            return Some(StopReason::MaxEvents);
        }
        let Some((at, event)) = self.next_event() else {
            return Some(StopReason::Idle);
        };
        if at > self.limits.max_time {
            return Some(StopReason::MaxTime);
        }

        self.ctrl.scheduler_mut().advance_to(at);
        self.events += 1;
        match event {
            Event::Source(i) => {
                let source = &mut self.sources[i];
                debug!(
                    "t={} source '{}' raising IRQ {}",
                    at,
                    source.id(),
                    source.line()
                );
                source.trigger(&mut self.ctrl);
            }
            Event::Firmware => {
                if let Some(step) = self.firmware.pop_front() {
                    debug!("t={} firmware {:?}", at, step.action);
                    self.apply(&step.action);
                }
            }
            Event::Timer => {
                if self.ctrl.timer_due(at) {
                    self.ctrl.on_timer_expired();
                }
            }
        }

        if self.ctrl.cpu_mut().take_wake() {
            self.service_interrupts();
        }
        None
    }

    pub fn run(&mut self) -> SimulationReport {
        info!(
            "Starting simulation: {} sources, {} firmware steps",
            self.sources.len(),
            self.firmware.len()
        );
        let stop_reason = loop {
            if let Some(reason) = self.step() {
                break reason;
            }
        };
        info!(
            "Simulation stopped ({:?}) at t={} after {} events, {} deliveries",
            stop_reason,
            self.now(),
            self.events,
            self.deliveries.len()
        );
        self.report(stop_reason)
    }

    pub fn report(&self, stop_reason: StopReason) -> SimulationReport {
        SimulationReport {
            stop_reason,
            end_time: self.now(),
            events: self.events,
            deliveries: self.deliveries.clone(),
            hw_wakes: self.ctrl.cpu().hw_wakes(),
            sw_wakes: self.ctrl.cpu().sw_wakes(),
            controller: self.ctrl.snapshot(),
        }
    }

    /// Vector into every pending line that beats the running priority.
    ///
    /// Each winner is cleared, the running priority is raised to its level
    /// while its handler runs, and restored afterwards.
    fn service_interrupts(&mut self) {
        let previous = self.ctrl.running_priority();
        while let Some(line) = self.ctrl.select_next() {
            if self.budget_exhausted() {
                break;
            }
            self.events += 1;

            let priority = self.ctrl.priority(line);
            self.ctrl.clear(line);
            self.ctrl.set_running_priority(Some(priority));

            let time = self.now();
            debug!(
                "t={} delivering IRQ {} (prio {}, depth {})",
                time, line, priority, self.depth
            );
            self.deliveries.push(Delivery {
                time,
                line,
                priority,
                depth: self.depth,
            });
            for obs in self.ctrl.observers() {
                obs.on_deliver(line, priority);
            }

            self.depth += 1;
            self.run_handler(line);
            self.depth -= 1;
            self.ctrl.set_running_priority(previous);
        }
    }

    fn run_handler(&mut self, line: u32) {
        let Some(actions) = self.handlers.get(&line).cloned() else {
            return;
        };
        for action in &actions {
            self.apply(action);
            // A software-context wake inside a handler may preempt it.
            if self.ctrl.cpu_mut().take_wake() {
                self.service_interrupts();
            }
        }
    }
}
