// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interrupt::{CpuWake, HwScheduler, RaiseContext};
use crate::irq_ctrl::IrqController;
use labwired_irqc_config::SourceConfig;

/// Hardware model that raises one line, once or periodically.
#[derive(Debug, Clone)]
pub struct IrqSourceModel {
    id: String,
    line: u32,
    next: Option<u64>,
    period: Option<u64>,
    remaining: Option<u64>,
}

impl IrqSourceModel {
    pub fn new(id: impl Into<String>, line: u32, start: u64) -> Self {
        Self {
            id: id.into(),
            line,
            next: Some(start),
            period: None,
            remaining: Some(1),
        }
    }

    /// Fire every `period` time units. `count` bounds the total number of raises.
    pub fn periodic(mut self, period: u64, count: Option<u64>) -> Self {
        self.period = Some(period);
        self.remaining = count;
        if count == Some(0) {
            self.next = None;
        }
        self
    }

    pub fn from_config(cfg: &SourceConfig) -> Self {
        let model = Self::new(cfg.id.clone(), cfg.line, cfg.start);
        match cfg.period {
            Some(period) => model.periodic(period, cfg.count),
            None if cfg.count == Some(0) => Self {
                next: None,
                ..model
            },
            None => model,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn next_event(&self) -> Option<u64> {
        self.next
    }

    /// Raise the line from hardware context and schedule the next firing.
    pub fn trigger<S: HwScheduler, C: CpuWake>(&mut self, ctrl: &mut IrqController<S, C>) {
        let Some(now) = self.next else {
            return;
        };
        ctrl.raise(self.line, RaiseContext::Hardware);

        if let Some(left) = self.remaining.as_mut() {
            *left = left.saturating_sub(1);
        }
        self.next = match (self.period, self.remaining) {
            (_, Some(0)) | (None, _) => None,
            (Some(period), _) => now.checked_add(period),
        };
        ctrl.scheduler_mut().find_next_event();
    }
}
