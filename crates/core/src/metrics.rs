// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{IrqObserver, IrqSource, RaiseContext};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct IrqMetrics {
    raises: AtomicU64,
    hw_wakes: AtomicU64,
    sw_wakes: AtomicU64,
    deliveries: AtomicU64,
    lock_changes: AtomicU64,
    deliveries_by_line: Mutex<BTreeMap<u32, u64>>,
}

impl IrqMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.raises.store(0, Ordering::SeqCst);
        self.hw_wakes.store(0, Ordering::SeqCst);
        self.sw_wakes.store(0, Ordering::SeqCst);
        self.deliveries.store(0, Ordering::SeqCst);
        self.lock_changes.store(0, Ordering::SeqCst);
        if let Ok(mut m) = self.deliveries_by_line.lock() {
            m.clear();
        }
    }

    pub fn get_raises(&self) -> u64 {
        self.raises.load(Ordering::SeqCst)
    }

    pub fn get_hw_wakes(&self) -> u64 {
        self.hw_wakes.load(Ordering::SeqCst)
    }

    pub fn get_sw_wakes(&self) -> u64 {
        self.sw_wakes.load(Ordering::SeqCst)
    }

    pub fn get_deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::SeqCst)
    }

    pub fn get_lock_changes(&self) -> u64 {
        self.lock_changes.load(Ordering::SeqCst)
    }

    pub fn get_deliveries_for(&self, irq: u32) -> u64 {
        self.deliveries_by_line
            .lock()
            .ok()
            .and_then(|m| m.get(&irq).copied())
            .unwrap_or(0)
    }

    pub fn deliveries_by_line(&self) -> BTreeMap<u32, u64> {
        self.deliveries_by_line
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl IrqObserver for IrqMetrics {
    fn on_raise(&self, _irq: IrqSource, _ctx: RaiseContext) {
        self.raises.fetch_add(1, Ordering::Relaxed);
    }

    fn on_wake(&self, ctx: RaiseContext) {
        match ctx {
            RaiseContext::Hardware => self.hw_wakes.fetch_add(1, Ordering::Relaxed),
            RaiseContext::Software => self.sw_wakes.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn on_deliver(&self, irq: u32, _priority: u8) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut m) = self.deliveries_by_line.lock() {
            *m.entry(irq).or_insert(0) += 1;
        }
    }

    fn on_lock_change(&self, _locked: bool) {
        self.lock_changes.fetch_add(1, Ordering::Relaxed);
    }
}
