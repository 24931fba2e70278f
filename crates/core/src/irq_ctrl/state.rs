// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::interrupt::N_IRQS;

/// Priority of a line that was never configured. 0 is the most urgent.
pub const LOWEST_PRIORITY: u8 = 255;

/// Bit for `irq`, or 0 when the index is outside the bitset.
#[inline]
fn bit(irq: u32) -> u64 {
    1u64.checked_shl(irq).unwrap_or(0)
}

/// Latch, enable and status bitsets plus the per-line priority table.
///
/// `status` is always `premask & mask`.
#[derive(Debug, Clone)]
pub struct IrqState {
    premask: u64,
    status: u64,
    mask: u64,
    prio: [u8; N_IRQS as usize],
}

impl Default for IrqState {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqState {
    pub fn new() -> Self {
        Self {
            premask: 0,
            status: 0,
            mask: 0,
            prio: [LOWEST_PRIORITY; N_IRQS as usize],
        }
    }

    pub fn latch(&mut self, irq: u32) {
        let b = bit(irq);
        self.premask |= b;
        if self.mask & b != 0 {
            self.status |= b;
        }
    }

    pub fn clear(&mut self, irq: u32) {
        let b = bit(irq);
        self.premask &= !b;
        self.status &= !b;
    }

    /// Sets the enable bit. Returns true if the line was already latched,
    /// in which case it is now active.
    pub fn enable(&mut self, irq: u32) -> bool {
        let b = bit(irq);
        self.mask |= b;
        if self.premask & b != 0 {
            self.status |= b;
            true
        } else {
            false
        }
    }

    /// Clears the enable bit. The latch survives.
    pub fn disable(&mut self, irq: u32) {
        let b = bit(irq);
        self.mask &= !b;
        self.status &= !b;
    }

    pub fn clear_all_enabled(&mut self) {
        self.status = 0;
        self.premask &= !self.mask;
    }

    pub fn clear_all(&mut self) {
        self.status = 0;
        self.premask = 0;
    }

    pub fn is_enabled(&self, irq: u32) -> bool {
        self.mask & bit(irq) != 0
    }

    pub fn is_latched(&self, irq: u32) -> bool {
        self.premask & bit(irq) != 0
    }

    pub fn premask(&self) -> u64 {
        self.premask
    }

    pub fn status(&self) -> u64 {
        self.status
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn set_priority(&mut self, irq: u32, prio: u8) {
        if let Some(slot) = self.prio.get_mut(irq as usize) {
            *slot = prio;
        }
    }

    pub fn priority(&self, irq: u32) -> u8 {
        self.prio
            .get(irq as usize)
            .copied()
            .unwrap_or(LOWEST_PRIORITY)
    }

    /// Active lines, lowest index first.
    pub fn active_lines(&self) -> SetBits {
        SetBits(self.status)
    }
}

/// Iterator over the set bits of a bitset, lowest first.
#[derive(Debug, Clone, Copy)]
pub struct SetBits(u64);

impl Iterator for SetBits {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let irq = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(irq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_only_surfaces_when_enabled() {
        let mut s = IrqState::new();
        s.latch(5);
        assert!(s.is_latched(5));
        assert_eq!(s.status(), 0);

        assert!(s.enable(5));
        assert_eq!(s.status(), 1 << 5);
    }

    #[test]
    fn test_disable_keeps_latch() {
        let mut s = IrqState::new();
        s.enable(9);
        s.latch(9);
        s.disable(9);
        assert_eq!(s.status(), 0);
        assert_eq!(s.premask(), 1 << 9);
        assert!(s.enable(9));
        assert_eq!(s.status(), 1 << 9);
    }

    #[test]
    fn test_clear_all_enabled_preserves_disabled_latches() {
        let mut s = IrqState::new();
        s.enable(1);
        s.latch(1);
        s.latch(2);
        s.clear_all_enabled();
        assert_eq!(s.status(), 0);
        assert_eq!(s.premask(), 1 << 2);

        s.clear_all();
        assert_eq!(s.premask(), 0);
    }

    #[test]
    fn test_out_of_range_line_is_ignored() {
        let mut s = IrqState::new();
        s.enable(64);
        s.latch(200);
        s.set_priority(64, 0);
        assert_eq!(s.mask(), 0);
        assert_eq!(s.premask(), 0);
        assert_eq!(s.priority(64), LOWEST_PRIORITY);
    }

    #[test]
    fn test_set_bits_iterates_low_to_high() {
        let lines: Vec<u32> = SetBits((1 << 63) | (1 << 4) | 1).collect();
        assert_eq!(lines, vec![0, 4, 63]);
    }
}
