use crate::emulator::bus::interrupts::{InterruptManager, Interrupts};
use crate::emulator::MemoryAddress;
use crate::utils::BitOps;
use modular_bitfield::prelude::*;

pub const TIMER_IO_START: MemoryAddress = 0x0400_0100;
pub const TIMER_IO_END: MemoryAddress = 0x0400_010F;

/// The four chained 16-bit timers.
///
/// Timers are advanced in batches of CPU-announced cycles rather than per
/// clock tick; each keeps a prescaler remainder so no cycles are lost between
/// batches. A timer in count-up mode ignores the prescaler entirely and is
/// instead bumped once per overflow of its predecessor.
pub struct Timers {
    timers: [Timer; 4],
}

impl Timers {
    const TIMER_INTERRUPTS: [Interrupts; 4] = [
        Interrupts::Timer0,
        Interrupts::Timer1,
        Interrupts::Timer2,
        Interrupts::Timer3,
    ];

    pub fn new() -> Self {
        Self {
            timers: [Timer::default(), Timer::default(), Timer::default(), Timer::default()],
        }
    }

    /// Advance all running timers by the given amount of clock cycles.
    pub fn tick(&mut self, cycles: u32, interrupts: &mut InterruptManager) {
        for idx in 0..self.timers.len() {
            let timer = &self.timers[idx];

            // Count-up timers only move when their predecessor overflows.
            if !timer.control.enabled() || timer.control.count_up() {
                continue;
            }

            let prescaler = timer.control.frequency().to_ticks();
            let available = self.timers[idx].prescaler_remainder + cycles;

            self.timers[idx].prescaler_remainder = available % prescaler;
            let mut increments = available / prescaler;

            while increments > 0 {
                let timer = &mut self.timers[idx];
                let until_overflow = 0x1_0000 - timer.counter as u32;

                if increments >= until_overflow {
                    increments -= until_overflow;
                    self.overflow(idx, interrupts);
                } else {
                    timer.counter += increments as u16;
                    increments = 0;
                }
            }
        }
    }

    pub fn read_registers(&self, addr: MemoryAddress) -> u8 {
        let timer = &self.timers[Self::addr_to_timer_idx(addr)];

        match addr as usize % 4 {
            lane @ 0..=1 => timer.counter.byte_le(lane),
            lane @ 2..=3 => u16::from(timer.control).byte_le(lane - 2),
            _ => unreachable!(),
        }
    }

    pub fn write_registers(&mut self, addr: MemoryAddress, value: u8) {
        let timer = &mut self.timers[Self::addr_to_timer_idx(addr)];

        match addr as usize % 4 {
            lane @ 0..=1 => {
                // Writes land in the reload register, not the live counter.
                timer.reload = timer.reload.change_byte_le(lane, value);
            }
            lane @ 2..=3 => {
                let was_enabled = timer.control.enabled();
                timer.control = u16::from(timer.control).change_byte_le(lane - 2, value).into();

                // The counter picks up the reload value on the 0 -> 1 edge of
                // the enable bit, atomically with the write.
                if timer.control.enabled() && !was_enabled {
                    timer.counter = timer.reload;
                    timer.prescaler_remainder = 0;
                }
            }
            _ => unreachable!(),
        }
    }

    /// Reload the overflowing timer and propagate to a chained successor.
    fn overflow(&mut self, idx: usize, interrupts: &mut InterruptManager) {
        self.timers[idx].counter = self.timers[idx].reload;

        if self.timers[idx].control.irq_on_overflow() {
            interrupts.request(Self::TIMER_INTERRUPTS[idx]);
        }

        if idx < 3 {
            let next = &mut self.timers[idx + 1];

            if next.control.enabled() && next.control.count_up() {
                let (value, overflowed) = next.counter.overflowing_add(1);

                if overflowed {
                    self.overflow(idx + 1, interrupts);
                } else {
                    next.counter = value;
                }
            }
        }
    }

    #[inline(always)]
    const fn addr_to_timer_idx(addr: MemoryAddress) -> usize {
        (addr - TIMER_IO_START) as usize / 4
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Timer {
    control: TimerControl,
    counter: u16,
    reload: u16,
    /// Cycles left over after the last batch, smaller than the prescaler.
    prescaler_remainder: u32,
}

#[bitfield(bits = 16)]
#[repr(u16)]
#[derive(Default, Copy, Clone)]
struct TimerControl {
    frequency: TimerFrequency,
    count_up: bool,
    #[skip]
    _unused: B3,
    irq_on_overflow: bool,
    enabled: bool,
    #[skip]
    _unused2: u8,
}

#[derive(Debug, BitfieldSpecifier)]
#[bits = 2]
pub enum TimerFrequency {
    C1 = 0b00,
    C64 = 0b01,
    C256 = 0b10,
    C1024 = 0b11,
}

impl TimerFrequency {
    pub fn to_ticks(&self) -> u32 {
        match self {
            TimerFrequency::C1 => 1,
            TimerFrequency::C64 => 64,
            TimerFrequency::C256 => 256,
            TimerFrequency::C1024 => 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_control(frequency: u16, irq: bool) -> [u8; 2] {
        let raw = frequency | ((irq as u16) << 6) | (1 << 7);
        [raw as u8, (raw >> 8) as u8]
    }

    #[test]
    fn enabling_loads_the_reload_value() {
        let mut timers = Timers::new();

        timers.write_registers(TIMER_IO_START, 0x34);
        timers.write_registers(TIMER_IO_START + 1, 0x12);
        // Counter still reads zero before the enable edge.
        assert_eq!(timers.read_registers(TIMER_IO_START), 0);

        let control = enabled_control(0, false);
        timers.write_registers(TIMER_IO_START + 2, control[0]);
        timers.write_registers(TIMER_IO_START + 3, control[1]);

        assert_eq!(timers.read_registers(TIMER_IO_START), 0x34);
        assert_eq!(timers.read_registers(TIMER_IO_START + 1), 0x12);
    }

    #[test]
    fn prescaler_keeps_remainders() {
        let mut timers = Timers::new();
        let mut irq = InterruptManager::new();

        let control = enabled_control(0b01, false); // 64-cycle prescaler
        timers.write_registers(TIMER_IO_START + 2, control[0]);
        timers.write_registers(TIMER_IO_START + 3, control[1]);

        // 63 cycles: not a full prescaler period yet.
        timers.tick(63, &mut irq);
        assert_eq!(timers.read_registers(TIMER_IO_START), 0);

        // The remaining cycle completes the period.
        timers.tick(1, &mut irq);
        assert_eq!(timers.read_registers(TIMER_IO_START), 1);
    }

    #[test]
    fn overflow_requests_irq_and_reloads() {
        let mut timers = Timers::new();
        let mut irq = InterruptManager::new();

        // Reload of 0xFFF0 leaves 0x10 ticks to the overflow.
        timers.write_registers(TIMER_IO_START, 0xF0);
        timers.write_registers(TIMER_IO_START + 1, 0xFF);
        let control = enabled_control(0, true);
        timers.write_registers(TIMER_IO_START + 2, control[0]);
        timers.write_registers(TIMER_IO_START + 3, control[1]);

        timers.tick(0x10, &mut irq);

        assert_eq!(timers.read_registers(TIMER_IO_START), 0xF0);
        assert_eq!(timers.read_registers(TIMER_IO_START + 1), 0xFF);
        assert_eq!(u16::from(irq.flags), Interrupts::Timer0 as u16);
    }

    #[test]
    fn count_up_timer_follows_predecessor_overflows() {
        let mut timers = Timers::new();
        let mut irq = InterruptManager::new();

        // Timer 0 overflows every tick (reload 0xFFFF).
        timers.write_registers(TIMER_IO_START, 0xFF);
        timers.write_registers(TIMER_IO_START + 1, 0xFF);
        let control = enabled_control(0, false);
        timers.write_registers(TIMER_IO_START + 2, control[0]);
        timers.write_registers(TIMER_IO_START + 3, control[1]);

        // Timer 1 counts up from timer 0.
        let cascade = enabled_control(0, false);
        timers.write_registers(TIMER_IO_START + 6, cascade[0] | 0b100);
        timers.write_registers(TIMER_IO_START + 7, cascade[1]);

        timers.tick(3, &mut irq);
        assert_eq!(timers.read_registers(TIMER_IO_START + 4), 3);
    }
}
