use crate::emulator::MemoryAddress;
use crate::utils::BitOps;
use modular_bitfield::prelude::*;

pub const IE_START: MemoryAddress = 0x0400_0200;
pub const IE_END: MemoryAddress = 0x0400_0201;
pub const IF_START: MemoryAddress = 0x0400_0202;
pub const IF_END: MemoryAddress = 0x0400_0203;
pub const IME_START: MemoryAddress = 0x0400_0208;
pub const IME_END: MemoryAddress = 0x0400_020B;

/// The interrupt controller: master enable, enable mask, and pending latch.
///
/// Requesting sets a bit in `IF`; software acknowledges by writing ones back
/// (write-one-to-clear). The CPU samples [`InterruptManager::pending`] at
/// every instruction boundary.
#[derive(Debug)]
pub struct InterruptManager {
    pub master_enable: InterruptMasterEnable,
    pub enable: InterruptEnable,
    pub flags: InterruptRequestFlags,
}

impl InterruptManager {
    pub fn new() -> Self {
        InterruptManager {
            master_enable: InterruptMasterEnable::new(),
            enable: InterruptEnable::new(),
            flags: InterruptRequestFlags::new(),
        }
    }

    pub fn read_ie(&self, address: MemoryAddress) -> u8 {
        u16::from(self.enable).byte_le((address - IE_START) as usize)
    }

    pub fn read_if(&self, address: MemoryAddress) -> u8 {
        u16::from(self.flags).byte_le((address - IF_START) as usize)
    }

    pub fn read_ime(&self, address: MemoryAddress) -> u8 {
        u32::from(self.master_enable).byte_le((address - IME_START) as usize)
    }

    pub fn write_ie(&mut self, address: MemoryAddress, value: u8) {
        self.enable = u16::from(self.enable)
            .change_byte_le((address % 2) as usize, value)
            .into();
    }

    /// Acknowledge interrupts: any set bit in `value` clears the matching
    /// pending bit, bits written as zero are left alone.
    pub fn write_if(&mut self, address: MemoryAddress, value: u8) {
        let lane = (address % 2) as usize;
        let current = u16::from(self.flags).byte_le(lane);

        self.flags = u16::from(self.flags)
            .change_byte_le(lane, current & !value)
            .into();
    }

    pub fn write_ime(&mut self, address: MemoryAddress, value: u8) {
        self.master_enable = u32::from(self.master_enable)
            .change_byte_le((address % 4) as usize, value)
            .into();
    }

    /// Latch an interrupt request; the CPU will pick it up at the next
    /// instruction boundary, provided it is enabled.
    pub fn request(&mut self, interrupt: Interrupts) {
        let new_flags = u16::from(self.flags) | interrupt as u16;
        self.flags = new_flags.into();
    }

    /// `true` when an enabled interrupt is pending and the master switch is on.
    #[inline]
    pub fn pending(&self) -> bool {
        self.master_enable.interrupt_enable() && (u16::from(self.enable) & u16::from(self.flags)) != 0
    }
}

impl Default for InterruptManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupts that can be triggered.
///
/// The numeric value is the matching bit in `IE`/`IF`.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
#[repr(u16)]
pub enum Interrupts {
    GamePak = 1 << 13,
    Keypad = 1 << 12,
    Dma3 = 1 << 11,
    Dma2 = 1 << 10,
    Dma1 = 1 << 9,
    Dma0 = 1 << 8,
    Serial = 1 << 7,
    Timer3 = 1 << 6,
    Timer2 = 1 << 5,
    Timer1 = 1 << 4,
    Timer0 = 1 << 3,
    VCounter = 1 << 2,
    Hblank = 1 << 1,
    Vblank = 1,
}

/// If a flag is `false` then the interrupt is disabled.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct InterruptEnable {
    pub vblank: bool,
    pub hblank: bool,
    pub vcounter_match: bool,
    pub timer_0: bool,
    pub timer_1: bool,
    pub timer_2: bool,
    pub timer_3: bool,
    pub serial_communication: bool,
    pub dma_0: bool,
    pub dma_1: bool,
    pub dma_2: bool,
    pub dma_3: bool,
    pub keypad: bool,
    /// External IRQ source
    pub game_pak: bool,
    #[skip]
    unused: B2,
}

/// If a flag is `true` then the interrupt has been requested.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct InterruptRequestFlags {
    pub vblank: bool,
    pub hblank: bool,
    pub vcounter_match: bool,
    pub timer_0: bool,
    pub timer_1: bool,
    pub timer_2: bool,
    pub timer_3: bool,
    pub serial_communication: bool,
    pub dma_0: bool,
    pub dma_1: bool,
    pub dma_2: bool,
    pub dma_3: bool,
    pub keypad: bool,
    /// External IRQ source
    pub game_pak: bool,
    #[skip]
    unused: B2,
}

#[bitfield(bits = 32)]
#[repr(u32)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct InterruptMasterEnable {
    /// If `false` all interrupts are suppressed, regardless of `IE`.
    pub interrupt_enable: bool,
    #[skip]
    unused: B31,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledge_is_write_one_to_clear() {
        let mut irq = InterruptManager::new();

        irq.request(Interrupts::Vblank);
        irq.request(Interrupts::Timer0);
        assert_eq!(u16::from(irq.flags), 0b1001);

        // Acknowledging VBlank leaves timer 0 pending.
        irq.write_if(IF_START, 0b0001);
        assert_eq!(u16::from(irq.flags), 0b1000);

        // Writing zeroes changes nothing.
        irq.write_if(IF_START, 0);
        assert_eq!(u16::from(irq.flags), 0b1000);
    }

    #[test]
    fn pending_requires_all_three_gates() {
        let mut irq = InterruptManager::new();
        assert!(!irq.pending());

        irq.request(Interrupts::Hblank);
        assert!(!irq.pending());

        irq.write_ie(IE_START, 0b10);
        assert!(!irq.pending());

        irq.write_ime(IME_START, 1);
        assert!(irq.pending());
    }
}
