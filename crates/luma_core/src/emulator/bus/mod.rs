pub use bios::BiosData;

use crate::emulator::bus::bios::Bios;
use crate::emulator::bus::dma::{
    DmaAddrControlDest, DmaAddrControlSrc, DmaChannels, DmaTransferType, DMA_0_ADDR_START, DMA_3_ADDR_END,
};
use crate::emulator::bus::interrupts::{InterruptManager, Interrupts, IE_END, IE_START, IF_END, IF_START, IME_END, IME_START};
use crate::emulator::bus::keypad::{Keypad, KEYINTERRUPT_END, KEYINTERRUPT_START, KEYSTATUS_END, KEYSTATUS_START};
use crate::emulator::bus::system_control::{SystemControl, WAIT_CNT_END, WAIT_CNT_START};
use crate::emulator::bus::timers::Timers;
use crate::emulator::cartridge::Cartridge;
use crate::emulator::ppu::{Ppu, LCD_IO_END};
use crate::emulator::{AlignedAddress, MemoryAddress};
use crate::scheduler::Scheduler;

pub const IO_START: MemoryAddress = 0x0400_0000;

pub mod bios;
pub mod dma;
pub mod interrupts;
pub mod keypad;
pub mod ram;
pub mod system_control;
pub mod timers;

/// The memory gateway tying all components together.
///
/// Addresses are masked to 28 bits and demultiplexed on the top nibble;
/// every multi-byte access is first aligned down to its own width.
pub struct Bus {
    pub bios: Bios,
    pub rom: Cartridge,
    pub interrupts: InterruptManager,
    pub timers: Timers,
    pub keypad: Keypad,
    pub ram: ram::WorkRam,
    pub dma: DmaChannels,
    pub system_control: SystemControl,
    pub ppu: Ppu,
    pub scheduler: Scheduler,
}

impl Bus {
    pub fn new(rom: Cartridge, bios: Box<BiosData>) -> Self {
        let mut result = Self {
            bios: Bios::new(bios),
            rom,
            interrupts: InterruptManager::new(),
            timers: Timers::new(),
            keypad: Keypad::default(),
            ram: ram::WorkRam::new(),
            dma: DmaChannels::new(),
            system_control: SystemControl::new(),
            ppu: Ppu::new(),
            scheduler: Scheduler::new(),
        };

        result.ppu.initial_startup(&mut result.scheduler);

        result
    }

    #[inline]
    pub fn read_32(&self, addr: MemoryAddress) -> u32 {
        let addr = align::<4>(addr);

        u32::from_le_bytes([
            self.read(addr),
            self.read(addr.wrapping_add(1)),
            self.read(addr.wrapping_add(2)),
            self.read(addr.wrapping_add(3)),
        ])
    }

    #[inline]
    pub fn read_16(&self, addr: MemoryAddress) -> u16 {
        let addr = align::<2>(addr);

        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    #[inline]
    pub fn read(&self, addr: MemoryAddress) -> u8 {
        let addr = mask_bus_address(addr);
        crate::bus_log!("Reading from {:#X}", addr);

        match memory_range(addr) {
            0x0 if Bios::is_in_bios_region(addr) => self.bios.read(addr),
            0x2 => self.ram.read_board(addr),
            0x3 => self.ram.read_chip(addr),
            0x4 => self.read_io(addr),
            0x5 => self.ppu.read_palette(addr),
            0x6 => self.ppu.read_vram(addr),
            0x7 => self.ppu.read_oam(addr),
            0x8..=0xD => self.rom.read(addr),
            _ => self.unmapped_read(addr),
        }
    }

    pub fn write_32(&mut self, addr: MemoryAddress, data: u32) {
        let addr = align::<4>(addr);
        let data = data.to_le_bytes();

        self.write_16(addr, u16::from_le_bytes([data[0], data[1]]));
        self.write_16(addr.wrapping_add(2), u16::from_le_bytes([data[2], data[3]]));
    }

    pub fn write_16(&mut self, addr: MemoryAddress, data: u16) {
        let addr = align::<2>(mask_bus_address(addr));

        match memory_range(addr) {
            0x5 => self.ppu.write_palette_16(addr, data),
            0x6 => self.ppu.write_vram_16(addr, data),
            0x7 => self.ppu.write_oam_16(addr, data),
            _ => {
                let data = data.to_le_bytes();
                self.write(addr, data[0]);
                self.write(addr.wrapping_add(1), data[1]);
            }
        }
    }

    pub fn write(&mut self, addr: MemoryAddress, data: u8) {
        let addr = mask_bus_address(addr);
        crate::bus_log!("Writing to {:#X} - Value: {:#X}", addr, data);

        match memory_range(addr) {
            0x0 => {
                crate::bus_log!("Dropped BIOS write: {:#X} - Data: {:#X}", addr, data);
            }
            0x2 => self.ram.write_board(addr, data),
            0x3 => self.ram.write_chip(addr, data),
            0x4 => self.write_io(addr, data),
            0x5 => self.ppu.write_palette(addr, data),
            0x6 => self.ppu.write_vram(addr, data),
            0x7 => {
                // 8 bit OAM writes are ignored
                crate::bus_log!("Ignored 8 bit OAM write to address: {:#X} with value: {}", addr, data);
            }
            0x8..=0xD => {
                crate::bus_log!("Dropped ROM write: {:#X} - Data: {:#X}", addr, data);
            }
            _ => {
                log::warn!("Dropped write of {:#04X} to unmapped address {:#010X}", data, addr);
            }
        }
    }

    #[inline]
    fn read_io(&self, addr: AlignedAddress) -> u8 {
        match addr {
            IO_START..=LCD_IO_END => self.ppu.read_io(addr),
            DMA_0_ADDR_START..=DMA_3_ADDR_END => self.dma.read_channel(addr),
            timers::TIMER_IO_START..=timers::TIMER_IO_END => self.timers.read_registers(addr),
            KEYSTATUS_START..=KEYSTATUS_END => self.keypad.read_status(addr),
            KEYINTERRUPT_START..=KEYINTERRUPT_END => self.keypad.read_interrupt_control(addr),
            IE_START..=IE_END => self.interrupts.read_ie(addr),
            IF_START..=IF_END => self.interrupts.read_if(addr),
            WAIT_CNT_START..=WAIT_CNT_END => self.system_control.read_wait_cnt(addr),
            IME_START..=IME_END => self.interrupts.read_ime(addr),
            _ => {
                crate::bus_log!("Unhandled IO read from {:#X}", addr);
                0xFF
            }
        }
    }

    #[inline]
    fn write_io(&mut self, addr: AlignedAddress, data: u8) {
        match addr {
            IO_START..=LCD_IO_END => self.ppu.write_io(addr, data),
            DMA_0_ADDR_START..=DMA_3_ADDR_END => {
                if let Some(channel) = self.dma.write_channel(addr, data) {
                    self.run_dma(channel);
                }
            }
            timers::TIMER_IO_START..=timers::TIMER_IO_END => self.timers.write_registers(addr, data),
            KEYSTATUS_START..=KEYSTATUS_END => {
                crate::bus_log!("Ignored write to keypad status register: {}", data);
            }
            KEYINTERRUPT_START..=KEYINTERRUPT_END => {
                self.keypad.write_interrupt_control(addr, data);
                self.keypad.check_interrupts(&mut self.interrupts);
            }
            IE_START..=IE_END => self.interrupts.write_ie(addr, data),
            IF_START..=IF_END => self.interrupts.write_if(addr, data),
            WAIT_CNT_START..=WAIT_CNT_END => self.system_control.write_wait_cnt(addr, data),
            IME_START..=IME_END => self.interrupts.write_ime(addr, data),
            _ => {
                crate::bus_log!("Dropped IO write of {:#04X} to {:#X}", data, addr);
            }
        }
    }

    /// Service an immediate DMA transfer on the given channel.
    ///
    /// Runs synchronously between the triggering register write and the next
    /// CPU instruction, which matches the observable ordering on hardware
    /// closely enough for the immediate start timing.
    fn run_dma(&mut self, channel_idx: usize) {
        let channel = *self.dma.channel(channel_idx);
        let control = channel.control();

        let unit = match control.transfer_type() {
            DmaTransferType::Bit16 => 2u32,
            DmaTransferType::Bit32 => 4u32,
        };
        let count = channel.transfer_count(channel_idx);

        crate::bus_log!(
            "DMA{} transfer of {} units of {} bytes: {:#010X} -> {:#010X}",
            channel_idx,
            count,
            unit,
            channel.source_address,
            channel.dest_address
        );

        let mut source = channel.source_address;
        let mut dest = channel.dest_address;

        for _ in 0..count {
            match unit {
                2 => {
                    let value = self.read_16(source);
                    self.write_16(dest, value);
                }
                _ => {
                    let value = self.read_32(source);
                    self.write_32(dest, value);
                }
            }

            source = match control.src_addr_control() {
                DmaAddrControlSrc::Increment => source.wrapping_add(unit),
                DmaAddrControlSrc::Decrement => source.wrapping_sub(unit),
                // `Prohibited` behaves like a fixed source.
                DmaAddrControlSrc::Fixed | DmaAddrControlSrc::Prohibited => source,
            };
            dest = match control.dest_addr_control() {
                DmaAddrControlDest::Increment | DmaAddrControlDest::IncrReload => dest.wrapping_add(unit),
                DmaAddrControlDest::Decrement => dest.wrapping_sub(unit),
                DmaAddrControlDest::Fixed => dest,
            };
        }

        // Immediate transfers disable themselves on completion; only the
        // periodic start timings honor the repeat bit.
        self.dma.channel_mut(channel_idx).set_enabled(false);

        if control.irq_on_end_of_word_count() {
            const DMA_INTERRUPTS: [Interrupts; 4] =
                [Interrupts::Dma0, Interrupts::Dma1, Interrupts::Dma2, Interrupts::Dma3];

            self.interrupts.request(DMA_INTERRUPTS[channel_idx]);
        }
    }

    fn unmapped_read(&self, addr: MemoryAddress) -> u8 {
        crate::bus_log!("Unmapped read from {:#010X}", addr);
        0xFF
    }
}

/// Align `addr` down to a `WIDTH`-byte boundary.
#[inline(always)]
const fn align<const WIDTH: u32>(addr: MemoryAddress) -> AlignedAddress {
    addr & !(WIDTH - 1)
}

/// The top nibble of the 28-bit bus address selects the memory region.
#[inline(always)]
const fn memory_range(addr: MemoryAddress) -> u32 {
    addr >> 24
}

#[inline(always)]
const fn mask_bus_address(addr: MemoryAddress) -> MemoryAddress {
    addr & 0x0FFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_bus() -> Bus {
        let bios = crate::box_array![0; bios::BIOS_SIZE];
        Bus::new(Cartridge::new(vec![0; 0x200]), bios)
    }

    #[test]
    fn work_ram_is_little_endian() {
        let mut bus = empty_bus();

        bus.write_32(0x0200_0000, 0xFEED_BEEF);

        assert_eq!(bus.read_32(0x0200_0000), 0xFEED_BEEF);
        assert_eq!(bus.read_16(0x0200_0000), 0xBEEF);
        assert_eq!(bus.read(0x0200_0000), 0xEF);
    }

    #[test]
    fn multi_byte_accesses_align_down() {
        let mut bus = empty_bus();

        bus.write_32(0x0300_0000, 0x1122_3344);
        assert_eq!(bus.read_32(0x0300_0002), 0x1122_3344);
        assert_eq!(bus.read_16(0x0300_0003), 0x3344);
    }

    #[test]
    fn unmapped_reads_return_all_ones() {
        let bus = empty_bus();

        assert_eq!(bus.read(0x0100_0000), 0xFF);
        assert_eq!(bus.read_16(0x0100_0000), 0xFFFF);
        assert_eq!(bus.read_32(0x0100_0000), 0xFFFF_FFFF);
    }

    #[test]
    fn immediate_dma_copies_words() {
        let mut bus = empty_bus();

        for i in 0..4u32 {
            bus.write_32(0x0200_0000 + i * 4, 0xAA00_0000 | i);
        }

        // Source, destination, 4 words, 32-bit immediate transfer + enable.
        bus.write_32(0x0400_00B0, 0x0200_0000);
        bus.write_32(0x0400_00B4, 0x0300_0000);
        bus.write_16(0x0400_00B8, 4);
        bus.write_16(0x0400_00BA, 0b1000_0100_0000_0000);

        for i in 0..4u32 {
            assert_eq!(bus.read_32(0x0300_0000 + i * 4), 0xAA00_0000 | i);
        }
        // The enable bit cleared itself.
        assert_eq!(bus.read_16(0x0400_00BA) & 0x8000, 0);
    }
}
