use crate::emulator::ppu::{Ppu, VRAM_SIZE};
use crate::emulator::MemoryAddress;
use crate::utils::BitOps;

pub const PALETTE_START: MemoryAddress = 0x0500_0000;
pub const PALETTE_END: MemoryAddress = 0x0500_03FF;
pub const LCD_VRAM_START: MemoryAddress = 0x0600_0000;
pub const LCD_VRAM_END: MemoryAddress = 0x0601_7FFF;
pub const OAM_START: MemoryAddress = 0x0700_0000;
pub const OAM_END: MemoryAddress = 0x0700_03FF;

impl Ppu {
    #[inline]
    pub fn read_io(&self, address: MemoryAddress) -> u8 {
        // Note that IO is not mirrored, therefore a subtract instead of a modulo
        let offset = (address - super::LCD_IO_START) as usize;

        match offset {
            0x0..=0x1 => u16::from(self.disp_cnt).byte_le(offset % 2),
            0x2..=0x3 => self.green_swap.byte_le(offset % 2),
            0x4..=0x5 => u16::from(self.disp_stat).byte_le(offset % 2),
            0x6..=0x7 => u16::from(self.vertical_counter).byte_le(offset % 2),
            0x8..=0xF => u16::from(self.bg_control[(offset - 0x8) / 2]).byte_le(offset % 2),
            _ => {
                crate::ppu_log!("Unimplemented IO read at {:08X}", address);
                0xFF
            }
        }
    }

    #[inline]
    pub fn write_io(&mut self, address: MemoryAddress, value: u8) {
        let offset = (address - super::LCD_IO_START) as usize;

        match offset {
            0x0..=0x1 => self.disp_cnt = u16::from(self.disp_cnt).change_byte_le(offset % 2, value).into(),
            0x2..=0x3 => self.green_swap = self.green_swap.change_byte_le(offset % 2, value),
            0x4 => {
                // DISPSTAT bits 0..=2 belong to the PPU state machine.
                let preserved = u16::from(self.disp_stat) as u8 & 0b111;
                let merged = (value & !0b111) | preserved;
                self.disp_stat = u16::from(self.disp_stat).change_byte_le(0, merged).into();
            }
            0x5 => self.disp_stat = u16::from(self.disp_stat).change_byte_le(1, value).into(),
            0x6..=0x7 => {
                // Vertical counter is read only
            }
            0x8..=0xF => {
                let index = (offset - 0x8) / 2;
                self.bg_control[index] = u16::from(self.bg_control[index])
                    .change_byte_le(offset % 2, value)
                    .into();
            }
            _ => {
                crate::ppu_log!("Dropped IO write of {:02X} at {:08X}", value, address);
            }
        }
    }

    #[inline]
    pub fn read_palette(&self, address: MemoryAddress) -> u8 {
        self.palette.read(address)
    }

    #[inline]
    pub fn write_palette(&mut self, address: MemoryAddress, value: u8) {
        self.palette.write(address, value);
    }

    #[inline]
    pub fn write_palette_16(&mut self, address: MemoryAddress, value: u16) {
        self.palette.write_16(address, value);
    }

    #[inline]
    pub fn read_vram(&self, address: MemoryAddress) -> u8 {
        self.vram[vram_addr_to_index(address)]
    }

    /// Byte writes to VRAM land in both halves of the addressed halfword.
    #[inline]
    pub fn write_vram(&mut self, address: MemoryAddress, value: u8) {
        self.write_vram_16(address, u16::from_le_bytes([value, value]));
    }

    #[inline]
    pub fn write_vram_16(&mut self, address: MemoryAddress, value: u16) {
        let addr = vram_addr_to_index(address) & !0b1;
        let data = value.to_le_bytes();

        self.vram[addr] = data[0];
        self.vram[addr + 1] = data[1];
    }

    #[inline]
    pub fn read_oam(&self, address: MemoryAddress) -> u8 {
        self.oam.read(address)
    }

    #[inline]
    pub fn write_oam_16(&mut self, address: MemoryAddress, value: u16) {
        self.oam.write_16(address, value);
    }
}

/// VRAM mirroring is awkward at 64KB + 32KB + 32KB, where the two 32KB
/// blocks mirror each other.
#[inline(always)]
fn vram_addr_to_index(address: MemoryAddress) -> usize {
    let mut addr = (address & 0x1FFFF) as usize;

    if addr >= VRAM_SIZE {
        addr -= 0x8000;
    }

    addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::ppu::Ppu;

    #[test]
    fn vram_mirror_gap_folds_down() {
        let mut ppu = Ppu::new();

        ppu.write_vram_16(0x0601_0000, 0xBEEF);
        assert_eq!(ppu.read_vram(0x0601_8000), 0xEF);
        assert_eq!(ppu.read_vram(0x0601_8001), 0xBE);
    }

    #[test]
    fn vram_byte_writes_duplicate_into_halfword() {
        let mut ppu = Ppu::new();

        ppu.write_vram(0x0600_0001, 0x42);
        assert_eq!(ppu.read_vram(0x0600_0000), 0x42);
        assert_eq!(ppu.read_vram(0x0600_0001), 0x42);
    }

    #[test]
    fn dispstat_writes_preserve_status_bits() {
        let mut ppu = Ppu::new();
        ppu.disp_stat.set_v_blank_flag(true);
        ppu.disp_stat.set_h_blank_flag(true);

        ppu.write_io(0x0400_0004, 0xFF);

        let raw = u16::from(ppu.disp_stat);
        // Enable bits stuck, status bits kept their machine-driven values.
        assert_eq!(raw & 0b111, 0b011);
        assert_eq!(raw & 0b11_1000, 0b11_1000);
    }
}
