use crate::emulator::MemoryAddress;
use crate::utils::BitOps;
use modular_bitfield::prelude::B5;
use modular_bitfield::{bitfield, BitfieldSpecifier};

pub const DMA_CHANNEL_SIZE: usize = 12;
pub const DMA_DEST_ADDR_OFFSET: usize = 4;
pub const DMA_WORD_CNT_OFFSET: usize = 8;
pub const DMA_CONTROL_OFFSET: usize = 10;

pub const DMA_0_ADDR_START: MemoryAddress = 0x0400_00B0;
pub const DMA_3_ADDR_END: MemoryAddress = 0x0400_00DF;

/// Maximum transfer length per channel when the word count is written as 0.
const DMA_MAX_COUNT: [u32; 4] = [0x4000, 0x4000, 0x4000, 0x1_0000];

pub struct DmaChannels {
    /// DMA0 has the highest priority; DMA3 may write to the game pak bus.
    /// Beyond that each channel is general purpose.
    channels: [DmaChannel; 4],
}

impl DmaChannels {
    pub fn new() -> Self {
        Self {
            channels: [DmaChannel::new(); 4],
        }
    }

    pub fn channel(&self, channel: usize) -> &DmaChannel {
        &self.channels[channel]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut DmaChannel {
        &mut self.channels[channel]
    }

    /// Route a byte write to the owning channel.
    ///
    /// Returns the channel index when the write flipped the enable bit on
    /// with immediate start timing, in which case the caller must service the
    /// transfer before the CPU gets to run again.
    #[inline]
    pub fn write_channel(&mut self, address: MemoryAddress, value: u8) -> Option<usize> {
        let channel = ((address - DMA_0_ADDR_START) as usize) / DMA_CHANNEL_SIZE;
        let offset = ((address - DMA_0_ADDR_START) as usize) % DMA_CHANNEL_SIZE;

        let triggered = self.channels[channel].write(offset, value);

        triggered.then_some(channel)
    }

    pub fn read_channel(&self, address: MemoryAddress) -> u8 {
        let channel = ((address - DMA_0_ADDR_START) as usize) / DMA_CHANNEL_SIZE;
        let offset = ((address - DMA_0_ADDR_START) as usize) % DMA_CHANNEL_SIZE;

        self.channels[channel].read(offset)
    }
}

impl Default for DmaChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DmaChannel {
    pub source_address: MemoryAddress,
    pub dest_address: MemoryAddress,
    pub word_count: u16,
    control: DmaControl,
}

impl DmaChannel {
    pub fn new() -> Self {
        Self {
            source_address: 0,
            dest_address: 0,
            word_count: 0,
            control: DmaControl::new(),
        }
    }

    /// Returns `true` when this write demands an immediate transfer.
    #[inline]
    fn write(&mut self, offset: usize, value: u8) -> bool {
        match offset {
            0..=3 => self.source_address = self.source_address.change_byte_le(offset, value),
            DMA_DEST_ADDR_OFFSET..=7 => {
                self.dest_address = self.dest_address.change_byte_le(offset - DMA_DEST_ADDR_OFFSET, value)
            }
            DMA_WORD_CNT_OFFSET..=9 => {
                self.word_count = self.word_count.change_byte_le(offset - DMA_WORD_CNT_OFFSET, value)
            }
            DMA_CONTROL_OFFSET..=11 => {
                let was_enabled = self.control.enabled();
                self.control = u16::from(self.control)
                    .change_byte_le(offset - DMA_CONTROL_OFFSET, value)
                    .into();

                return self.control.enabled()
                    && !was_enabled
                    && self.control.start_timing() == DmaStartTiming::Immediately;
            }
            _ => unreachable!(),
        }

        false
    }

    /// Source/destination addresses and the word count are write only on
    /// hardware; reads observe zeroes there and the live control register.
    fn read(&self, offset: usize) -> u8 {
        match offset {
            0..=9 => 0,
            DMA_CONTROL_OFFSET..=11 => u16::from(self.control).byte_le(offset - DMA_CONTROL_OFFSET),
            _ => unreachable!(),
        }
    }

    #[inline]
    pub fn control(&self) -> DmaControl {
        self.control
    }

    /// The number of units this transfer moves; 0 selects the channel maximum.
    pub fn transfer_count(&self, channel: usize) -> u32 {
        if self.word_count == 0 {
            DMA_MAX_COUNT[channel]
        } else {
            self.word_count as u32
        }
    }

    pub fn set_enabled(&mut self, value: bool) {
        self.control.set_enabled(value);
    }
}

#[bitfield(bits = 16)]
#[repr(u16)]
#[derive(Debug, Copy, Clone)]
pub struct DmaControl {
    #[skip]
    unused: B5,
    pub dest_addr_control: DmaAddrControlDest,
    pub src_addr_control: DmaAddrControlSrc,
    /// (Must be zero if bit 11 set)
    pub repeat: bool,
    pub transfer_type: DmaTransferType,
    /// DMA3 only: 0 = Normal, 1 = DRQ from game pak.
    pub game_pak_drq: bool,
    /// Timings other than `Immediately` are stored but not yet serviced.
    pub start_timing: DmaStartTiming,
    pub irq_on_end_of_word_count: bool,
    pub enabled: bool,
}

#[derive(Debug, BitfieldSpecifier, PartialEq, Clone, Copy)]
#[bits = 2]
pub enum DmaAddrControlDest {
    Increment = 0b00,
    Decrement = 0b01,
    Fixed = 0b10,
    IncrReload = 0b11,
}

#[derive(Debug, BitfieldSpecifier, PartialEq, Clone, Copy)]
#[bits = 2]
pub enum DmaAddrControlSrc {
    Increment = 0b00,
    Decrement = 0b01,
    Fixed = 0b10,
    Prohibited = 0b11,
}

#[derive(Debug, BitfieldSpecifier, PartialEq, Clone, Copy)]
#[bits = 1]
pub enum DmaTransferType {
    Bit16 = 0b0,
    Bit32 = 0b1,
}

#[derive(Debug, BitfieldSpecifier, PartialEq, Clone, Copy)]
#[bits = 2]
pub enum DmaStartTiming {
    Immediately = 0b00,
    VBlank = 0b01,
    HBlank = 0b10,
    Special = 0b11,
}
