use crate::emulator::MemoryAddress;
use crate::utils::BitOps;
use modular_bitfield::prelude::*;

pub const WAIT_CNT_START: MemoryAddress = 0x0400_0204;
pub const WAIT_CNT_END: MemoryAddress = 0x0400_0205;

/// Miscellaneous system registers.
///
/// `WAITCNT` is storage only for now; wait states are not modelled.
pub struct SystemControl {
    pub wait_cnt: WaitControl,
}

impl SystemControl {
    pub fn new() -> Self {
        Self {
            wait_cnt: WaitControl::new(),
        }
    }

    pub fn read_wait_cnt(&self, addr: MemoryAddress) -> u8 {
        u16::from(self.wait_cnt).byte_le((addr - WAIT_CNT_START) as usize)
    }

    pub fn write_wait_cnt(&mut self, addr: MemoryAddress, value: u8) {
        self.wait_cnt = u16::from(self.wait_cnt)
            .change_byte_le((addr - WAIT_CNT_START) as usize, value)
            .into();
    }
}

impl Default for SystemControl {
    fn default() -> Self {
        Self::new()
    }
}

#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct WaitControl {
    pub sram_wait: B2,
    pub wait_state_0_first: B2,
    pub wait_state_0_second: B1,
    pub wait_state_1_first: B2,
    pub wait_state_1_second: B1,
    pub wait_state_2_first: B2,
    pub wait_state_2_second: B1,
    pub phi_terminal_output: B2,
    #[skip]
    unused: B1,
    pub prefetch_buffer: bool,
    /// (Read only) game pak type flag.
    pub game_pak_type: bool,
}
