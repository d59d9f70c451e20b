use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::common::common_behaviour;
use crate::emulator::cpu::registers::{LINK_REG, PC_REG};
use crate::emulator::cpu::Cpu;
use crate::utils::{sign_extend32, BitOps};

impl ArmV4 {
    pub fn branch_and_exchange(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        let r_n = instruction.get_bits(0, 3) as usize;
        let target = cpu.read_reg(r_n);

        common_behaviour::branch_and_exchange(cpu, target, bus);
    }

    /// B and BL; the link bit is part of the LUT index.
    pub fn branch_and_link<const IS_LINK: bool>(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        let offset = sign_extend32(instruction.get_bits(0, 23), 24) << 2;
        let pc = cpu.read_reg(PC_REG);

        if IS_LINK {
            // The PC reads two instructions ahead; the return address is the
            // very next one.
            cpu.write_reg(LINK_REG, pc.wrapping_sub(4), bus);
        }

        cpu.write_reg(PC_REG, pc.wrapping_add(offset as u32), bus);
    }
}
