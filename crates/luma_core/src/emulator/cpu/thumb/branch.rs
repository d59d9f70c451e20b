use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::common_behaviour;
use crate::emulator::cpu::registers::{LINK_REG, PC_REG};
use crate::emulator::cpu::thumb::{ThumbInstruction, ThumbV4};
use crate::emulator::cpu::Cpu;
use crate::utils::{sign_extend32, BitOps};

impl ThumbV4 {
    pub fn hi_reg_op_branch_exchange(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let opcode = instruction.get_bits(8, 9);
        let h1 = instruction.check_bit(7);
        let h2 = instruction.check_bit(6);
        // The H flags extend the three-bit register fields into R8-R15.
        let r_d = instruction.get_bits(0, 2) as usize + (h1 as usize * 8);
        let r_s = instruction.get_bits(3, 5) as usize + (h2 as usize * 8);

        let op1 = cpu.read_reg(r_d);
        let op2 = cpu.read_reg(r_s);

        match opcode {
            // ADD, flags are never written.
            0b00 => {
                let result = common_behaviour::add(cpu, op1, op2, false);
                cpu.write_reg(r_d, result, bus);
            }
            // CMP, the only flag writer in this group.
            0b01 => {
                let _ = common_behaviour::sub(cpu, op1, op2, true);
            }
            // MOV
            0b10 => {
                cpu.write_reg(r_d, op2, bus);
            }
            // BX
            0b11 => {
                common_behaviour::branch_and_exchange(cpu, op2, bus);
            }
            _ => unreachable!(),
        }
    }

    pub fn conditional_branch(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let condition = instruction.get_bits(8, 11) as u8;

        if common_behaviour::check_condition(&cpu.registers.cpsr, condition) {
            let offset = sign_extend32(instruction.get_bits(0, 7) as u32, 8) << 1;
            let pc = cpu.read_reg(PC_REG);

            cpu.write_reg(PC_REG, pc.wrapping_add(offset as u32), bus);
        }
    }

    pub fn software_interrupt(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let comment = instruction.get_bits(0, 7) as u8;

        cpu.software_interrupt(bus, comment);
    }

    pub fn unconditional_branch(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let offset = sign_extend32(instruction.get_bits(0, 10) as u32, 11) << 1;
        let pc = cpu.read_reg(PC_REG);

        cpu.write_reg(PC_REG, pc.wrapping_add(offset as u32), bus);
    }

    /// The first half of a BL pair.
    ///
    /// The pair is resolved here at execution time by fetching the second
    /// half at `PC - 2`; fusing at decode would use a stale partner when an
    /// interrupt separates the two.
    pub fn long_branch_with_link(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let pc = cpu.read_reg(PC_REG);
        // `PC - 2` is the address of the second half of the pair.
        let second = bus.read_16(pc.wrapping_sub(2));

        // Upper part of the offset, bits 22..=12 of a sign-extended 23-bit
        // branch distance.
        let offset_high = sign_extend32(instruction.get_bits(0, 10) as u32, 11) << 12;
        let offset_low = (second.get_bits(0, 10) as u32) << 1;

        let link_base = pc.wrapping_add(offset_high as u32);
        let target = link_base.wrapping_add(offset_low);

        // The return address is the instruction after the pair, with bit 0
        // flagging THUMB state.
        cpu.write_reg(LINK_REG, pc | 0b1, bus);
        cpu.write_reg(PC_REG, target, bus);
    }

    /// A second BL half executing on its own, e.g. after an interrupt landed
    /// between the two halves.
    pub fn long_branch_with_link_second(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let pc = cpu.read_reg(PC_REG);
        let offset_low = (instruction.get_bits(0, 10) as u32) << 1;

        let target = cpu.read_reg(LINK_REG).wrapping_add(offset_low);

        // The address of this half plus 2, i.e. the following instruction.
        cpu.write_reg(LINK_REG, pc.wrapping_sub(2) | 0b1, bus);
        cpu.write_reg(PC_REG, target, bus);
    }
}
