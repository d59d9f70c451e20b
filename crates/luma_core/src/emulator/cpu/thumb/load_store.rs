use crate::emulator::bus::Bus;
use crate::emulator::cpu::registers::{PC_REG, SP_REG};
use crate::emulator::cpu::thumb::{ThumbInstruction, ThumbV4};
use crate::emulator::cpu::Cpu;
use crate::utils::{sign_extend32, BitOps};

impl ThumbV4 {
    pub fn pc_relative_load(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let r_d = instruction.get_bits(8, 10) as usize;
        let imm_value = (instruction.get_bits(0, 7) as u32) << 2;

        // The PC is always treated as word aligned for this addition.
        let address = (cpu.registers.pc() & 0xFFFF_FFFC).wrapping_add(imm_value);

        cpu.write_reg(r_d, bus.read_32(address), bus);
    }

    pub fn load_store_with_reg_offset(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_load = instruction.check_bit(11);
        let is_byte_transfer = instruction.check_bit(10);

        let r_offset = instruction.get_bits(6, 8) as usize;
        let r_base = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let target_addr = cpu.read_reg(r_base).wrapping_add(cpu.read_reg(r_offset));

        Self::load_or_store_value(cpu, bus, is_load, is_byte_transfer, r_d, target_addr);
    }

    pub fn load_store_sign_extended_byte_halfword(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let h_flag = instruction.check_bit(11);
        let is_sign_extended = instruction.check_bit(10);

        let r_offset = instruction.get_bits(6, 8) as usize;
        let r_base = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let target_addr = cpu.read_reg(r_base).wrapping_add(cpu.read_reg(r_offset));

        if is_sign_extended {
            let value = if h_flag {
                sign_extend32(bus.read_16(target_addr) as u32, 16) as u32
            } else {
                sign_extend32(bus.read(target_addr) as u32, 8) as u32
            };

            cpu.write_reg(r_d, value, bus);
        } else if h_flag {
            cpu.write_reg(r_d, bus.read_16(target_addr) as u32, bus);
        } else {
            bus.write_16(target_addr, cpu.read_reg(r_d) as u16);
        }
    }

    pub fn load_store_with_immediate_offset(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_byte_transfer = instruction.check_bit(12);
        let is_load = instruction.check_bit(11);

        // For word transfers the offset is in units of 4 bytes.
        let offset = (instruction.get_bits(6, 10) as u32) << (!is_byte_transfer as u32 * 2);
        let r_base = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let target_addr = cpu.read_reg(r_base).wrapping_add(offset);

        Self::load_or_store_value(cpu, bus, is_load, is_byte_transfer, r_d, target_addr);
    }

    pub fn load_store_halfword(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_load = instruction.check_bit(11);

        let offset = (instruction.get_bits(6, 10) as u32) << 1;
        let r_base = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let target_addr = cpu.read_reg(r_base).wrapping_add(offset);

        if is_load {
            cpu.write_reg(r_d, bus.read_16(target_addr) as u32, bus);
        } else {
            bus.write_16(target_addr, cpu.read_reg(r_d) as u16);
        }
    }

    pub fn sp_relative_load_store(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_load = instruction.check_bit(11);

        let r_d = instruction.get_bits(8, 10) as usize;
        let offset = (instruction.get_bits(0, 7) as u32) << 2;

        let target_addr = cpu.read_reg(SP_REG).wrapping_add(offset);

        if is_load {
            let value = bus.read_32(target_addr).rotate_right(8 * target_addr.get_bits(0, 1));
            cpu.write_reg(r_d, value, bus);
        } else {
            bus.write_32(target_addr, cpu.read_reg(r_d));
        }
    }

    pub fn load_address(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let source_is_sp = instruction.check_bit(11);

        let r_d = instruction.get_bits(8, 10) as usize;
        let constant = (instruction.get_bits(0, 7) as u32) << 2;

        let base = if source_is_sp {
            cpu.read_reg(SP_REG)
        } else {
            cpu.read_reg(PC_REG) & 0xFFFF_FFFC
        };

        cpu.write_reg(r_d, base.wrapping_add(constant), bus);
    }

    pub fn add_offset_to_stack_pointer(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let offset_is_negative = instruction.check_bit(7);
        let offset = (instruction.get_bits(0, 6) as u32) << 2;

        let new_sp = if offset_is_negative {
            cpu.read_reg(SP_REG).wrapping_sub(offset)
        } else {
            cpu.read_reg(SP_REG).wrapping_add(offset)
        };

        cpu.write_reg(SP_REG, new_sp, bus);
    }

    #[inline(always)]
    fn load_or_store_value(
        cpu: &mut Cpu,
        bus: &mut Bus,
        is_load: bool,
        is_byte_transfer: bool,
        r_d: usize,
        target_addr: u32,
    ) {
        if is_load {
            if is_byte_transfer {
                cpu.write_reg(r_d, bus.read(target_addr) as u32, bus);
            } else {
                // Unaligned word loads rotate, exactly as their ARM cousins.
                let value = bus.read_32(target_addr).rotate_right(8 * target_addr.get_bits(0, 1));
                cpu.write_reg(r_d, value, bus);
            }
        } else if is_byte_transfer {
            bus.write(target_addr, cpu.read_reg(r_d) as u8);
        } else {
            bus.write_32(target_addr, cpu.read_reg(r_d));
        }
    }
}
