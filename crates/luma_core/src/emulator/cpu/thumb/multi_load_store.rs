use crate::emulator::bus::Bus;
use crate::emulator::cpu::registers::{LINK_REG, PC_REG, SP_REG};
use crate::emulator::cpu::thumb::{ThumbInstruction, ThumbV4};
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;

impl ThumbV4 {
    /// PUSH/POP.
    ///
    /// Push lays the lowest register at the lowest address (full descending
    /// stack); pop walks the list back up. The R flag adds LR on push and PC
    /// on pop.
    pub fn push_pop_registers(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_load = instruction.check_bit(11);
        let store_lr_load_pc = instruction.check_bit(8);

        let register_list = instruction.get_bits(0, 7) as u8;
        let register_count = register_list.count_ones() + store_lr_load_pc as u32;

        if is_load {
            let mut address = cpu.read_reg(SP_REG);

            for i in 0..8u8 {
                if register_list.check_bit(i) {
                    cpu.write_reg(i as usize, bus.read_32(address), bus);
                    address = address.wrapping_add(4);
                }
            }

            cpu.write_reg(SP_REG, address.wrapping_add(store_lr_load_pc as u32 * 4), bus);

            if store_lr_load_pc {
                cpu.write_reg(PC_REG, bus.read_32(address), bus);
            }
        } else {
            let mut address = cpu.read_reg(SP_REG).wrapping_sub(register_count * 4);
            cpu.write_reg(SP_REG, address, bus);

            for i in 0..8u8 {
                if register_list.check_bit(i) {
                    bus.write_32(address, cpu.read_reg(i as usize));
                    address = address.wrapping_add(4);
                }
            }

            if store_lr_load_pc {
                bus.write_32(address, cpu.read_reg(LINK_REG));
            }
        }
    }

    /// LDMIA/STMIA with write-back to the base register.
    pub fn multiple_load_store(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_load = instruction.check_bit(11);
        let r_base = instruction.get_bits(8, 10) as usize;

        let register_list = instruction.get_bits(0, 7) as u8;
        let base_in_list = register_list.check_bit(r_base as u8);
        let final_address = cpu
            .read_reg(r_base)
            .wrapping_add(4 * register_list.count_ones());

        let mut address = cpu.read_reg(r_base);

        for i in 0..8u8 {
            if !register_list.check_bit(i) {
                continue;
            }

            let reg = i as usize;
            if is_load {
                cpu.write_reg(reg, bus.read_32(address), bus);
            } else {
                // The base stores its written-back value unless it is the
                // lowest listed register.
                let value = if reg == r_base && register_list.trailing_zeros() != i as u32 {
                    final_address
                } else {
                    cpu.read_reg(reg)
                };

                bus.write_32(address, value);
            }

            address = address.wrapping_add(4);
        }

        // A load that includes the base keeps the loaded value instead.
        if !(is_load && base_in_list) {
            cpu.write_reg(r_base, final_address, bus);
        }
    }
}
