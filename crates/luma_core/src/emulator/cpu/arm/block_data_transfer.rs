use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::registers::{Mode, PC_REG};
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;

impl ArmV4 {
    pub fn block_data_transfer_store(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Block Data Store");
        // A stored R15 reads as the instruction address plus 12.
        cpu.registers.general_purpose[PC_REG] += 4;
        Self::block_data_transfer(cpu, instruction, bus, false);
        cpu.registers.general_purpose[PC_REG] -= 4;
    }

    pub fn block_data_transfer_load(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Block Data Load");
        Self::block_data_transfer(cpu, instruction, bus, true);
    }

    /// LDM/STM.
    ///
    /// The register list is always walked in ascending order; the addressing
    /// mode only determines the address window and whether the bump happens
    /// before or after each transfer.
    fn block_data_transfer(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus, is_load: bool) {
        let is_preindexed = instruction.check_bit(24);
        let is_up = instruction.check_bit(23);
        let psr_or_user = instruction.check_bit(22);
        let has_writeback = instruction.check_bit(21);

        let register_list = instruction.get_bits(0, 15) as u16;
        let register_count = register_list.count_ones();
        let reg_base = instruction.get_bits(16, 19) as usize;
        let base_in_list = register_list.check_bit(reg_base as u8);

        let base_address = cpu.read_reg(reg_base);
        let mut address = base_address;
        let final_address;

        if is_up {
            final_address = base_address.wrapping_add(4 * register_count);
        } else {
            final_address = base_address.wrapping_sub(4 * register_count);
            // Descending modes still transfer lowest-register-first; shift
            // the window so the pre/post bump below lands on the right slots.
            address = if is_preindexed {
                final_address.wrapping_sub(4)
            } else {
                final_address.wrapping_add(4)
            };
        }

        // With the S bit set, LDM with R15 restores the SPSR; every other
        // S-flavour transfers the user bank instead of the current mode's.
        let transfers_user_bank = psr_or_user && !(is_load && register_list.check_bit(15));
        let old_mode = cpu.registers.cpsr.mode();
        let swapped_banks = transfers_user_bank && cpu.registers.swap_register_banks(old_mode, Mode::User, false);

        for i in 0..16u8 {
            if !register_list.check_bit(i) {
                continue;
            }

            if is_preindexed {
                address = address.wrapping_add(4);
            }

            let reg = i as usize;
            if is_load {
                let value = bus.read_32(address);

                if reg == PC_REG && psr_or_user {
                    cpu.restore_cpsr_from_spsr();
                }

                cpu.write_reg(reg, value, bus);
            } else {
                // A base register that is not the lowest listed one stores
                // the written-back value; the lowest stores the original.
                let value = if reg == reg_base && has_writeback && register_list.trailing_zeros() != reg as u32 {
                    final_address
                } else {
                    cpu.read_reg(reg)
                };

                bus.write_32(address, value);
            }

            if !is_preindexed {
                address = address.wrapping_add(4);
            }
        }

        if swapped_banks {
            cpu.registers.swap_register_banks(Mode::User, old_mode, false);
        }

        // A load that includes the base keeps the loaded value.
        if has_writeback && !(is_load && base_in_list) {
            cpu.write_reg(reg_base, final_address, bus);
        }
    }
}
