use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;

impl ArmV4 {
    /// `MUL` and `MLA`.
    pub fn multiply(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        let accumulate = instruction.check_bit(21);
        let set_condition = instruction.check_bit(20);
        let r_d = instruction.get_bits(16, 19) as usize;
        let r_add = instruction.get_bits(12, 15) as usize;
        let r_1 = instruction.get_bits(8, 11) as usize;
        let r_2 = instruction.get_bits(0, 3) as usize;

        // Multiplying the accumulate flag in elides a branch.
        let result = cpu
            .read_reg(r_1)
            .wrapping_mul(cpu.read_reg(r_2))
            .wrapping_add(accumulate as u32 * cpu.read_reg(r_add));
        cpu.write_reg(r_d, result, bus);

        if set_condition {
            // The carry flag is left at a meaningless value.
            cpu.set_zero_and_sign(result);
        }
    }

    /// `UMULL`, `UMLAL`, `SMULL` and `SMLAL`.
    pub fn multiply_long(cpu: &mut Cpu, instruction: ArmInstruction, _bus: &mut Bus) {
        let signed = instruction.check_bit(22);
        let accumulate = instruction.check_bit(21);
        let set_condition = instruction.check_bit(20);
        let r_high = instruction.get_bits(16, 19) as usize;
        let r_low = instruction.get_bits(12, 15) as usize;
        let r_1 = instruction.get_bits(8, 11) as usize;
        let r_2 = instruction.get_bits(0, 3) as usize;

        let registers = &mut cpu.registers.general_purpose;

        let result = if signed {
            let product = registers[r_1] as i32 as i64 * registers[r_2] as i32 as i64;

            if accumulate {
                // The low register must not be sign extended here, otherwise
                // it would bleed into the high word during the bitwise or.
                product.wrapping_add(((registers[r_high] as i64) << 32) | registers[r_low] as i64) as u64
            } else {
                product as u64
            }
        } else {
            let product = registers[r_1] as u64 * registers[r_2] as u64;

            if accumulate {
                product.wrapping_add(((registers[r_high] as u64) << 32) | registers[r_low] as u64)
            } else {
                product
            }
        };

        registers[r_high] = (result >> 32) as u32;
        registers[r_low] = result as u32;

        if set_condition {
            // Carry and overflow are left at meaningless values.
            cpu.registers.cpsr.set_sign(result.check_bit(63));
            cpu.registers.cpsr.set_zero(result == 0);
        }
    }
}
