use crate::emulator::bus::Bus;
use crate::emulator::cpu::common::{common_behaviour, ShiftType};
use crate::emulator::cpu::thumb::{ThumbInstruction, ThumbV4};
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;
use num_traits::FromPrimitive;

impl ThumbV4 {
    pub fn move_shifted_reg(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let shift_type = ShiftType::from_u16(instruction.get_bits(11, 12)).unwrap();
        let offset = instruction.get_bits(6, 10) as u8;
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        // An encoded shift of 0 means 32 for the right shifts, exactly as in
        // the ARM immediate-shift field.
        let (value, carry) = shift_type.shift_immediate(cpu.read_reg(r_s), offset, cpu.registers.cpsr.carry());

        cpu.write_reg(r_d, value, bus);
        cpu.set_logical_flags(value, carry);
    }

    pub fn add_subtract(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let is_immediate = instruction.check_bit(10);
        let is_subtract = instruction.check_bit(9);
        let operand_field = instruction.get_bits(6, 8);
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let op1 = cpu.read_reg(r_s);
        let op2 = if is_immediate {
            operand_field as u32
        } else {
            cpu.read_reg(operand_field as usize)
        };

        let result = if is_subtract {
            common_behaviour::sub(cpu, op1, op2, true)
        } else {
            common_behaviour::add(cpu, op1, op2, true)
        };

        cpu.write_reg(r_d, result, bus);
    }

    pub fn move_compare_add_subtract(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let opcode = instruction.get_bits(11, 12);
        let r_d = instruction.get_bits(8, 10) as usize;
        let immediate = instruction.get_bits(0, 7) as u32;

        match opcode {
            // MOV
            0b00 => {
                cpu.write_reg(r_d, immediate, bus);
                cpu.set_zero_and_sign(immediate);
            }
            // CMP
            0b01 => {
                let _ = common_behaviour::sub(cpu, cpu.read_reg(r_d), immediate, true);
            }
            // ADD
            0b10 => {
                let result = common_behaviour::add(cpu, cpu.read_reg(r_d), immediate, true);
                cpu.write_reg(r_d, result, bus);
            }
            // SUB
            0b11 => {
                let result = common_behaviour::sub(cpu, cpu.read_reg(r_d), immediate, true);
                cpu.write_reg(r_d, result, bus);
            }
            _ => unreachable!(),
        }
    }

    pub fn alu_operations(cpu: &mut Cpu, instruction: ThumbInstruction, bus: &mut Bus) {
        let opcode = AluOperation::from_u16(instruction.get_bits(6, 9)).unwrap();
        let r_s = instruction.get_bits(3, 5) as usize;
        let r_d = instruction.get_bits(0, 2) as usize;

        let op1 = cpu.read_reg(r_d);
        let op2 = cpu.read_reg(r_s);

        match opcode {
            AluOperation::And => {
                let result = op1 & op2;
                cpu.write_reg(r_d, result, bus);
                cpu.set_zero_and_sign(result);
            }
            AluOperation::Eor => {
                let result = op1 ^ op2;
                cpu.write_reg(r_d, result, bus);
                cpu.set_zero_and_sign(result);
            }
            AluOperation::Lsl | AluOperation::Lsr | AluOperation::Asr | AluOperation::Ror => {
                let shift_type = match opcode {
                    AluOperation::Lsl => ShiftType::LogicalLeft,
                    AluOperation::Lsr => ShiftType::LogicalRight,
                    AluOperation::Asr => ShiftType::ArithRight,
                    _ => ShiftType::RotateRight,
                };

                // Register-specified shift: only the low byte counts and an
                // amount of 0 leaves value and carry alone.
                let amount = op2 as u8;
                let (result, carry) = shift_type.perform_shift(op1, amount, cpu.registers.cpsr.carry());

                cpu.write_reg(r_d, result, bus);
                cpu.set_logical_flags(result, carry);
            }
            AluOperation::Adc => {
                let result = common_behaviour::adc(cpu, op1, op2, true);
                cpu.write_reg(r_d, result, bus);
            }
            AluOperation::Sbc => {
                let result = common_behaviour::sbc(cpu, op1, op2, true);
                cpu.write_reg(r_d, result, bus);
            }
            AluOperation::Tst => {
                cpu.set_zero_and_sign(op1 & op2);
            }
            AluOperation::Neg => {
                let result = common_behaviour::sub(cpu, 0, op2, true);
                cpu.write_reg(r_d, result, bus);
            }
            AluOperation::Cmp => {
                let _ = common_behaviour::sub(cpu, op1, op2, true);
            }
            AluOperation::Cmn => {
                let _ = common_behaviour::add(cpu, op1, op2, true);
            }
            AluOperation::Orr => {
                let result = op1 | op2;
                cpu.write_reg(r_d, result, bus);
                cpu.set_zero_and_sign(result);
            }
            AluOperation::Mul => {
                let result = op1.wrapping_mul(op2);
                cpu.write_reg(r_d, result, bus);
                // The carry flag is left at a meaningless value.
                cpu.set_zero_and_sign(result);
            }
            AluOperation::Bic => {
                let result = op1 & !op2;
                cpu.write_reg(r_d, result, bus);
                cpu.set_zero_and_sign(result);
            }
            AluOperation::Mvn => {
                let result = !op2;
                cpu.write_reg(r_d, result, bus);
                cpu.set_zero_and_sign(result);
            }
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, num_derive::FromPrimitive)]
enum AluOperation {
    And = 0b0000,
    Eor = 0b0001,
    Lsl = 0b0010,
    Lsr = 0b0011,
    Asr = 0b0100,
    Adc = 0b0101,
    Sbc = 0b0110,
    Ror = 0b0111,
    Tst = 0b1000,
    Neg = 0b1001,
    Cmp = 0b1010,
    Cmn = 0b1011,
    Orr = 0b1100,
    Mul = 0b1101,
    Bic = 0b1110,
    Mvn = 0b1111,
}
