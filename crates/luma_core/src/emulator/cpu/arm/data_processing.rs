use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::common::{common_behaviour, ShiftType};
use crate::emulator::cpu::registers::PC_REG;
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;
use num_traits::FromPrimitive;

impl ArmV4 {
    pub fn data_processing_immediate(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Data Processing Immediate");
        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_condition_code = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;
        let r_op1 = instruction.get_bits(16, 19) as usize;
        let op1_value = cpu.read_reg(r_op1);

        // The immediate is zero extended to 32 bits, then rotated right by
        // twice the rotate field. A non-zero rotate updates the shifter carry.
        let rotate = instruction.get_bits(8, 11) * 2;
        let imm = instruction.get_bits(0, 7);

        let (op2_value, shifter_carry) = if rotate == 0 {
            (imm, cpu.registers.cpsr.carry())
        } else {
            let rotated = imm.rotate_right(rotate);
            (rotated, rotated.check_bit(31))
        };

        ArmV4::perform_data_operation(cpu, bus, opcode, op1_value, op2_value, r_d, set_condition_code, shifter_carry);
    }

    pub fn data_processing_register_immediate_shift(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Data Processing Register (immediate shift)");
        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_condition_code = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;

        let shift_type = ShiftType::from_u32(instruction.get_bits(5, 6)).unwrap();
        let shift_amount = instruction.get_bits(7, 11) as u8;
        let r_op2 = instruction.get_bits(0, 3) as usize;

        let (op2_value, shifter_carry) =
            shift_type.shift_immediate(cpu.read_reg(r_op2), shift_amount, cpu.registers.cpsr.carry());

        let op1_value = cpu.read_reg(instruction.get_bits(16, 19) as usize);

        ArmV4::perform_data_operation(cpu, bus, opcode, op1_value, op2_value, r_d, set_condition_code, shifter_carry);
    }

    pub fn data_processing_register_register_shift(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Data Processing Register (register shift)");
        // With a register-specified shift the prefetch makes PC read as
        // instruction address plus 12 for the duration of this instruction.
        cpu.registers.general_purpose[PC_REG] += 4;

        let opcode = DataOperation::from_u32(instruction.get_bits(21, 24)).unwrap();
        let set_condition_code = instruction.check_bit(20);
        let r_d = instruction.get_bits(12, 15) as usize;

        let shift_type = ShiftType::from_u32(instruction.get_bits(5, 6)).unwrap();
        let shift_register = instruction.get_bits(8, 11) as usize;
        // Only the lowest byte of the shift register matters.
        let shift_amount = cpu.read_reg(shift_register) as u8;
        let r_op2 = instruction.get_bits(0, 3) as usize;

        let (op2_value, shifter_carry) =
            shift_type.perform_shift(cpu.read_reg(r_op2), shift_amount, cpu.registers.cpsr.carry());

        let op1_value = cpu.read_reg(instruction.get_bits(16, 19) as usize);

        ArmV4::perform_data_operation(cpu, bus, opcode, op1_value, op2_value, r_d, set_condition_code, shifter_carry);

        // Undo our increment from before, unless the instruction branched.
        if r_d != PC_REG {
            cpu.registers.general_purpose[PC_REG] -= 4;
        }
    }

    fn perform_data_operation(
        cpu: &mut Cpu,
        bus: &mut Bus,
        opcode: DataOperation,
        op1: u32,
        op2: u32,
        r_d: usize,
        set_flags: bool,
        shifter_carry: bool,
    ) {
        crate::cpu_log!("Executing opcode: {:?}", opcode);
        // Flag writes to the register file are suppressed when R15 is the
        // destination; those instructions restore the SPSR instead.
        let write_flags = set_flags && r_d != PC_REG;

        match opcode {
            DataOperation::And => {
                let result = op1 & op2;
                if write_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Eor => {
                let result = op1 ^ op2;
                if write_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Sub => {
                let result = common_behaviour::sub(cpu, op1, op2, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Rsb => {
                let result = common_behaviour::sub(cpu, op2, op1, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Add => {
                let result = common_behaviour::add(cpu, op1, op2, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Adc => {
                let result = common_behaviour::adc(cpu, op1, op2, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Sbc => {
                let result = common_behaviour::sbc(cpu, op1, op2, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Rsc => {
                let result = common_behaviour::sbc(cpu, op2, op1, write_flags);
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Tst => {
                let result = op1 & op2;
                cpu.set_logical_flags(result, shifter_carry);
            }
            DataOperation::Teq => {
                let result = op1 ^ op2;
                cpu.set_logical_flags(result, shifter_carry);
            }
            DataOperation::Cmp => {
                let _ = common_behaviour::sub(cpu, op1, op2, true);
            }
            DataOperation::Cmn => {
                let _ = common_behaviour::add(cpu, op1, op2, true);
            }
            DataOperation::Orr => {
                let result = op1 | op2;
                if write_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Mov => {
                if write_flags {
                    cpu.set_logical_flags(op2, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, op2, set_flags);
            }
            DataOperation::Bic => {
                let result = op1 & !op2;
                if write_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
            DataOperation::Mvn => {
                let result = !op2;
                if write_flags {
                    cpu.set_logical_flags(result, shifter_carry);
                }
                ArmV4::write_data_result(cpu, bus, r_d, result, set_flags);
            }
        };
    }

    /// Commit a data-processing result.
    ///
    /// Writing R15 with the S bit set performs an exception return: the
    /// current SPSR moves back into the CPSR *before* the jump so the
    /// pipeline refill happens in the restored state.
    #[inline]
    fn write_data_result(cpu: &mut Cpu, bus: &mut Bus, r_d: usize, result: u32, set_flags: bool) {
        if r_d == PC_REG && set_flags {
            cpu.restore_cpsr_from_spsr();
        }

        cpu.write_reg(r_d, result, bus);
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, num_derive::FromPrimitive)]
enum DataOperation {
    And = 0b0000,
    Eor = 0b0001,
    Sub = 0b0010,
    Rsb = 0b0011,
    Add = 0b0100,
    Adc = 0b0101,
    Sbc = 0b0110,
    Rsc = 0b0111,
    Tst = 0b1000,
    Teq = 0b1001,
    Cmp = 0b1010,
    Cmn = 0b1011,
    Orr = 0b1100,
    Mov = 0b1101,
    Bic = 0b1110,
    Mvn = 0b1111,
}
