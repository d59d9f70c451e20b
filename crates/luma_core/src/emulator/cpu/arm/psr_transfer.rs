use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::registers::Psr;
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;

enum PsrKind {
    Cpsr,
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(value: bool) -> Self {
        if value {
            PsrKind::Spsr
        } else {
            PsrKind::Cpsr
        }
    }
}

impl ArmV4 {
    /// MRS, transfer PSR contents to a register.
    pub fn mrs_trans_psr_reg(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        let r_d = instruction.get_bits(12, 15) as usize;
        let source: PsrKind = instruction.check_bit(22).into();

        let contents = match source {
            PsrKind::Cpsr => cpu.registers.cpsr,
            PsrKind::Spsr => cpu.registers.spsr,
        };

        cpu.write_reg(r_d, contents.as_raw(), bus);
    }

    /// MSR with a register source; bit 16 selects a full write or the flag
    /// field only.
    pub fn msr_register(cpu: &mut Cpu, instruction: ArmInstruction, _bus: &mut Bus) {
        let dest: PsrKind = instruction.check_bit(22).into();
        let r_m = instruction.get_bits(0, 3) as usize;
        let value = cpu.read_reg(r_m);

        if instruction.check_bit(16) {
            ArmV4::write_full_psr(cpu, dest, value);
        } else {
            ArmV4::write_psr_flags(cpu, dest, value);
        }
    }

    /// MSR with a rotated-immediate source, flag bits only.
    pub fn msr_immediate(cpu: &mut Cpu, instruction: ArmInstruction, _bus: &mut Bus) {
        let dest: PsrKind = instruction.check_bit(22).into();

        let rotate = instruction.get_bits(8, 11) * 2;
        let value = instruction.get_bits(0, 7).rotate_right(rotate);

        ArmV4::write_psr_flags(cpu, dest, value);
    }

    fn write_full_psr(cpu: &mut Cpu, dest: PsrKind, value: u32) {
        match dest {
            // A full CPSR write may change the mode bits, which has to route
            // through the bank swap.
            PsrKind::Cpsr => cpu.registers.write_cpsr(Psr::from(value)),
            PsrKind::Spsr => cpu.registers.spsr = Psr::from(value),
        }
    }

    fn write_psr_flags(cpu: &mut Cpu, dest: PsrKind, value: u32) {
        match dest {
            PsrKind::Cpsr => cpu.registers.cpsr.update_control_flags(value),
            PsrKind::Spsr => cpu.registers.spsr.update_control_flags(value),
        }
    }
}
