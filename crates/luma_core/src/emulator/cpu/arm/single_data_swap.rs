use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::Cpu;
use crate::utils::BitOps;

impl ArmV4 {
    /// SWP/SWPB, an atomic read-then-write of one memory location.
    pub fn single_data_swap(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Single Data Swap");
        let is_byte_swap = instruction.check_bit(22);
        let (reg_base, reg_dest, reg_src) = (
            instruction.get_bits(16, 19) as usize,
            instruction.get_bits(12, 15) as usize,
            instruction.get_bits(0, 3) as usize,
        );

        let source_value = cpu.read_reg(reg_src);
        let swap_address = cpu.read_reg(reg_base);

        if is_byte_swap {
            let current = bus.read(swap_address);

            bus.write(swap_address, source_value as u8);
            cpu.write_reg(reg_dest, current as u32, bus);
        } else {
            // Word swaps honour the same unaligned rotation as LDR.
            let current = bus.read_32(swap_address).rotate_right(8 * swap_address.get_bits(0, 1));

            bus.write_32(swap_address, source_value);
            cpu.write_reg(reg_dest, current, bus);
        }
    }
}
