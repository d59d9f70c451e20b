use crate::emulator::bus::Bus;
use crate::emulator::cpu::arm::{ArmInstruction, ArmV4};
use crate::emulator::cpu::common::ShiftType;
use crate::emulator::cpu::registers::PC_REG;
use crate::emulator::cpu::Cpu;
use crate::utils::{sign_extend32, BitOps};
use num_traits::FromPrimitive;

impl ArmV4 {
    pub fn single_data_transfer(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Single Data Transfer");
        let (reg_base, reg_dest) = (
            instruction.get_bits(16, 19) as usize,
            instruction.get_bits(12, 15) as usize,
        );
        let is_load = instruction.check_bit(20);
        let is_byte_transfer = instruction.check_bit(22);
        let is_up = instruction.check_bit(23);
        let is_preindexed = instruction.check_bit(24);
        let has_writeback = instruction.check_bit(21);
        let is_immediate = !instruction.check_bit(25);

        let offset = if is_immediate {
            instruction.get_bits(0, 11)
        } else {
            let reg_offset = instruction.get_bits(0, 3) as usize;
            let shift_type = ShiftType::from_u32(instruction.get_bits(5, 6)).unwrap();
            let shift_amount = instruction.get_bits(7, 11) as u8;

            // The shifter carry-out of an offset shift never reaches the flags.
            let (offset, _) =
                shift_type.shift_immediate(cpu.read_reg(reg_offset), shift_amount, cpu.registers.cpsr.carry());

            offset
        };

        let base_address = cpu.read_reg(reg_base);
        let offset_address = if is_up {
            base_address.wrapping_add(offset)
        } else {
            base_address.wrapping_sub(offset)
        };
        let address = if is_preindexed { offset_address } else { base_address };

        if is_load {
            // Write-back happens before the destination write, so a load into
            // the base register wins.
            if !is_preindexed || has_writeback {
                cpu.write_reg(reg_base, offset_address, bus);
            }

            if is_byte_transfer {
                let value = bus.read(address) as u32;
                cpu.write_reg(reg_dest, value, bus);
            } else {
                // The byte at the (aligned) address always ends up in bits
                // 0..=7; an unaligned access rotates the rest of the word.
                let value = bus.read_32(address);
                let value = value.rotate_right(8 * address.get_bits(0, 1));
                cpu.write_reg(reg_dest, value, bus);
            }
        } else {
            // A stored R15 reads as the instruction address plus 12.
            let data = cpu
                .read_reg(reg_dest)
                .wrapping_add(if reg_dest == PC_REG { 4 } else { 0 });

            if is_byte_transfer {
                bus.write(address, data as u8);
            } else {
                bus.write_32(address, data);
            }

            if !is_preindexed || has_writeback {
                cpu.write_reg(reg_base, offset_address, bus);
            }
        }
    }

    pub fn halfword_and_signed_register(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Halfword and Signed Data Transfer Register");
        let reg_offset = instruction.get_bits(0, 3) as usize;
        let offset = cpu.read_reg(reg_offset);

        Self::halfword_operation(cpu, instruction, bus, offset);
    }

    pub fn halfword_and_signed_immediate(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus) {
        crate::cpu_log!("Executing instruction: Halfword and Signed Data Transfer Immediate");
        // The 8-bit immediate is split across two nibbles of the encoding.
        let offset = (instruction.get_bits(8, 11) << 4) | instruction.get_bits(0, 3);

        Self::halfword_operation(cpu, instruction, bus, offset);
    }

    #[inline(always)]
    fn halfword_operation(cpu: &mut Cpu, instruction: ArmInstruction, bus: &mut Bus, offset: u32) {
        let is_preindexed = instruction.check_bit(24);
        let is_up = instruction.check_bit(23);
        let has_writeback = instruction.check_bit(21);
        let is_load = instruction.check_bit(20);
        let transfer = TransferType::from_u32(instruction.get_bits(5, 6)).unwrap();

        let (reg_base, reg_dest) = (
            instruction.get_bits(16, 19) as usize,
            instruction.get_bits(12, 15) as usize,
        );

        let base_address = cpu.read_reg(reg_base);
        let offset_address = if is_up {
            base_address.wrapping_add(offset)
        } else {
            base_address.wrapping_sub(offset)
        };
        let address = if is_preindexed { offset_address } else { base_address };

        let write_back = !is_preindexed || has_writeback;

        match transfer {
            TransferType::Reserved => {
                // SH == 00 belongs to multiply/swap, which decode earlier.
                panic!(
                    "Reserved halfword transfer encoding {:#010X} at {:#010X}",
                    instruction,
                    cpu.registers.next_pc()
                );
            }
            TransferType::UnsignedHalfword => {
                if is_load {
                    if write_back {
                        cpu.write_reg(reg_base, offset_address, bus);
                    }
                    let value = bus.read_16(address) as u32;
                    cpu.write_reg(reg_dest, value, bus);
                } else {
                    bus.write_16(address, cpu.read_reg(reg_dest) as u16);
                    if write_back {
                        cpu.write_reg(reg_base, offset_address, bus);
                    }
                }
            }
            TransferType::SignedByte => {
                if write_back {
                    cpu.write_reg(reg_base, offset_address, bus);
                }
                let value = sign_extend32(bus.read(address) as u32, 8) as u32;
                cpu.write_reg(reg_dest, value, bus);
            }
            TransferType::SignedHalfword => {
                if write_back {
                    cpu.write_reg(reg_base, offset_address, bus);
                }
                let value = sign_extend32(bus.read_16(address) as u32, 16) as u32;
                cpu.write_reg(reg_dest, value, bus);
            }
        }
    }
}

/// The SH field of the halfword/signed transfers. The signed forms only
/// exist as loads.
#[derive(num_derive::FromPrimitive, Debug)]
enum TransferType {
    Reserved = 0b00,
    UnsignedHalfword = 0b01,
    SignedByte = 0b10,
    SignedHalfword = 0b11,
}
