use luma_core::emulator::cartridge::Cartridge;
use luma_core::emulator::cpu::registers::{Mode, State, LINK_REG, SP_REG};
use luma_core::emulator::debug::DebugEmulator;
use luma_core::emulator::{EmuOptions, GbaEmulator};

/// Build an emulator around a ROM assembled from 32-bit words.
fn emu_with_rom(words: &[u32]) -> GbaEmulator {
    let mut rom = vec![0u8; 0x1000];
    for (i, word) in words.iter().enumerate() {
        rom[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }

    GbaEmulator::new(Cartridge::new(rom), EmuOptions::default())
}

fn step(emu: &mut GbaEmulator, count: usize) {
    for _ in 0..count {
        emu.step_instruction();
    }
}

#[test]
fn reset_state_matches_the_bios_hand_off() {
    let mut emu = emu_with_rom(&[]);
    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();

    assert_eq!(cpu.registers.general_purpose[0], 0x0000_0CA5);
    assert_eq!(cpu.registers.general_purpose[SP_REG], 0x0300_7F00);
    assert_eq!(cpu.registers.general_purpose[LINK_REG], 0x0800_0000);
    assert_eq!(cpu.registers.next_pc(), 0x0800_0000);

    let cpsr = cpu.registers.cpsr;
    assert_eq!(cpsr.mode(), Mode::System);
    assert_eq!(cpsr.state(), State::Arm);
    assert!(!cpsr.sign() && !cpsr.zero() && !cpsr.carry() && !cpsr.overflow());
}

#[test]
fn mov_immediate_leaves_flags_alone() {
    // MOV R0, #1
    let mut emu = emu_with_rom(&[0xE3A0_0001]);

    emu.step_instruction();

    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();
    assert_eq!(cpu.registers.general_purpose[0], 1);
    assert!(!cpu.registers.cpsr.zero() && !cpu.registers.cpsr.carry());
}

#[test]
fn adds_sets_carry_and_zero_on_wraparound() {
    // MOV R0, #1; MVN R2, #0; ADDS R1, R0, R2
    let mut emu = emu_with_rom(&[0xE3A0_0001, 0xE3E0_2000, 0xE090_1002]);

    step(&mut emu, 3);

    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();
    assert_eq!(cpu.registers.general_purpose[1], 0);

    let cpsr = cpu.registers.cpsr;
    assert!(cpsr.carry());
    assert!(cpsr.zero());
    assert!(!cpsr.sign());
    assert!(!cpsr.overflow());
}

#[test]
fn ldr_pc_relative_reads_two_instructions_ahead() {
    // LDR R2, [PC, #0] at 0x08000000 loads the word at 0x08000008.
    let mut emu = emu_with_rom(&[0xE59F_2000, 0xE1A0_0000, 0xCAFE_BABE]);

    emu.step_instruction();

    let mut debug = DebugEmulator(&mut emu);
    assert_eq!(debug.cpu().registers.general_purpose[2], 0xCAFE_BABE);
}

#[test]
fn thumb_bl_pair_links_past_both_halves() {
    // ADD R0, PC, #1; BX R0; then the THUMB pair BL <pair + 4>.
    let mut emu = emu_with_rom(&[
        0xE28F_0001,
        0xE12F_FF10,
        // 0xF000 (offset high), 0xF800 (offset low), little endian.
        0xF800_F000,
    ]);

    step(&mut emu, 3);

    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();
    assert_eq!(cpu.registers.cpsr.state(), State::Thumb);
    // The pair sits at 0x08000008; execution resumes right after it.
    assert_eq!(cpu.registers.next_pc(), 0x0800_000C);
    assert_eq!(cpu.registers.general_purpose[LINK_REG], 0x0800_000C | 1);
}

#[test]
fn stmdb_lays_registers_out_ascending() {
    // MOV R0, #0xAA; MOV R1, #0xBB; MOV LR, #0x08000000; ADD LR, LR, #0x2C;
    // STMDB SP!, {R0, R1, LR}
    let mut emu = emu_with_rom(&[
        0xE3A0_00AA,
        0xE3A0_10BB,
        0xE3A0_E408,
        0xE28E_E02C,
        0xE92D_4003,
    ]);

    step(&mut emu, 5);

    let mut debug = DebugEmulator(&mut emu);
    assert_eq!(debug.cpu().registers.general_purpose[SP_REG], 0x0300_7EF4);

    let bus = debug.bus();
    assert_eq!(bus.read_32(0x0300_7EF4), 0xAA);
    assert_eq!(bus.read_32(0x0300_7EF8), 0xBB);
    assert_eq!(bus.read_32(0x0300_7EFC), 0x0800_002C);
}

#[test]
fn swi_div_is_serviced_without_a_bios() {
    // MOV R0, #100; MOV R1, #7; SWI 0x06
    let mut emu = emu_with_rom(&[0xE3A0_0064, 0xE3A0_1007, 0xEF06_0000]);

    step(&mut emu, 3);

    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();
    assert_eq!(cpu.registers.general_purpose[0], 14);
    assert_eq!(cpu.registers.general_purpose[1], 2);
    assert_eq!(cpu.registers.general_purpose[3], 14);
}

#[test]
fn failed_condition_is_a_no_op() {
    // MOV R0, #1; MOVEQ R0, #5 with Z clear must not run.
    let mut emu = emu_with_rom(&[0xE3A0_0001, 0x03A0_0005]);

    step(&mut emu, 2);

    let mut debug = DebugEmulator(&mut emu);
    assert_eq!(debug.cpu().registers.general_purpose[0], 1);
}

#[test]
fn vblank_interrupt_enters_irq_mode() {
    // B . (spin forever)
    let mut emu = emu_with_rom(&[0xEAFF_FFFE]);

    {
        let mut debug = DebugEmulator(&mut emu);
        let bus = debug.bus();
        // IE: VBlank, IME: on, DISPSTAT: VBlank IRQ enable.
        bus.write_16(0x0400_0200, 0b1);
        bus.write_32(0x0400_0208, 1);
        bus.write_16(0x0400_0004, 0b1000);
    }

    emu.run_to_vblank();
    emu.step_instruction();

    let mut debug = DebugEmulator(&mut emu);
    let cpu = debug.cpu();
    assert_eq!(cpu.registers.cpsr.mode(), Mode::IRQ);
    assert!(cpu.registers.cpsr.irq_disable());
    // Execution continues at the IRQ vector.
    assert_eq!(cpu.registers.next_pc(), 0x0000_0018);
    // The handler's conventional `SUBS PC, LR, #4` goes back to the spin.
    assert_eq!(cpu.registers.general_purpose[LINK_REG].wrapping_sub(4), 0x0800_0000);
}

#[test]
fn mode_4_renders_palette_colors() {
    let mut emu = emu_with_rom(&[0xEAFF_FFFE]);

    {
        let mut debug = DebugEmulator(&mut emu);
        let bus = debug.bus();
        // DISPCNT: BG mode 4.
        bus.write_16(0x0400_0000, 0x0004);
        // Palette entry 1: solid blue-ish BGR555 color.
        bus.write_16(0x0500_0002, 0x7C1F);
        // First two pixels use palette index 1.
        bus.write_16(0x0600_0000, 0x0101);
    }

    emu.run_to_vblank();

    let frame = emu.frame_buffer();
    assert_eq!(frame[0], 0x7C1F);
    assert_eq!(frame[1], 0x7C1F);
    assert_eq!(frame[2], 0x0000);
}

#[test]
fn keyinput_reflects_pressed_buttons() {
    use luma_core::InputKeys;

    let mut emu = emu_with_rom(&[0xEAFF_FFFE]);
    let mut debug = DebugEmulator(&mut emu);

    assert_eq!(debug.bus().read_16(0x0400_0130), 0x03FF);

    debug.bus().keypad.status.set_pressed(InputKeys::A, true);
    assert_eq!(debug.bus().read_16(0x0400_0130), 0x03FE);
}

#[test]
fn frontend_sees_one_present_and_poll_per_frame() {
    use luma_core::emulator::bus::keypad::KeypadStatus;
    use luma_core::emulator::frame::FrameBuffer;
    use luma_core::emulator::Frontend;
    use luma_core::InputKeys;

    #[derive(Default)]
    struct CountingFrontend {
        presents: usize,
        polls: usize,
    }

    impl Frontend for CountingFrontend {
        fn present(&mut self, _frame: &FrameBuffer) {
            self.presents += 1;
        }

        fn poll_input(&mut self, keypad: &mut KeypadStatus) {
            keypad.set_pressed(InputKeys::Start, true);
            self.polls += 1;
        }
    }

    let mut emu = emu_with_rom(&[0xEAFF_FFFE]);
    let mut frontend = CountingFrontend::default();

    emu.run_frame(&mut frontend);
    emu.run_frame(&mut frontend);

    assert_eq!(frontend.presents, 2);
    assert_eq!(frontend.polls, 2);

    // The sampled input is visible through KEYINPUT afterwards.
    let mut debug = DebugEmulator(&mut emu);
    assert_eq!(debug.bus().read_16(0x0400_0130), 0x03FF & !0b1000);
}
