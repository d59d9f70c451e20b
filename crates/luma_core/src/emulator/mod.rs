use bus::Bus;
use cartridge::Cartridge;
use cpu::Cpu;

use crate::emulator::bus::keypad::KeypadStatus;
use crate::emulator::bus::BiosData;
use crate::emulator::frame::FrameBuffer;
use crate::scheduler::EventTag;

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod debug;
pub mod frame;
pub mod ppu;

/// Refers to an *absolute* memory address.
/// Components that receive one must first translate it into an address
/// relative to themselves.
pub type MemoryAddress = u32;
/// A [MemoryAddress] that has been aligned to the width of its access.
pub type AlignedAddress = u32;

/// The two per-frame synchronization points the core exposes outward.
///
/// Both callbacks run on the emulation thread, from the VBlank transition:
/// first the finished frame is published, then the keypad is sampled.
pub trait Frontend {
    /// A finished frame of BGR555 pixels, published once per VBlank.
    fn present(&mut self, frame: &FrameBuffer);

    /// Sample the host input state into the keypad register.
    ///
    /// Remember that a *cleared* bit means the button is held down.
    fn poll_input(&mut self, keypad: &mut KeypadStatus);
}

#[derive(Debug)]
pub struct EmuOptions {
    /// Whether to skip the BIOS boot animation.
    ///
    /// Automatically enabled when no BIOS is provided; the known BIOS calls
    /// are then serviced in high-level emulation instead.
    pub skip_bios: bool,
    /// BIOS image to use. When absent the BIOS region reads as zeroes.
    pub bios: Option<Vec<u8>>,
}

impl Default for EmuOptions {
    fn default() -> Self {
        EmuOptions {
            skip_bios: true,
            bios: None,
        }
    }
}

/// The main emulator struct.
pub struct GbaEmulator {
    pub(crate) cpu: Cpu,
    pub(crate) bus: Bus,
}

impl GbaEmulator {
    pub fn new(rom: Cartridge, mut options: EmuOptions) -> Self {
        let has_bios = options.bios.is_some();
        let mut bus = Bus::new(rom, vec_to_bios_data(options.bios.take()));

        GbaEmulator {
            cpu: Cpu::new(options.skip_bios || !has_bios, !has_bios, &mut bus),
            bus,
        }
    }

    /// Run a full frame and hand it to the front-end.
    ///
    /// Drives the emulator to the next VBlank, publishes the framebuffer,
    /// and samples input, in that order.
    #[profiling::function]
    pub fn run_frame(&mut self, frontend: &mut impl Frontend) {
        self.run_to_vblank();

        frontend.present(self.bus.ppu.frame_buffer());
        frontend.poll_input(&mut self.bus.keypad.status);

        // The sampled buttons may satisfy the KEYCNT interrupt condition.
        self.bus.keypad.check_interrupts(&mut self.bus.interrupts);
    }

    /// Run the emulator until it has reached VBlank.
    pub fn run_to_vblank(&mut self) {
        while !self.step_instruction() {}
        profiling::finish_frame!();
    }

    /// Step the emulator for a single instruction.
    ///
    /// # Returns
    ///
    /// `true` if VBlank was reached, `false` otherwise.
    pub fn step_instruction(&mut self) -> bool {
        self.cpu.step_instruction(&mut self.bus);

        self.bus.scheduler.add_time(cpu::CYCLES_PER_INSTRUCTION);
        self.bus
            .timers
            .tick(cpu::CYCLES_PER_INSTRUCTION, &mut self.bus.interrupts);

        let mut reached_vblank = false;

        while let Some(event) = self.bus.scheduler.pop_current() {
            match event.tag {
                EventTag::Exit => {
                    unreachable!("Exit events are never scheduled");
                }
                EventTag::VBlank => {
                    self.bus.ppu.vblank(&mut self.bus.interrupts);
                    reached_vblank = true;
                }
                EventTag::HBlank => {
                    self.bus
                        .ppu
                        .hblank_start(event.timestamp, &mut self.bus.scheduler, &mut self.bus.interrupts);
                }
                EventTag::HBlankEnd => {
                    self.bus
                        .ppu
                        .hblank_end(event.timestamp, &mut self.bus.scheduler, &mut self.bus.interrupts);
                }
            }
        }

        reached_vblank
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.bus.ppu.frame_buffer()
    }

    /// The parsed cartridge header, for window titles and logging.
    pub fn cartridge_header(&self) -> &cartridge::header::CartridgeHeader {
        self.bus.rom.header()
    }
}

fn vec_to_bios_data(data: Option<Vec<u8>>) -> Box<BiosData> {
    let data = data.unwrap_or_else(|| vec![0; std::mem::size_of::<BiosData>()]);
    match data.into_boxed_slice().try_into() {
        Ok(bios) => bios,
        Err(_) => unreachable!("BIOS size is validated by the loader"),
    }
}
