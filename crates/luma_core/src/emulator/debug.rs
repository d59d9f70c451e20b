use crate::emulator::bus::Bus;
use crate::emulator::cpu::Cpu;
use crate::emulator::GbaEmulator;

/// Unfettered access to the emulator internals, for tests and debug views.
#[doc(hidden)]
pub struct DebugEmulator<'a>(pub &'a mut GbaEmulator);

impl<'a> DebugEmulator<'a> {
    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.0.cpu
    }

    pub fn bus(&mut self) -> &mut Bus {
        &mut self.0.bus
    }
}
