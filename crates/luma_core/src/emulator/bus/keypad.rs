use crate::emulator::bus::interrupts::{InterruptManager, Interrupts};
use crate::emulator::MemoryAddress;
use crate::utils::BitOps;
use crate::InputKeys;

pub const KEYSTATUS_START: MemoryAddress = 0x0400_0130;
pub const KEYSTATUS_END: MemoryAddress = 0x0400_0131;
pub const KEYINTERRUPT_START: MemoryAddress = 0x0400_0132;
pub const KEYINTERRUPT_END: MemoryAddress = 0x0400_0133;

#[derive(Default)]
pub struct Keypad {
    pub status: KeypadStatus,
    pub interrupt_control: KeypadInterruptControl,
}

impl Keypad {
    pub fn read_status(&self, address: MemoryAddress) -> u8 {
        u16::from(self.status).byte_le((address - KEYSTATUS_START) as usize)
    }

    pub fn read_interrupt_control(&self, address: MemoryAddress) -> u8 {
        u16::from(self.interrupt_control).byte_le((address - KEYINTERRUPT_START) as usize)
    }

    pub fn write_interrupt_control(&mut self, address: MemoryAddress, value: u8) {
        self.interrupt_control = u16::from(self.interrupt_control)
            .change_byte_le((address - KEYINTERRUPT_START) as usize, value)
            .into();
    }

    /// Evaluate the keypad IRQ condition against the current button state.
    ///
    /// Called after every input sample, and after writes to the interrupt
    /// control register.
    pub fn check_interrupts(&self, interrupts: &mut InterruptManager) {
        if !self.interrupt_control.button_irq_enable() {
            return;
        }

        let irq_buttons = u16::from(self.interrupt_control) & 0x3FF;
        // Invert so a set bit means the button is held.
        let held = !u16::from(self.status) & 0x3FF;

        let fire = if self.interrupt_control.button_irq_condition() {
            // Logical AND, all of the selected buttons must be held.
            held & irq_buttons == irq_buttons
        } else {
            // Logical OR, any selected button suffices.
            held & irq_buttons != 0
        };

        if fire {
            interrupts.request(Interrupts::Keypad);
        }
    }
}

/// The state of the keypad buttons, as seen through `KEYINPUT`.
///
/// A *cleared* bit means the button is pressed. Read only for the guest.
#[modular_bitfield::bitfield(bits = 16)]
#[repr(u16)]
#[derive(Debug, Copy, Clone)]
pub struct KeypadStatus {
    button_a: bool,
    button_b: bool,
    select: bool,
    start: bool,
    right: bool,
    left: bool,
    up: bool,
    down: bool,
    shoulder_right: bool,
    shoulder_left: bool,
    #[skip]
    unused: modular_bitfield::prelude::B6,
}

impl KeypadStatus {
    /// Update a button, translating to the inverted hardware convention.
    pub fn set_pressed(&mut self, key: InputKeys, pressed: bool) {
        let released = !pressed;

        match key {
            InputKeys::A => self.set_button_a(released),
            InputKeys::B => self.set_button_b(released),
            InputKeys::Select => self.set_select(released),
            InputKeys::Start => self.set_start(released),
            InputKeys::Right => self.set_right(released),
            InputKeys::Left => self.set_left(released),
            InputKeys::Up => self.set_up(released),
            InputKeys::Down => self.set_down(released),
            InputKeys::ShoulderRight => self.set_shoulder_right(released),
            InputKeys::ShoulderLeft => self.set_shoulder_left(released),
        }
    }
}

impl Default for KeypadStatus {
    fn default() -> Self {
        // Button bit: 1 == released, 0 == pressed
        0x03FF.into()
    }
}

#[modular_bitfield::bitfield(bits = 16)]
#[repr(u16)]
#[derive(Debug, Copy, Clone, Default)]
pub struct KeypadInterruptControl {
    button_a: bool,
    button_b: bool,
    select: bool,
    start: bool,
    right: bool,
    left: bool,
    up: bool,
    down: bool,
    shoulder_right: bool,
    shoulder_left: bool,
    #[skip]
    unused: modular_bitfield::prelude::B4,
    button_irq_enable: bool,
    /// (0=Logical OR, 1=Logical AND)
    button_irq_condition: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyinput_uses_inverted_convention() {
        let mut keypad = Keypad::default();
        assert_eq!(u16::from(keypad.status), 0x03FF);

        keypad.status.set_pressed(InputKeys::A, true);
        keypad.status.set_pressed(InputKeys::Start, true);
        assert_eq!(u16::from(keypad.status), 0x03FF & !0b1001);

        keypad.status.set_pressed(InputKeys::A, false);
        assert_eq!(u16::from(keypad.status), 0x03FF & !0b1000);
    }

    #[test]
    fn keypad_irq_fires_on_selected_button() {
        let mut keypad = Keypad::default();
        let mut irq = InterruptManager::new();

        // Enable the keypad IRQ for the A button (bit 0 + enable bit 14).
        keypad.write_interrupt_control(KEYINTERRUPT_START, 0b1);
        keypad.write_interrupt_control(KEYINTERRUPT_START + 1, 0b0100_0000);

        keypad.check_interrupts(&mut irq);
        assert_eq!(u16::from(irq.flags), 0);

        keypad.status.set_pressed(InputKeys::A, true);
        keypad.check_interrupts(&mut irq);
        assert_eq!(u16::from(irq.flags), Interrupts::Keypad as u16);
    }
}
