use crate::emulator::bus::interrupts::{InterruptManager, Interrupts};
use crate::emulator::frame::FrameBuffer;
use crate::emulator::ppu::oam::OamRam;
use crate::emulator::ppu::palette::PaletteRam;
use crate::emulator::ppu::registers::{BgControl, BgMode, LcdControl, LcdStatus, VerticalCounter};
use crate::emulator::MemoryAddress;
use crate::scheduler::{EmuTime, EventTag, Scheduler};

pub mod memory;
pub mod oam;
pub mod palette;
pub mod registers;

pub const LCD_IO_START: MemoryAddress = 0x0400_0000;
pub const LCD_IO_END: MemoryAddress = 0x0400_0056;

pub const VRAM_SIZE: usize = 96 * 1024;

/// Cycles spent drawing the visible part of a scanline.
pub const CYCLES_PER_DRAW: EmuTime = EmuTime(960);
/// Cycles spent in the horizontal blank.
pub const CYCLES_PER_HBLANK: EmuTime = EmuTime(272);
/// A full scanline, draw plus blank.
pub const CYCLES_PER_SCANLINE: EmuTime = EmuTime(1232);

pub const SCANLINES_PER_FRAME: u8 = 228;
pub const VBLANK_SCANLINE: u8 = 160;

/// The picture processing unit.
///
/// Owns palette/VRAM/OAM and the video I/O registers, and walks the
/// scanline state machine through events on the [`Scheduler`]. The PPU is the
/// sole writer of `DISPSTAT` bits 0..=2, `VCOUNT`, and the framebuffer.
pub struct Ppu {
    pub(crate) disp_cnt: LcdControl,
    pub(crate) green_swap: u16,
    pub(crate) disp_stat: LcdStatus,
    pub(crate) vertical_counter: VerticalCounter,
    pub(crate) bg_control: [BgControl; 4],

    pub(crate) palette: PaletteRam,
    pub(crate) vram: Box<[u8; VRAM_SIZE]>,
    pub(crate) oam: OamRam,

    frame: FrameBuffer,
}

impl Ppu {
    pub fn new() -> Self {
        Ppu {
            disp_cnt: LcdControl::new(),
            green_swap: 0,
            disp_stat: LcdStatus::new(),
            vertical_counter: VerticalCounter::new(),
            bg_control: [BgControl::new(); 4],
            palette: PaletteRam::new(),
            vram: crate::box_array![0; VRAM_SIZE],
            oam: OamRam::new(),
            frame: FrameBuffer::new(),
        }
    }

    /// Kick off the first scanline; called once when the system powers on.
    pub fn initial_startup(&mut self, scheduler: &mut Scheduler) {
        scheduler.schedule_event(EventTag::HBlank, CYCLES_PER_DRAW);
    }

    /// The visible part of the current scanline ended.
    ///
    /// Follow-up events are anchored to `timestamp` (the moment this event
    /// was due) rather than the drained scheduler time, so the video timeline
    /// never drifts behind delayed event handling.
    pub fn hblank_start(&mut self, timestamp: EmuTime, scheduler: &mut Scheduler, interrupts: &mut InterruptManager) {
        self.disp_stat.set_h_blank_flag(true);

        if self.disp_stat.h_blank_irq_enable() {
            interrupts.request(Interrupts::Hblank);
        }

        scheduler.schedule_event(EventTag::HBlankEnd, timestamp + CYCLES_PER_HBLANK);
    }

    /// A full scanline elapsed; move to the next one.
    pub fn hblank_end(&mut self, timestamp: EmuTime, scheduler: &mut Scheduler, interrupts: &mut InterruptManager) {
        self.disp_stat.set_h_blank_flag(false);

        let mut scanline = self.vertical_counter.current_scanline() + 1;

        if scanline == SCANLINES_PER_FRAME {
            scanline = 0;
            self.disp_stat.set_v_blank_flag(false);
        }

        self.vertical_counter.set_current_scanline(scanline);
        self.update_vcounter_match(interrupts);

        if scanline == VBLANK_SCANLINE {
            // The actual VBlank work happens in `vblank`, popped right after
            // this event so the emulator can observe the frame boundary.
            scheduler.schedule_event(EventTag::VBlank, timestamp);
        }

        scheduler.schedule_event(EventTag::HBlank, timestamp + CYCLES_PER_DRAW);
    }

    /// Entered the vertical blank: publish the frame and raise the IRQ.
    pub fn vblank(&mut self, interrupts: &mut InterruptManager) {
        self.disp_stat.set_v_blank_flag(true);

        if self.disp_stat.v_blank_irq_enable() {
            interrupts.request(Interrupts::Vblank);
        }

        self.render_frame();
    }

    /// Mirror `vcount == LYC` into DISPSTAT, raising the VCounter interrupt
    /// on the rising edge.
    fn update_vcounter_match(&mut self, interrupts: &mut InterruptManager) {
        let matches = self.vertical_counter.current_scanline() == self.disp_stat.v_count_setting_lyc();
        let rising = matches && !self.disp_stat.v_counter_flag();

        self.disp_stat.set_v_counter_flag(matches);

        if rising && self.disp_stat.v_counter_irq_enable() {
            interrupts.request(Interrupts::VCounter);
        }
    }

    /// Rasterize the current VRAM contents into the framebuffer.
    ///
    /// Only mode 4 draws anything at the moment; the other modes go through
    /// the same path and produce a backdrop-colored frame.
    fn render_frame(&mut self) {
        match self.disp_cnt.bg_mode() {
            BgMode::Mode4 => {
                // One byte per pixel, each a palette index.
                let base = if self.disp_cnt.display_frame_select() { 0xA000 } else { 0 };

                for (i, pixel) in self.frame.iter_mut().enumerate() {
                    let palette_index = self.vram[base + i];
                    *pixel = self.palette.color(palette_index);
                }
            }
            mode => {
                crate::ppu_log!("Unimplemented BG mode {:?}", mode);
                let backdrop = self.palette.color(0);
                self.frame.fill(backdrop);
            }
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn current_scanline(&self) -> u8 {
        self.vertical_counter.current_scanline()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_line(ppu: &mut Ppu, scheduler: &mut Scheduler, interrupts: &mut InterruptManager) {
        scheduler.add_time(CYCLES_PER_SCANLINE.0 as u32);

        while let Some(event) = scheduler.pop_current() {
            match event.tag {
                EventTag::HBlank => ppu.hblank_start(event.timestamp, scheduler, interrupts),
                EventTag::HBlankEnd => ppu.hblank_end(event.timestamp, scheduler, interrupts),
                EventTag::VBlank => ppu.vblank(interrupts),
                EventTag::Exit => unreachable!(),
            }
        }
    }

    #[test]
    fn vblank_begins_on_line_160() {
        let mut ppu = Ppu::new();
        let mut scheduler = Scheduler::new();
        let mut interrupts = InterruptManager::new();
        ppu.initial_startup(&mut scheduler);

        for _ in 0..VBLANK_SCANLINE {
            assert!(!ppu.disp_stat.v_blank_flag());
            run_line(&mut ppu, &mut scheduler, &mut interrupts);
        }

        assert_eq!(ppu.current_scanline(), VBLANK_SCANLINE);
        assert!(ppu.disp_stat.v_blank_flag());

        // The VBlank request is latched even with the IRQ disabled in IE.
        assert!(u16::from(interrupts.flags) & Interrupts::Vblank as u16 != 0);
    }

    #[test]
    fn scanline_counter_wraps_at_frame_end() {
        let mut ppu = Ppu::new();
        let mut scheduler = Scheduler::new();
        let mut interrupts = InterruptManager::new();
        ppu.initial_startup(&mut scheduler);

        for _ in 0..SCANLINES_PER_FRAME {
            run_line(&mut ppu, &mut scheduler, &mut interrupts);
        }

        assert_eq!(ppu.current_scanline(), 0);
        assert!(!ppu.disp_stat.v_blank_flag());
    }

    #[test]
    fn vcounter_match_fires_on_rising_edge() {
        let mut ppu = Ppu::new();
        let mut scheduler = Scheduler::new();
        let mut interrupts = InterruptManager::new();
        ppu.initial_startup(&mut scheduler);

        ppu.disp_stat.set_v_count_setting_lyc(2);
        ppu.disp_stat.set_v_counter_irq_enable(true);

        run_line(&mut ppu, &mut scheduler, &mut interrupts);
        assert!(!ppu.disp_stat.v_counter_flag());

        run_line(&mut ppu, &mut scheduler, &mut interrupts);
        assert!(ppu.disp_stat.v_counter_flag());
        assert!(u16::from(interrupts.flags) & Interrupts::VCounter as u16 != 0);
    }
}
