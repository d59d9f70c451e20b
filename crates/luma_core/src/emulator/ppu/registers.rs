use crate::emulator::MemoryAddress;
use modular_bitfield::prelude::{B2, B5};
use modular_bitfield::{bitfield, BitfieldSpecifier};

pub const LCD_CONTROL_START: MemoryAddress = 0x0400_0000;
pub const LCD_CONTROL_END: MemoryAddress = 0x0400_0001;
/// Stored, but otherwise ignored; nothing meaningful uses it.
pub const GREEN_SWAP_START: MemoryAddress = 0x0400_0002;
pub const GREEN_SWAP_END: MemoryAddress = 0x0400_0003;
pub const LCD_STATUS_START: MemoryAddress = 0x0400_0004;
pub const LCD_STATUS_END: MemoryAddress = 0x0400_0005;
pub const LCD_VERTICAL_COUNTER_START: MemoryAddress = 0x0400_0006;
pub const LCD_VERTICAL_COUNTER_END: MemoryAddress = 0x0400_0007;
pub const BG_CONTROL_START: MemoryAddress = 0x0400_0008;
pub const BG_CONTROL_END: MemoryAddress = 0x0400_000F;

/// DISPCNT.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct LcdControl {
    /// Bg mode, in range 0..=5 (Bits 0..=2)
    pub bg_mode: BgMode,
    /// Reserved/CGB Mode (0=GBA, 1=CGB; can be set only by BIOS opcodes)
    pub reserved_cgb_mode: bool,
    /// Display Frame Select (0-1=Frame 0-1) (for BG Modes 4,5 only)
    pub display_frame_select: bool,
    /// H-Blank Interval Free (1=Allow access to OAM during H-Blank)
    pub h_blank_interval_free: bool,
    /// OBJ Character VRAM Mapping (0=Two dimensional, 1=One dimensional)
    pub obj_character_vram_mapping: bool,
    /// Forced blank (1=Allow FAST access to VRAM,Palette,OAM)
    pub forced_blank: bool,
    pub screen_display_bg0: bool,
    pub screen_display_bg1: bool,
    pub screen_display_bg2: bool,
    pub screen_display_bg3: bool,
    pub screen_display_obj: bool,
    pub window_0_display_flag: bool,
    pub window_1_display_flag: bool,
    pub obj_window_display: bool,
}

/// DISPSTAT.
///
/// Bits 0..=2 are read only for the guest; the PPU state machine is their
/// sole writer.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct LcdStatus {
    /// (Read only) (1=VBlank) (set in line 160..227)
    pub v_blank_flag: bool,
    /// (Read only) (1=HBlank) (toggled in all lines, 0..227)
    pub h_blank_flag: bool,
    /// (Read only) (1=Match) (set in selected line)
    pub v_counter_flag: bool,
    pub v_blank_irq_enable: bool,
    pub h_blank_irq_enable: bool,
    pub v_counter_irq_enable: bool,
    #[skip]
    unused: B2,
    /// The scanline to compare `VCOUNT` against, much like LYC of older
    /// handhelds. Although the drawing time is only 960 cycles (240*4), the
    /// H-Blank flag stays low for a total of 1006 cycles.
    pub v_count_setting_lyc: u8,
}

/// VCOUNT, the currently drawn scanline. Read only.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct VerticalCounter {
    /// Current scanline (LY), has range (0..227).
    ///
    /// Values in range from 160..227 indicate 'hidden' scanlines within the
    /// VBlank area.
    pub current_scanline: u8,
    #[skip]
    unused: u8,
}

/// BG0CNT..=BG3CNT.
#[bitfield(bits = 16)]
#[repr(u16)]
#[allow(dead_code)]
#[derive(Debug, Copy, Clone)]
pub struct BgControl {
    /// (0-3, 0=Highest)
    pub bg_priority: B2,
    /// (0-3, in units of 16 KBytes) (=BG Tile Data)
    pub character_base_block: B2,
    #[skip]
    unused: B2,
    /// (0=Disable, 1=Enable)
    pub mosaic: bool,
    /// (0=16/16, 1=256/1)
    pub colors_palettes: bool,
    /// (0-31, in units of 2 KBytes) (=BG Map Data)
    pub screen_base_block: B5,
    /// For Bg2/Bg3: Display Area Overflow (0=Transparent, 1=Wraparound)
    pub display_area_overflow: bool,
    /// | Value | Text Mode    | Rotation/Scaling Mode |
    /// |-------|--------------|-----------------------|
    /// | 0     | 256x256 (2K) | 128x128               |
    /// | 1     | 512x256 (4K) | 256x256               |
    /// | 2     | 256x512 (4K) | 512x512               |
    /// | 3     | 512x512 (8K) | 1024x1024 (16K)       |
    pub screen_size: B2,
}

/// The background modes selectable through `DISPCNT`.
///
/// Modes 0..=2 are tile based, 3..=5 are bitmaps; values 6 and 7 are
/// prohibited on hardware.
#[derive(Debug, BitfieldSpecifier, PartialEq, Copy, Clone)]
#[bits = 3]
pub enum BgMode {
    Mode0 = 0b000,
    Mode1 = 0b001,
    Mode2 = 0b010,
    Mode3 = 0b011,
    Mode4 = 0b100,
    Mode5 = 0b101,
    Prohibited6 = 0b110,
    Prohibited7 = 0b111,
}
