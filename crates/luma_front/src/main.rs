use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use luma_core::emulator::bus::keypad::KeypadStatus;
use luma_core::emulator::cartridge::{Cartridge, MAX_ROM_SIZE};
use luma_core::emulator::frame::FrameBuffer;
use luma_core::emulator::{EmuOptions, Frontend, GbaEmulator};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BIOS_SIZE: usize = 16 * 1024;

/// Headless runner for the Luma emulator core.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the cartridge ROM image.
    cartridge: PathBuf,

    /// Path to a BIOS image (exactly 16 KiB). Without one the known BIOS
    /// calls are high-level emulated.
    #[arg(long)]
    bios: Option<PathBuf>,

    /// Stop after this many frames instead of running until interrupted.
    #[arg(long)]
    frames: Option<u64>,

    /// Run as fast as possible instead of pacing to the hardware refresh rate.
    #[arg(long)]
    uncapped: bool,
}

fn main() -> anyhow::Result<()> {
    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("luma_front")
        .add_filter_allow_str("luma_core")
        .build();
    simplelog::SimpleLogger::init(LevelFilter::Info, config)?;

    let args = Args::parse();

    let rom = load_cartridge(&args.cartridge)?;
    let bios = args.bios.as_deref().map(load_bios).transpose()?;

    let options = EmuOptions {
        skip_bios: bios.is_none(),
        bios,
    };

    let mut emulator = GbaEmulator::new(rom, options);

    let title = emulator.cartridge_header().game_title.clone();
    log::info!("Loaded cartridge: '{}'", title);

    let mut frontend = HeadlessFrontend::new(args.uncapped);

    let frames = args.frames.unwrap_or(u64::MAX);
    for _ in 0..frames {
        emulator.run_frame(&mut frontend);
    }

    log::info!("Clean shutdown after {} frames", frontend.frame_count);

    Ok(())
}

fn load_cartridge(path: &Path) -> anyhow::Result<Cartridge> {
    let rom = std::fs::read(path).with_context(|| format!("Could not read cartridge '{}'", path.display()))?;

    anyhow::ensure!(!rom.is_empty(), "Cartridge '{}' is empty", path.display());
    anyhow::ensure!(
        rom.len() <= MAX_ROM_SIZE,
        "Cartridge '{}' exceeds the 32 MiB ROM limit",
        path.display()
    );

    Ok(Cartridge::new(rom))
}

fn load_bios(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bios = std::fs::read(path).with_context(|| format!("Could not read BIOS '{}'", path.display()))?;

    anyhow::ensure!(
        bios.len() == BIOS_SIZE,
        "BIOS '{}' is {} bytes, expected exactly {}",
        path.display(),
        bios.len(),
        BIOS_SIZE
    );

    Ok(bios)
}

/// A front-end without a display; frames are counted and dropped.
struct HeadlessFrontend {
    uncapped: bool,
    frame_count: u64,
    frame_duration: Duration,
    next_deadline: Instant,
    last_report: Instant,
    frames_since_report: u32,
}

impl HeadlessFrontend {
    fn new(uncapped: bool) -> Self {
        let frame_duration = Duration::from_secs_f32(1.0 / luma_core::REFRESH_RATE);

        Self {
            uncapped,
            frame_count: 0,
            frame_duration,
            next_deadline: Instant::now() + frame_duration,
            last_report: Instant::now(),
            frames_since_report: 0,
        }
    }
}

impl Frontend for HeadlessFrontend {
    fn present(&mut self, _frame: &FrameBuffer) {
        self.frame_count += 1;
        self.frames_since_report += 1;

        let now = Instant::now();
        if now.duration_since(self.last_report) >= Duration::from_secs(5) {
            let fps = self.frames_since_report as f32 / now.duration_since(self.last_report).as_secs_f32();
            log::info!("Frame {} ({:.1} fps)", self.frame_count, fps);

            self.last_report = now;
            self.frames_since_report = 0;
        }

        if !self.uncapped {
            if let Some(wait) = self.next_deadline.checked_duration_since(now) {
                std::thread::sleep(wait);
            }
            self.next_deadline += self.frame_duration;
        }
    }

    fn poll_input(&mut self, _keypad: &mut KeypadStatus) {
        // No input sources without a display.
    }
}
