use std::ops::{Deref, DerefMut};

/// One full LCD frame of BGR555 pixels, scanline-major.
///
/// Blue lives in bits 10..=14, green in 5..=9, red in 0..=4; bit 15 is unused.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct FrameBuffer(pub Box<[u16; crate::FRAMEBUFFER_SIZE]>);

impl Default for FrameBuffer {
    fn default() -> Self {
        Self(crate::box_array![0; crate::FRAMEBUFFER_SIZE])
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for FrameBuffer {
    type Target = [u16; crate::FRAMEBUFFER_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for FrameBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
