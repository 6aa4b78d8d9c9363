//! Owned RGBA8 pixel buffers.

use frameloom_cache::ByteSized;
use frameloom_common::{FrameloomError, FrameloomResult};

/// One captured frame: tightly packed RGBA8, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Wrap an existing pixel buffer, validating its length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> FrameloomResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FrameloomError::capture(format!(
                "pixel buffer length mismatch: got {} bytes, expected {} for {}x{} RGBA",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }
}

impl ByteSized for FrameBuffer {
    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}
