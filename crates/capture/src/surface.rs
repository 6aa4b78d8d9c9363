//! The render-surface boundary.
//!
//! A rendering engine exposes its output through [`RenderSurface`]; the
//! export pipeline only ever sees that trait. Capture is I/O-bound for
//! real surfaces (GPU readback, browser screenshot), hence the async
//! signature.

use frameloom_common::{FrameloomError, FrameloomResult};

use crate::frame::FrameBuffer;

/// A live rendering context frames can be captured from.
#[async_trait::async_trait]
pub trait RenderSurface: Send {
    /// Capture the frame at `frame_index` as an RGBA8 buffer.
    ///
    /// Fails with a capture error when the surface is no longer attached
    /// to a live rendering context.
    async fn capture(&mut self, frame_index: u32) -> FrameloomResult<FrameBuffer>;

    /// Geometry of the frames this surface produces.
    fn dimensions(&self) -> (u32, u32);

    /// Human-readable surface name for logs.
    fn name(&self) -> &str;
}

/// Deterministic test-pattern surface.
///
/// Renders a gradient with a marker block that tracks the frame index,
/// so identical frame indices always produce identical bytes. Used by
/// the CLI's synthetic export mode and by pipeline tests.
pub struct SyntheticSurface {
    width: u32,
    height: u32,
    attached: bool,
    captures: u64,
}

impl SyntheticSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            attached: true,
            captures: 0,
        }
    }

    /// Simulate the owning renderer tearing the surface down.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Number of capture calls served so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }
}

#[async_trait::async_trait]
impl RenderSurface for SyntheticSurface {
    async fn capture(&mut self, frame_index: u32) -> FrameloomResult<FrameBuffer> {
        if !self.attached {
            return Err(FrameloomError::capture(
                "render surface is not attached to a live rendering context",
            ));
        }
        self.captures += 1;
        Ok(synthetic_frame(self.width, self.height, frame_index))
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Render the test pattern for one frame: a two-axis gradient whose blue
/// channel advances with the frame index, plus a white marker block that
/// sweeps across the frame so motion is visible in encoded output.
pub fn synthetic_frame(width: u32, height: u32, frame_index: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::filled(width, height, [0, 0, 0, 255]);

    for y in 0..height {
        for x in 0..width {
            let r = ((x as u64 * 255) / width.max(1) as u64) as u8;
            let g = ((y as u64 * 255) / height.max(1) as u64) as u8;
            let b = ((frame_index as u64 * 7) % 256) as u8;
            frame.set_pixel(x, y, [r, g, b, 255]);
        }
    }

    let marker_w = (width / 10).max(1);
    let marker_h = (height / 10).max(1);
    let span_x = width.saturating_sub(marker_w).max(1);
    let marker_x = ((frame_index as u64 * 13) % span_x as u64) as u32;
    let marker_y = (height.saturating_sub(marker_h)) / 2;

    for y in marker_y..(marker_y + marker_h).min(height) {
        for x in marker_x..(marker_x + marker_w).min(width) {
            frame.set_pixel(x, y, [255, 255, 255, 255]);
        }
    }

    frame
}
