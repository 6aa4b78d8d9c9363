//! Frame-sequence accumulation for animated-image assembly.

use std::sync::Arc;

use crate::frame::FrameBuffer;

/// One accumulated frame and how long it should be displayed.
#[derive(Debug, Clone)]
pub struct SequenceFrame {
    pub buffer: Arc<FrameBuffer>,
    pub delay_ms: f64,
}

/// Accumulates frames in arrival order without encoding side effects.
/// Assembly into a GIF or similar artifact happens downstream; this type
/// only owns the ordered frames and their timing.
#[derive(Debug, Default)]
pub struct FrameSequence {
    frames: Vec<SequenceFrame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_frame(&mut self, buffer: Arc<FrameBuffer>, delay_ms: f64) {
        self.frames.push(SequenceFrame { buffer, delay_ms });
    }

    /// Frames in the order they were added.
    pub fn frames(&self) -> &[SequenceFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sum of per-frame display delays.
    pub fn total_duration_ms(&self) -> f64 {
        self.frames.iter().map(|f| f.delay_ms).sum()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(shade: u8) -> Arc<FrameBuffer> {
        Arc::new(FrameBuffer::filled(2, 2, [shade, shade, shade, 255]))
    }

    #[test]
    fn test_accumulates_in_order() {
        let mut seq = FrameSequence::new();
        seq.add_frame(frame(1), 33.3);
        seq.add_frame(frame(2), 33.3);
        seq.add_frame(frame(3), 33.3);

        assert_eq!(seq.frame_count(), 3);
        let shades: Vec<u8> = seq
            .frames()
            .iter()
            .map(|f| f.buffer.pixel(0, 0).unwrap()[0])
            .collect();
        assert_eq!(shades, vec![1, 2, 3]);
    }

    #[test]
    fn test_total_duration_sums_delays() {
        let mut seq = FrameSequence::new();
        assert_eq!(seq.total_duration_ms(), 0.0);

        seq.add_frame(frame(0), 100.0);
        seq.add_frame(frame(0), 50.0);
        assert!((seq.total_duration_ms() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_empties_the_sequence() {
        let mut seq = FrameSequence::new();
        seq.add_frame(frame(0), 10.0);
        assert!(!seq.is_empty());

        seq.clear();
        assert!(seq.is_empty());
        assert_eq!(seq.frame_count(), 0);
    }
}
