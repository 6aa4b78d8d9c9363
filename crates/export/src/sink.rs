//! Delivery targets for captured frames.
//!
//! An [`ExportSink`] receives frames in presentation order and turns them
//! into an [`ExportArtifact`] when the run finishes. The shipped sinks
//! cover the three output shapes: encoded container bytes via
//! [`StreamingRecorder`], a numbered PNG sequence on disk, and in-memory
//! retention via [`FrameSequence`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use frameloom_capture::{encode_image, FrameBuffer, FrameSequence, ImageFormat, StreamingRecorder};
use frameloom_common::{FrameloomError, FrameloomResult, VideoConfig};

/// What an [`ExportSink`] hands back once an export finishes.
#[derive(Debug)]
pub enum ExportArtifact {
    /// Encoded container bytes held in memory.
    Blob(Vec<u8>),
    /// Filesystem path or URL where the output was materialized.
    Locator(String),
    /// Frames kept in memory for a downstream consumer.
    Frames(FrameSequence),
}

impl ExportArtifact {
    /// One-line summary for logs and status output.
    pub fn describe(&self) -> String {
        match self {
            ExportArtifact::Blob(bytes) => format!("{} bytes in memory", bytes.len()),
            ExportArtifact::Locator(path) => path.clone(),
            ExportArtifact::Frames(sequence) => {
                format!("{} frames in memory", sequence.frame_count())
            }
        }
    }
}

/// Receives frames in presentation order during an export run.
///
/// `begin` is called once before the first frame and `finish` once after
/// the last. A sink that errors mid-stream is never finalized.
pub trait ExportSink: Send {
    fn begin(&mut self, video: &VideoConfig) -> FrameloomResult<()>;

    fn push_frame(&mut self, frame: Arc<FrameBuffer>, delay_ms: f64) -> FrameloomResult<()>;

    fn finish(&mut self) -> FrameloomResult<ExportArtifact>;
}

/// Frames stream straight into the recorder's container; the artifact is
/// the encoded bytes. Bitrate selection is left to the recorder's own
/// configuration.
impl ExportSink for StreamingRecorder {
    fn begin(&mut self, video: &VideoConfig) -> FrameloomResult<()> {
        self.start(video.fps, None)
    }

    fn push_frame(&mut self, frame: Arc<FrameBuffer>, _delay_ms: f64) -> FrameloomResult<()> {
        StreamingRecorder::push_frame(self, &frame)
    }

    fn finish(&mut self) -> FrameloomResult<ExportArtifact> {
        self.stop().map(ExportArtifact::Blob)
    }
}

/// Accumulates every frame in memory, preserving per-frame delays. The
/// artifact is the sequence itself.
impl ExportSink for FrameSequence {
    fn begin(&mut self, _video: &VideoConfig) -> FrameloomResult<()> {
        self.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: Arc<FrameBuffer>, delay_ms: f64) -> FrameloomResult<()> {
        self.add_frame(frame, delay_ms);
        Ok(())
    }

    fn finish(&mut self) -> FrameloomResult<ExportArtifact> {
        Ok(ExportArtifact::Frames(std::mem::take(self)))
    }
}

/// Writes each frame as a numbered PNG under one directory; the artifact
/// is the directory path. File names follow `frame_00000.png` so the
/// directory can feed an ffmpeg sequence encode directly.
pub struct PngSequenceSink {
    dir: PathBuf,
    next_index: u32,
    open: bool,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_index: 0,
            open: false,
        }
    }

    /// The ffmpeg sequence pattern matching the files this sink writes.
    pub fn input_pattern(&self) -> String {
        self.dir.join("frame_%05d.png").display().to_string()
    }

    pub fn frames_written(&self) -> u32 {
        self.next_index
    }
}

impl ExportSink for PngSequenceSink {
    fn begin(&mut self, _video: &VideoConfig) -> FrameloomResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        self.next_index = 0;
        self.open = true;
        debug!("Writing PNG sequence to {}", self.dir.display());
        Ok(())
    }

    fn push_frame(&mut self, frame: Arc<FrameBuffer>, _delay_ms: f64) -> FrameloomResult<()> {
        if !self.open {
            return Err(FrameloomError::state("png sequence sink is not open"));
        }
        let bytes = encode_image(&frame, ImageFormat::Png)?;
        let path = self.dir.join(format!("frame_{:05}.png", self.next_index));
        std::fs::write(&path, bytes)?;
        self.next_index += 1;
        Ok(())
    }

    fn finish(&mut self) -> FrameloomResult<ExportArtifact> {
        if !self.open {
            return Err(FrameloomError::state("png sequence sink is not open"));
        }
        self.open = false;
        info!(
            "PNG sequence complete: {} frames in {}",
            self.next_index,
            self.dir.display()
        );
        Ok(ExportArtifact::Locator(self.dir.display().to_string()))
    }
}
