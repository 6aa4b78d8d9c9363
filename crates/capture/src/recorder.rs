//! Streaming recorder: a state-guarded live recording session.
//!
//! `StreamingRecorder` owns the start/push/stop state machine and
//! delegates container work to a [`RecorderSink`]. The shipped sink
//! pipes raw RGBA frames into a spawned `ffmpeg` process and returns the
//! finished container bytes; tests substitute their own sink.

use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info};

use frameloom_common::{FrameloomError, FrameloomResult, OutputFormat, RendererConfig};

use crate::frame::FrameBuffer;

/// Container backend fed by a [`StreamingRecorder`].
pub trait RecorderSink: Send {
    /// Open the container for writing.
    fn begin(&mut self, fps: u32, bitrate_kbps: Option<u32>) -> FrameloomResult<()>;

    /// Append one frame.
    fn write_frame(&mut self, frame: &FrameBuffer) -> FrameloomResult<()>;

    /// Finalize the container and return its bytes.
    fn finish(&mut self) -> FrameloomResult<Vec<u8>>;
}

/// Lifecycle of a recorder instance. One recording session per instance;
/// a finished or failed recorder never records again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Finished,
    Failed,
}

/// Drives a [`RecorderSink`] with the start/push/stop discipline of a
/// live recording: starting twice, pushing before start, or stopping a
/// non-recording instance are state errors.
pub struct StreamingRecorder {
    sink: Box<dyn RecorderSink>,
    state: RecorderState,
    frames_written: u64,
}

impl StreamingRecorder {
    pub fn new(sink: Box<dyn RecorderSink>) -> Self {
        Self {
            sink,
            state: RecorderState::Idle,
            frames_written: 0,
        }
    }

    pub fn start(&mut self, fps: u32, bitrate_kbps: Option<u32>) -> FrameloomResult<()> {
        if self.state != RecorderState::Idle {
            return Err(FrameloomError::state(format!(
                "recorder already started (state: {:?})",
                self.state
            )));
        }
        match self.sink.begin(fps, bitrate_kbps) {
            Ok(()) => {
                self.state = RecorderState::Recording;
                Ok(())
            }
            Err(e) => {
                self.state = RecorderState::Failed;
                Err(e)
            }
        }
    }

    pub fn push_frame(&mut self, frame: &FrameBuffer) -> FrameloomResult<()> {
        if self.state != RecorderState::Recording {
            return Err(FrameloomError::state(format!(
                "recorder is not recording (state: {:?})",
                self.state
            )));
        }
        match self.sink.write_frame(frame) {
            Ok(()) => {
                self.frames_written += 1;
                Ok(())
            }
            Err(e) => {
                self.state = RecorderState::Failed;
                Err(e)
            }
        }
    }

    /// Finalize the recording and hand back the container bytes.
    pub fn stop(&mut self) -> FrameloomResult<Vec<u8>> {
        if self.state != RecorderState::Recording {
            return Err(FrameloomError::state(format!(
                "recorder is not recording (state: {:?})",
                self.state
            )));
        }
        match self.sink.finish() {
            Ok(bytes) => {
                self.state = RecorderState::Finished;
                info!(
                    "Recording finished: {} frames, {} container bytes",
                    self.frames_written,
                    bytes.len()
                );
                Ok(bytes)
            }
            Err(e) => {
                self.state = RecorderState::Failed;
                Err(e)
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

/// Whether a usable `ffmpeg` binary is on PATH.
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Pipes raw RGBA frames into a spawned `ffmpeg`, which muxes them into
/// an MP4 or WebM container in a temp file; `finish` returns the file's
/// bytes. GIF output goes through the frame-sequence path instead.
pub struct FfmpegRecorderSink {
    width: u32,
    height: u32,
    renderer: RendererConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output_path: Option<PathBuf>,
}

impl FfmpegRecorderSink {
    pub fn new(width: u32, height: u32, renderer: RendererConfig) -> Self {
        Self {
            width,
            height,
            renderer,
            child: None,
            stdin: None,
            output_path: None,
        }
    }

    /// The full ffmpeg invocation, exposed for inspection and tests.
    pub fn ffmpeg_args(&self, fps: u32, bitrate_kbps: Option<u32>, out: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{}x{}", self.width, self.height),
            "-r".to_string(),
            fps.to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            self.renderer.codec.ffmpeg_encoder().to_string(),
        ];

        // bitrate wins over CRF whenever both are configured
        match bitrate_kbps.or(self.renderer.bitrate_kbps) {
            Some(bitrate) => {
                args.push("-b:v".to_string());
                args.push(format!("{bitrate}k"));
            }
            None => {
                args.push("-crf".to_string());
                args.push(self.renderer.effective_crf().to_string());
            }
        }

        args.push("-pix_fmt".to_string());
        args.push(self.renderer.pixel_format.as_str().to_string());

        if self.renderer.format == OutputFormat::Mp4 {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }

        args.push(out.display().to_string());
        args
    }

    fn validate_geometry(&self) -> FrameloomResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameloomError::encode(
                "recorder width/height must be non-zero",
            ));
        }
        if self.renderer.pixel_format.requires_even_dimensions()
            && (self.width % 2 != 0 || self.height % 2 != 0)
        {
            return Err(FrameloomError::encode(format!(
                "width/height must be even for {} output",
                self.renderer.pixel_format.as_str()
            )));
        }
        Ok(())
    }
}

impl RecorderSink for FfmpegRecorderSink {
    fn begin(&mut self, fps: u32, bitrate_kbps: Option<u32>) -> FrameloomResult<()> {
        if self.renderer.format == OutputFormat::Gif {
            return Err(FrameloomError::encode(
                "streaming recorder does not support gif; accumulate a frame sequence instead",
            ));
        }
        if fps == 0 {
            return Err(FrameloomError::encode("recorder fps must be non-zero"));
        }
        self.validate_geometry()?;
        self.renderer.validate()?;

        if !is_ffmpeg_available() {
            return Err(FrameloomError::encode(
                "ffmpeg is required for streaming recording, but was not found on PATH",
            ));
        }

        let out = std::env::temp_dir().join(format!(
            "frameloom-rec-{}.{}",
            uuid::Uuid::new_v4(),
            self.renderer.format.extension()
        ));

        let args = self.ffmpeg_args(fps, bitrate_kbps, &out);
        debug!("Spawning ffmpeg: {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FrameloomError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FrameloomError::encode("failed to open ffmpeg stdin"))?;

        info!(
            "Streaming recorder opened: {}x{} @ {}fps -> {}",
            self.width,
            self.height,
            fps,
            out.display()
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.output_path = Some(out);
        Ok(())
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> FrameloomResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(FrameloomError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FrameloomError::encode("recorder sink is not open"));
        };

        use std::io::Write as _;
        stdin
            .write_all(&frame.data)
            .map_err(|e| FrameloomError::encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(&mut self) -> FrameloomResult<Vec<u8>> {
        let Some(child) = self.child.take() else {
            return Err(FrameloomError::encode("recorder sink is not open"));
        };

        // closing stdin signals end-of-stream to ffmpeg
        drop(self.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| FrameloomError::encode(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameloomError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let path = self
            .output_path
            .take()
            .ok_or_else(|| FrameloomError::encode("recorder output path missing"))?;
        let bytes = std::fs::read(&path)?;
        std::fs::remove_file(&path).ok();
        Ok(bytes)
    }
}

impl Drop for FfmpegRecorderSink {
    fn drop(&mut self) {
        // abandoned recordings leave neither a zombie nor a temp file
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            child.kill().ok();
            child.wait().ok();
        }
        if let Some(path) = self.output_path.take() {
            std::fs::remove_file(path).ok();
        }
    }
}
