//! Drives one export run from first capture to finished artifact.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use frameloom_cache::{frame_cache_key, FrameCache};
use frameloom_capture::{FrameBuffer, RenderSurface};
use frameloom_common::{ExportClock, FrameloomError, RendererConfig, VideoConfig};

use crate::cancel::CancelSignal;
use crate::command::encode_validation_errors;
use crate::sink::{ExportArtifact, ExportSink};

/// Phases of an export run. `Succeeded`, `Failed` and `Aborted` are
/// terminal, and an aborted run is not a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportStage {
    NotStarted,
    Capturing,
    Encoding,
    Succeeded,
    Failed,
    Aborted,
}

impl ExportStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExportStage::Succeeded | ExportStage::Failed | ExportStage::Aborted
        )
    }
}

/// Progress report emitted after every completed frame and at stage
/// transitions.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    pub stage: ExportStage,

    /// Frames completed so far.
    pub frame: u32,

    pub total_frames: u32,

    /// Share of frames completed, in `[0, 100]`.
    pub percentage: f64,

    pub elapsed_ms: f64,

    /// Projected milliseconds left, assuming the per-frame pace holds.
    pub estimated_remaining_ms: f64,

    pub frames_per_second: f64,
}

/// Progress callback for export runs.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

fn progress_snapshot(
    stage: ExportStage,
    frame: u32,
    total_frames: u32,
    elapsed_ms: f64,
) -> ExportProgress {
    let percentage = if total_frames == 0 {
        100.0
    } else {
        (frame as f64 / total_frames as f64 * 100.0).clamp(0.0, 100.0)
    };

    let estimated_remaining_ms = if frame > 0 {
        elapsed_ms / frame as f64 * total_frames.saturating_sub(frame) as f64
    } else {
        0.0
    }
    .max(0.0);

    let frames_per_second = if elapsed_ms > 0.0 {
        frame as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };

    ExportProgress {
        stage,
        frame,
        total_frames,
        percentage,
        elapsed_ms,
        estimated_remaining_ms,
        frames_per_second,
    }
}

/// Half-open frame range `[start, end)` to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRange {
    pub start: u32,
    pub end: u32,
}

impl ExportRange {
    /// The whole composition, frame 0 through the last.
    pub fn full(video: &VideoConfig) -> Self {
        Self {
            start: 0,
            end: video.duration_in_frames,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn validation_errors(&self, video: &VideoConfig) -> Vec<String> {
        let mut messages = Vec::new();
        if self.start >= self.end {
            messages.push(format!(
                "frame range start ({}) must be below its end ({})",
                self.start, self.end
            ));
        }
        if self.end > video.duration_in_frames {
            messages.push(format!(
                "frame range end ({}) exceeds the composition length ({} frames)",
                self.end, video.duration_in_frames
            ));
        }
        messages
    }
}

/// What an export run should render.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Composition identity; part of every frame cache key.
    pub composition_id: String,

    pub video: VideoConfig,

    pub renderer: RendererConfig,

    /// Frames to export. `None` means the whole composition.
    pub range: Option<ExportRange>,
}

impl ExportOptions {
    pub fn new(
        composition_id: impl Into<String>,
        video: VideoConfig,
        renderer: RendererConfig,
    ) -> Self {
        Self {
            composition_id: composition_id.into(),
            video,
            renderer,
            range: None,
        }
    }

    pub fn resolved_range(&self) -> ExportRange {
        self.range.unwrap_or_else(|| ExportRange::full(&self.video))
    }
}

/// Terminal outcome of an export run.
///
/// An aborted run reports `success: false` with no error; only a failed
/// run carries one. `frame_count` is the number of frames fully captured
/// and delivered before the run ended.
#[derive(Debug)]
pub struct ExportResult {
    pub success: bool,

    pub stage: ExportStage,

    pub artifact: Option<ExportArtifact>,

    pub frame_count: u32,

    pub duration_ms: f64,

    pub error: Option<FrameloomError>,
}

/// Walks a composition's frames in ascending order, consults the frame
/// cache before asking the surface for pixels, and streams everything
/// into an [`ExportSink`]. One exporter drives exactly one run.
pub struct FrameExporter {
    options: ExportOptions,
    cache: Option<Arc<FrameCache<Arc<FrameBuffer>>>>,
    cancel: CancelSignal,
    progress: Option<ProgressCallback>,
    stage: ExportStage,
}

impl FrameExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            cache: None,
            cancel: CancelSignal::new(),
            progress: None,
            stage: ExportStage::NotStarted,
        }
    }

    /// Serve repeat frames from `cache` and add newly captured ones to it.
    pub fn with_cache(mut self, cache: Arc<FrameCache<Arc<FrameBuffer>>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Honor `cancel` at every frame boundary.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// A handle that aborts this exporter when fired.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    pub fn stage(&self) -> ExportStage {
        self.stage
    }

    pub async fn run(
        &mut self,
        surface: &mut dyn RenderSurface,
        sink: &mut dyn ExportSink,
    ) -> ExportResult {
        if self.stage != ExportStage::NotStarted {
            return ExportResult {
                success: false,
                stage: ExportStage::Failed,
                artifact: None,
                frame_count: 0,
                duration_ms: 0.0,
                error: Some(FrameloomError::state(format!(
                    "exporter already ran (stage: {:?})",
                    self.stage
                ))),
            };
        }

        let clock = ExportClock::start();
        let range = self.options.resolved_range();
        let total_frames = range.frame_count();

        info!(
            composition = %self.options.composition_id,
            width = self.options.video.width,
            height = self.options.video.height,
            fps = self.options.video.fps,
            frames = total_frames,
            format = ?self.options.renderer.format,
            "Starting export"
        );

        if let Err(error) = self.validate(&*surface, &range) {
            return self.finish_run(ExportStage::Failed, None, 0, &clock, Some(error));
        }

        if let Err(error) = sink.begin(&self.options.video) {
            warn!(error = %error, "Sink refused to open");
            return self.finish_run(ExportStage::Failed, None, 0, &clock, Some(error));
        }

        self.stage = ExportStage::Capturing;
        self.emit(progress_snapshot(
            ExportStage::Capturing,
            0,
            total_frames,
            clock.elapsed_ms(),
        ));

        let delay_ms = self.options.video.frame_delay_ms();
        let mut completed = 0u32;

        for frame_index in range.start..range.end {
            if self.cancel.is_fired() {
                info!(frame = frame_index, completed, "Export aborted");
                return self.finish_run(ExportStage::Aborted, None, completed, &clock, None);
            }

            let frame = match self.obtain_frame(surface, frame_index).await {
                Ok(frame) => frame,
                Err(error) => {
                    warn!(frame = frame_index, error = %error, "Frame capture failed");
                    return self.finish_run(
                        ExportStage::Failed,
                        None,
                        completed,
                        &clock,
                        Some(error),
                    );
                }
            };

            if let Err(error) = sink.push_frame(Arc::clone(&frame), delay_ms) {
                warn!(frame = frame_index, error = %error, "Sink rejected frame");
                return self.finish_run(ExportStage::Failed, None, completed, &clock, Some(error));
            }

            completed += 1;
            self.emit(progress_snapshot(
                ExportStage::Capturing,
                completed,
                total_frames,
                clock.elapsed_ms(),
            ));

            // lets a concurrently fired abort land between frames
            tokio::task::yield_now().await;
        }

        if self.cancel.is_fired() {
            info!(completed, "Export aborted before encoding");
            return self.finish_run(ExportStage::Aborted, None, completed, &clock, None);
        }

        self.stage = ExportStage::Encoding;
        self.emit(progress_snapshot(
            ExportStage::Encoding,
            completed,
            total_frames,
            clock.elapsed_ms(),
        ));

        match sink.finish() {
            Ok(artifact) => {
                info!(
                    frames = completed,
                    elapsed_ms = clock.elapsed_ms(),
                    artifact = %artifact.describe(),
                    "Export finished"
                );
                self.log_cache_stats();
                self.finish_run(ExportStage::Succeeded, Some(artifact), completed, &clock, None)
            }
            Err(error) => {
                warn!(error = %error, "Encoding failed");
                self.finish_run(ExportStage::Failed, None, completed, &clock, Some(error))
            }
        }
    }

    fn validate(
        &self,
        surface: &dyn RenderSurface,
        range: &ExportRange,
    ) -> Result<(), FrameloomError> {
        let mut messages = encode_validation_errors(&self.options.video, &self.options.renderer);
        messages.extend(range.validation_errors(&self.options.video));

        if self.options.composition_id.trim().is_empty() {
            messages.push("composition id must not be empty".to_string());
        }

        let (surface_width, surface_height) = surface.dimensions();
        if (surface_width, surface_height) != (self.options.video.width, self.options.video.height)
        {
            messages.push(format!(
                "render surface is {}x{} but the export expects {}x{}",
                surface_width, surface_height, self.options.video.width, self.options.video.height
            ));
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(FrameloomError::config(messages))
        }
    }

    async fn obtain_frame(
        &self,
        surface: &mut dyn RenderSurface,
        frame_index: u32,
    ) -> Result<Arc<FrameBuffer>, FrameloomError> {
        let key = frame_cache_key(
            &self.options.composition_id,
            frame_index,
            self.options.video.width,
            self.options.video.height,
        );

        if let Some(cache) = &self.cache {
            if let Some(frame) = cache.get(&key) {
                debug!(frame = frame_index, "Frame served from cache");
                return Ok(frame);
            }
        }

        let frame = Arc::new(surface.capture(frame_index).await?);
        if let Some(cache) = &self.cache {
            cache.set(key, Arc::clone(&frame));
        }
        Ok(frame)
    }

    fn finish_run(
        &mut self,
        stage: ExportStage,
        artifact: Option<ExportArtifact>,
        frame_count: u32,
        clock: &ExportClock,
        error: Option<FrameloomError>,
    ) -> ExportResult {
        self.stage = stage;
        let total_frames = self.options.resolved_range().frame_count();
        self.emit(progress_snapshot(
            stage,
            frame_count,
            total_frames,
            clock.elapsed_ms(),
        ));

        ExportResult {
            success: stage == ExportStage::Succeeded,
            stage,
            artifact,
            frame_count,
            duration_ms: clock.elapsed_ms(),
            error,
        }
    }

    fn emit(&self, progress: ExportProgress) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }

    fn log_cache_stats(&self) {
        if let Some(cache) = &self.cache {
            let stats = cache.stats();
            debug!(
                hits = stats.hits,
                misses = stats.misses,
                entries = stats.entries,
                size_bytes = stats.size_bytes,
                "Frame cache after export"
            );
        }
    }
}
