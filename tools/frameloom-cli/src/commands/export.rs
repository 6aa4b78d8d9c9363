//! Render a composition through the synthetic surface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use frameloom_cache::{FrameCache, FrameCacheConfig};
use frameloom_capture::{
    is_ffmpeg_available, FfmpegRecorderSink, StreamingRecorder, SyntheticSurface,
};
use frameloom_common::config::{
    AppConfig, OutputFormat, PixelFormat, RendererConfig, VideoCodec, VideoConfig,
};
use frameloom_export::{
    CancelSignal, ExportArtifact, ExportRange, ExportStage, PngSequenceSink, ProgressCallback,
};
use frameloom_jobs::{handle_start_job, run_export_job, JobManager, JobSnapshot, StartJobRequest};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    composition: String,
    output: Option<PathBuf>,
    format: String,
    codec: String,
    width: u32,
    height: u32,
    fps: u32,
    frames: u32,
    start: Option<u32>,
    end: Option<u32>,
    crf: Option<u32>,
    bitrate: Option<u32>,
    png_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let format: OutputFormat = format.parse()?;
    let codec: VideoCodec = codec.parse()?;

    let video = VideoConfig {
        width,
        height,
        fps,
        duration_in_frames: frames,
    };
    let renderer = RendererConfig {
        format,
        codec,
        crf,
        bitrate_kbps: bitrate,
        pixel_format: PixelFormat::default(),
    };

    let range = match (start, end) {
        (None, None) => None,
        (s, e) => Some(ExportRange {
            start: s.unwrap_or(0),
            end: e.unwrap_or(frames),
        }),
    };

    let output_path = output.unwrap_or_else(|| {
        PathBuf::from(format!("{composition}.{}", format.extension()))
    });

    println!("Exporting composition: {composition}");
    println!("  Resolution: {width}x{height} @ {fps} fps");
    println!("  Format: {format} ({codec})");

    let manager = Arc::new(JobManager::new());
    let request = StartJobRequest {
        composition_id: composition,
        video,
        renderer: Some(renderer.clone()),
        range,
    };
    let started = handle_start_job(&manager, &request)?;
    tracing::info!(job = %started.job_id, "Export job created");

    let cache_defaults = AppConfig::load().cache;
    let cache = Arc::new(FrameCache::new(FrameCacheConfig::from(&cache_defaults)));
    let mut surface = SyntheticSurface::new(width, height);

    let cancel = match timeout_secs {
        Some(secs) => CancelSignal::with_timeout(Duration::from_secs(secs)),
        None => CancelSignal::new(),
    };

    let progress_cb: ProgressCallback = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.percentage,
            p.frame,
            p.total_frames,
            p.estimated_remaining_ms / 1000.0,
        );
        let _ = std::io::stdout().flush();
    });

    let result = if let Some(dir) = png_dir {
        let mut sink = PngSequenceSink::new(&dir);
        run_export_job(
            Arc::clone(&manager),
            &started.job_id,
            &mut surface,
            &mut sink,
            Some(Arc::clone(&cache)),
            cancel,
            Some(progress_cb),
        )
        .await?
    } else {
        if !is_ffmpeg_available() {
            anyhow::bail!("ffmpeg not found on PATH; re-run with --png-dir to skip encoding");
        }
        let recorder = FfmpegRecorderSink::new(width, height, renderer);
        let mut sink = StreamingRecorder::new(Box::new(recorder));
        run_export_job(
            Arc::clone(&manager),
            &started.job_id,
            &mut surface,
            &mut sink,
            Some(Arc::clone(&cache)),
            cancel,
            Some(progress_cb),
        )
        .await?
    };

    let job = manager
        .get_job(&started.job_id)
        .ok_or_else(|| anyhow::anyhow!("job record vanished: {}", started.job_id))?;

    match result.stage {
        ExportStage::Succeeded => {
            if let Some(ExportArtifact::Blob(bytes)) = &result.artifact {
                std::fs::write(&output_path, bytes)?;
                println!("\nExport complete: {}", output_path.display());
            } else if let Some(artifact) = &result.artifact {
                println!("\nExport complete: {}", artifact.describe());
            }
            println!(
                "  {} frames in {:.1}s",
                result.frame_count,
                result.duration_ms / 1000.0
            );
        }
        ExportStage::Aborted => {
            println!("\nExport aborted after {} frames", result.frame_count);
        }
        _ => {
            println!(
                "\nExport failed: {}",
                job.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let stats = cache.stats();
    println!(
        "  Cache: {} entries, {} hits / {} misses",
        stats.entries, stats.hits, stats.misses
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&JobSnapshot::from(&job))?);
    }

    Ok(())
}
