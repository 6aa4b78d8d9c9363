//! End-to-end export runs against a synthetic render surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use frameloom_cache::{frame_cache_key, FrameCache, FrameCacheConfig};
use frameloom_capture::{synthetic_frame, FrameBuffer, FrameSequence, SyntheticSurface};
use frameloom_common::{FrameloomError, FrameloomResult, RendererConfig, VideoConfig};
use frameloom_export::{
    CancelSignal, ExportArtifact, ExportOptions, ExportRange, ExportSink, ExportStage,
    FrameExporter,
};

fn test_options(width: u32, height: u32, frames: u32) -> ExportOptions {
    ExportOptions::new(
        "comp-a",
        VideoConfig {
            width,
            height,
            fps: 30,
            duration_in_frames: frames,
        },
        RendererConfig::default(),
    )
}

#[tokio::test]
async fn test_export_succeeds_and_keeps_frame_order() {
    let mut surface = SyntheticSurface::new(64, 36);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(64, 36, 12));

    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(result.success);
    assert_eq!(result.stage, ExportStage::Succeeded);
    assert_eq!(result.frame_count, 12);
    assert!(result.error.is_none());
    assert_eq!(exporter.stage(), ExportStage::Succeeded);

    let Some(ExportArtifact::Frames(sequence)) = result.artifact else {
        panic!("expected in-memory frames");
    };
    assert_eq!(sequence.frame_count(), 12);
    for (index, frame) in sequence.frames().iter().enumerate() {
        assert_eq!(*frame.buffer, synthetic_frame(64, 36, index as u32));
        assert!((frame.delay_ms - 1000.0 / 30.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_progress_reports_every_frame_and_ends_at_100() {
    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();

    let seen: Arc<Mutex<Vec<(ExportStage, u32, f64)>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let mut exporter =
        FrameExporter::new(test_options(32, 32, 6)).with_progress(Box::new(move |p| {
            recorder
                .lock()
                .unwrap()
                .push((p.stage, p.frame, p.percentage));
        }));

    let result = exporter.run(&mut surface, &mut sink).await;
    assert!(result.success);

    let seen = seen.lock().unwrap();
    let capturing: Vec<u32> = seen
        .iter()
        .filter(|(stage, _, _)| *stage == ExportStage::Capturing)
        .map(|(_, frame, _)| *frame)
        .collect();
    assert_eq!(capturing, vec![0, 1, 2, 3, 4, 5, 6]);

    let (last_stage, last_frame, last_percentage) = *seen.last().unwrap();
    assert_eq!(last_stage, ExportStage::Succeeded);
    assert_eq!(last_frame, 6);
    assert!((last_percentage - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_cached_frames_skip_surface_capture() {
    let cache = Arc::new(FrameCache::new(FrameCacheConfig::default()));

    // a sentinel frame makes a cache hit distinguishable from a capture
    let sentinel = Arc::new(FrameBuffer::filled(32, 32, [9, 9, 9, 255]));
    cache.set(frame_cache_key("comp-a", 3, 32, 32), Arc::clone(&sentinel));

    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 8)).with_cache(Arc::clone(&cache));
    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(result.success);
    assert_eq!(surface.captures(), 7);

    let Some(ExportArtifact::Frames(sequence)) = result.artifact else {
        panic!("expected in-memory frames");
    };
    assert!(Arc::ptr_eq(&sequence.frames()[3].buffer, &sentinel));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 7);
    assert_eq!(stats.entries, 8);
}

#[tokio::test]
async fn test_second_export_is_served_entirely_from_cache() {
    let cache = Arc::new(FrameCache::new(FrameCacheConfig::default()));

    let mut first_surface = SyntheticSurface::new(32, 32);
    let mut first_sink = FrameSequence::new();
    let mut first = FrameExporter::new(test_options(32, 32, 5)).with_cache(Arc::clone(&cache));
    assert!(first.run(&mut first_surface, &mut first_sink).await.success);
    assert_eq!(first_surface.captures(), 5);

    let mut second_surface = SyntheticSurface::new(32, 32);
    let mut second_sink = FrameSequence::new();
    let mut second = FrameExporter::new(test_options(32, 32, 5)).with_cache(Arc::clone(&cache));
    assert!(second
        .run(&mut second_surface, &mut second_sink)
        .await
        .success);

    assert_eq!(second_surface.captures(), 0);
    assert_eq!(cache.stats().hits, 5);
}

#[tokio::test]
async fn test_abort_midway_is_not_a_failure() {
    let cancel = CancelSignal::new();
    let trip = cancel.clone();

    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 20))
        .with_cancel(cancel)
        .with_progress(Box::new(move |p| {
            if p.stage == ExportStage::Capturing && p.frame == 5 {
                trip.fire();
            }
        }));

    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(!result.success);
    assert_eq!(result.stage, ExportStage::Aborted);
    assert_eq!(result.frame_count, 5);
    assert!(result.error.is_none());
    assert!(result.artifact.is_none());
    assert_eq!(exporter.stage(), ExportStage::Aborted);
}

#[tokio::test]
async fn test_already_fired_signal_aborts_before_any_capture() {
    let cancel = CancelSignal::new();
    cancel.fire();

    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 10)).with_cancel(cancel);
    let result = exporter.run(&mut surface, &mut sink).await;

    assert_eq!(result.stage, ExportStage::Aborted);
    assert_eq!(result.frame_count, 0);
    assert!(result.error.is_none());
    assert_eq!(surface.captures(), 0);
}

#[tokio::test]
async fn test_merged_signal_aborts_when_any_source_fires() {
    let ui_stop = CancelSignal::new();
    let watchdog = CancelSignal::with_timeout(Duration::from_secs(3600));
    let merged = CancelSignal::merged([ui_stop.clone(), watchdog]);
    ui_stop.fire();

    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 10)).with_cancel(merged);
    let result = exporter.run(&mut surface, &mut sink).await;

    assert_eq!(result.stage, ExportStage::Aborted);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_invalid_config_fails_with_every_message() {
    let mut options = test_options(0, 32, 10);
    options.video.fps = 0;

    let mut surface = SyntheticSurface::new(0, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(options);
    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(!result.success);
    assert_eq!(result.stage, ExportStage::Failed);
    assert_eq!(result.frame_count, 0);
    assert_eq!(surface.captures(), 0);

    match result.error {
        Some(FrameloomError::Config { messages }) => {
            assert!(messages.iter().any(|m| m.contains("width")));
            assert!(messages.iter().any(|m| m.contains("fps")));
        }
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_surface_dimension_mismatch_is_rejected() {
    let mut surface = SyntheticSurface::new(16, 16);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 4));
    let result = exporter.run(&mut surface, &mut sink).await;

    assert_eq!(result.stage, ExportStage::Failed);
    assert!(matches!(result.error, Some(FrameloomError::Config { .. })));
    assert_eq!(surface.captures(), 0);
}

#[tokio::test]
async fn test_capture_failure_populates_the_error() {
    let mut surface = SyntheticSurface::new(32, 32);
    surface.detach();

    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(32, 32, 4));
    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(!result.success);
    assert_eq!(result.stage, ExportStage::Failed);
    assert_eq!(result.frame_count, 0);
    assert!(matches!(result.error, Some(FrameloomError::Capture { .. })));
}

#[tokio::test]
async fn test_partial_range_exports_only_requested_frames() {
    let mut options = test_options(32, 32, 100);
    options.range = Some(ExportRange { start: 10, end: 14 });

    let mut surface = SyntheticSurface::new(32, 32);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(options);
    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(result.success);
    assert_eq!(result.frame_count, 4);

    let Some(ExportArtifact::Frames(sequence)) = result.artifact else {
        panic!("expected in-memory frames");
    };
    assert_eq!(*sequence.frames()[0].buffer, synthetic_frame(32, 32, 10));
    assert_eq!(*sequence.frames()[3].buffer, synthetic_frame(32, 32, 13));
}

#[tokio::test]
async fn test_exporter_runs_only_once() {
    let mut surface = SyntheticSurface::new(16, 16);
    let mut sink = FrameSequence::new();
    let mut exporter = FrameExporter::new(test_options(16, 16, 2));
    assert!(exporter.run(&mut surface, &mut sink).await.success);

    let second = exporter.run(&mut surface, &mut sink).await;
    assert!(!second.success);
    assert!(matches!(second.error, Some(FrameloomError::State { .. })));
    // the first run's terminal stage survives the rejected call
    assert_eq!(exporter.stage(), ExportStage::Succeeded);
}

struct RejectingSink {
    accepted: u32,
    fail_after: u32,
}

impl ExportSink for RejectingSink {
    fn begin(&mut self, _video: &VideoConfig) -> FrameloomResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _frame: Arc<FrameBuffer>, _delay_ms: f64) -> FrameloomResult<()> {
        if self.accepted >= self.fail_after {
            return Err(FrameloomError::encode("container is full"));
        }
        self.accepted += 1;
        Ok(())
    }

    fn finish(&mut self) -> FrameloomResult<ExportArtifact> {
        Ok(ExportArtifact::Blob(Vec::new()))
    }
}

#[tokio::test]
async fn test_sink_failure_fails_the_export() {
    let mut surface = SyntheticSurface::new(16, 16);
    let mut sink = RejectingSink {
        accepted: 0,
        fail_after: 3,
    };
    let mut exporter = FrameExporter::new(test_options(16, 16, 10));
    let result = exporter.run(&mut surface, &mut sink).await;

    assert!(!result.success);
    assert_eq!(result.stage, ExportStage::Failed);
    assert_eq!(result.frame_count, 3);
    assert!(matches!(result.error, Some(FrameloomError::Encode { .. })));
}
