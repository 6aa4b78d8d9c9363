//! Drives one tracked job through an export run.

use std::sync::Arc;

use tracing::info;

use frameloom_cache::FrameCache;
use frameloom_capture::{FrameBuffer, RenderSurface};
use frameloom_common::{FrameloomError, FrameloomResult};
use frameloom_export::{
    CancelSignal, ExportArtifact, ExportOptions, ExportResult, ExportSink, ExportStage,
    FrameExporter, ProgressCallback,
};

use crate::manager::JobManager;

/// Run the export for a pending job, mirroring the run into the job
/// record: progress while capturing, then the matching terminal state.
/// The job never stays `Processing` after this returns.
///
/// `progress` receives every progress report in addition to the job
/// record updates, for callers that want a live display.
pub async fn run_export_job(
    manager: Arc<JobManager>,
    job_id: &str,
    surface: &mut dyn RenderSurface,
    sink: &mut dyn ExportSink,
    cache: Option<Arc<FrameCache<Arc<FrameBuffer>>>>,
    cancel: CancelSignal,
    progress: Option<ProgressCallback>,
) -> FrameloomResult<ExportResult> {
    let job = manager
        .get_job(job_id)
        .ok_or_else(|| FrameloomError::state(format!("unknown job: {job_id}")))?;
    manager.start_job(job_id)?;

    let mut options = ExportOptions::new(&job.composition_id, job.video.clone(), job.renderer);
    options.range = job.range;

    let mut exporter = FrameExporter::new(options).with_cancel(cancel);
    if let Some(cache) = cache {
        exporter = exporter.with_cache(cache);
    }

    // The callback outlives this frame, so it captures its own handle
    // on the manager and an owned id.
    let progress_sink = Arc::clone(&manager);
    let progress_id = job_id.to_string();
    exporter = exporter.with_progress(Box::new(move |report| {
        if report.stage == ExportStage::Capturing && report.frame > 0 {
            progress_sink
                .update_progress(&progress_id, report.percentage)
                .ok();
        }
        if let Some(callback) = &progress {
            callback(report);
        }
    }));

    info!(job = %job_id, composition = %job.composition_id, "Export run starting");
    let result = exporter.run(surface, sink).await;

    match result.stage {
        ExportStage::Succeeded => {
            let output_url = result.artifact.as_ref().and_then(|artifact| match artifact {
                ExportArtifact::Locator(path) => Some(path.clone()),
                _ => None,
            });
            manager.complete_job(job_id, output_url)?;
        }
        ExportStage::Aborted => {
            manager.abort_job(job_id)?;
        }
        _ => {
            let message = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "export failed".to_string());
            manager.fail_job(job_id, message)?;
        }
    }

    Ok(result)
}
