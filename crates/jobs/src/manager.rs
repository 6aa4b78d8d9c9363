//! In-memory registry of render jobs.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use frameloom_common::{FrameloomError, FrameloomResult, RendererConfig, VideoConfig};
use frameloom_export::ExportRange;

/// Lifecycle of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created but not yet picked up.
    Pending,
    /// An export run is underway.
    Processing,
    /// Finished with an artifact.
    Completed,
    /// Ended without an artifact; aborted jobs land here without an error.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One tracked export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: String,

    /// Composition this job renders.
    pub composition_id: String,

    pub video: VideoConfig,

    pub renderer: RendererConfig,

    /// Partial export range; the whole composition when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ExportRange>,

    pub status: JobStatus,

    /// Completion percentage in `[0, 100]`.
    pub progress: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Where the finished artifact can be fetched from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    /// Populated only for genuine failures; aborted jobs carry no error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl RenderJob {
    pub fn new(
        id: impl Into<String>,
        composition_id: impl Into<String>,
        video: VideoConfig,
        renderer: RendererConfig,
    ) -> Self {
        Self {
            id: id.into(),
            composition_id: composition_id.into(),
            video,
            renderer,
            range: None,
            status: JobStatus::Pending,
            progress: 0.0,
            start_time: None,
            end_time: None,
            output_url: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Fresh job id.
pub fn generate_job_id() -> String {
    format!("job-{}", uuid::Uuid::new_v4())
}

/// Registry of render jobs, shared between the request boundary and the
/// workers driving exports. All state sits behind one lock; jobs leave
/// as value snapshots.
pub struct JobManager {
    jobs: RwLock<HashMap<String, RenderJob>>,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new pending job. An id that is already tracked is
    /// rejected and the existing record is left untouched.
    pub fn create_job(&self, job: RenderJob) -> FrameloomResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(FrameloomError::state(format!(
                "job {} already exists",
                job.id
            )));
        }
        debug!(job = %job.id, composition = %job.composition_id, "Job created");
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Move a pending job into `Processing` and stamp its start time.
    pub fn start_job(&self, id: &str) -> FrameloomResult<()> {
        self.update(id, |job| {
            if job.status != JobStatus::Pending {
                return Err(FrameloomError::state(format!(
                    "job {} cannot start from {:?}",
                    job.id, job.status
                )));
            }
            job.status = JobStatus::Processing;
            job.start_time = Some(Utc::now());
            info!(job = %job.id, "Job processing");
            Ok(())
        })
    }

    /// Record progress for a processing job, clamped to `[0, 100]`.
    pub fn update_progress(&self, id: &str, progress: f64) -> FrameloomResult<()> {
        self.update(id, |job| {
            if job.status != JobStatus::Processing {
                return Err(FrameloomError::state(format!(
                    "job {} is not processing (status: {:?})",
                    job.id, job.status
                )));
            }
            job.progress = progress.clamp(0.0, 100.0);
            Ok(())
        })
    }

    /// Mark a processing job completed, pinning its progress at 100.
    pub fn complete_job(&self, id: &str, output_url: Option<String>) -> FrameloomResult<()> {
        self.update(id, |job| {
            if job.status != JobStatus::Processing {
                return Err(FrameloomError::state(format!(
                    "job {} is not processing (status: {:?})",
                    job.id, job.status
                )));
            }
            job.status = JobStatus::Completed;
            job.progress = 100.0;
            job.end_time = Some(Utc::now());
            job.output_url = output_url;
            info!(job = %job.id, "Job completed");
            Ok(())
        })
    }

    /// Mark a job failed with an error message. Jobs already in a
    /// terminal state are rejected.
    pub fn fail_job(&self, id: &str, error: impl Into<String>) -> FrameloomResult<()> {
        self.update(id, |job| {
            if job.status.is_terminal() {
                return Err(FrameloomError::state(format!(
                    "job {} already ended (status: {:?})",
                    job.id, job.status
                )));
            }
            job.status = JobStatus::Failed;
            job.end_time = Some(Utc::now());
            job.error = Some(error.into());
            info!(job = %job.id, "Job failed");
            Ok(())
        })
    }

    /// Mark a job as stopped by request: terminal `Failed` status with no
    /// error recorded.
    pub fn abort_job(&self, id: &str) -> FrameloomResult<()> {
        self.update(id, |job| {
            if job.status.is_terminal() {
                return Err(FrameloomError::state(format!(
                    "job {} already ended (status: {:?})",
                    job.id, job.status
                )));
            }
            job.status = JobStatus::Failed;
            job.end_time = Some(Utc::now());
            job.error = None;
            info!(job = %job.id, "Job aborted");
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Option<RenderJob> {
        self.jobs.read().unwrap().get(id).cloned()
    }

    /// Jobs that are pending or processing, oldest first.
    pub fn active_jobs(&self) -> Vec<RenderJob> {
        let jobs = self.jobs.read().unwrap();
        let mut active: Vec<RenderJob> = jobs
            .values()
            .filter(|job| !job.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        active
    }

    /// Every tracked job, oldest first.
    pub fn all_jobs(&self) -> Vec<RenderJob> {
        let jobs = self.jobs.read().unwrap();
        let mut all: Vec<RenderJob> = jobs.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Drop terminal jobs that ended more than `older_than` ago. Returns
    /// how many were removed.
    pub fn sweep_terminal(&self, older_than: chrono::Duration) -> usize {
        let cutoff = Utc::now() - older_than;
        let mut jobs = self.jobs.write().unwrap();
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.status.is_terminal() && job.end_time.map(|t| t < cutoff).unwrap_or(false))
        });
        let removed = before - jobs.len();
        if removed > 0 {
            debug!(removed, "Swept finished jobs");
        }
        removed
    }

    fn update<F>(&self, id: &str, apply: F) -> FrameloomResult<()>
    where
        F: FnOnce(&mut RenderJob) -> FrameloomResult<()>,
    {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| FrameloomError::state(format!("unknown job: {id}")))?;
        apply(job)
    }
}
