//! Request and response shapes for the job boundary.
//!
//! These are plain serde types plus handlers that operate on a
//! [`JobManager`]; wiring them to an actual transport is left to the
//! embedding application.

use serde::{Deserialize, Serialize};
use tracing::info;

use chrono::{DateTime, Utc};
use frameloom_common::{FrameloomError, FrameloomResult, RendererConfig, VideoConfig};
use frameloom_export::{encode_validation_errors, ExportRange};

use crate::manager::{generate_job_id, JobManager, JobStatus, RenderJob};

/// Generic response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_msg(msg: &str) -> Self {
        Self {
            success: true,
            message: Some(msg.to_string()),
            error: None,
        }
    }

    pub fn err(error: &str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_error(error: &FrameloomError) -> Self {
        Self::err(&error.to_string())
    }
}

/// Request to start rendering a composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartJobRequest {
    pub composition_id: String,
    pub video: VideoConfig,
    /// Encoder settings; defaults apply when omitted.
    #[serde(default)]
    pub renderer: Option<RendererConfig>,
    /// Partial export range; the whole composition when omitted.
    #[serde(default)]
    pub range: Option<ExportRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartJobResponse {
    pub job_id: String,
}

/// Client-facing view of one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub composition_id: String,
    pub status: JobStatus,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RenderJob> for JobSnapshot {
    fn from(job: &RenderJob) -> Self {
        Self {
            id: job.id.clone(),
            composition_id: job.composition_id.clone(),
            status: job.status,
            progress: job.progress,
            start_time: job.start_time,
            end_time: job.end_time,
            output_url: job.output_url.clone(),
            error: job.error.clone(),
        }
    }
}

/// Status query: one job by id, or every active job when the id is
/// omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobQueryResponse {
    Job(JobSnapshot),
    Jobs { jobs: Vec<JobSnapshot> },
}

/// Validate a start request and register the job as pending. Every
/// problem with the request is reported at once.
pub fn handle_start_job(
    manager: &JobManager,
    request: &StartJobRequest,
) -> FrameloomResult<StartJobResponse> {
    let renderer = request.renderer.clone().unwrap_or_default();

    let mut messages = encode_validation_errors(&request.video, &renderer);
    if request.composition_id.is_empty() {
        messages.push("composition_id must not be empty".to_string());
    }
    if let Some(range) = &request.range {
        messages.extend(range.validation_errors(&request.video));
    }
    if !messages.is_empty() {
        return Err(FrameloomError::config(messages));
    }

    let job_id = generate_job_id();
    let mut job = RenderJob::new(
        &job_id,
        &request.composition_id,
        request.video.clone(),
        renderer,
    );
    job.range = request.range;
    manager.create_job(job)?;

    info!(job = %job_id, composition = %request.composition_id, "Render job accepted");
    Ok(StartJobResponse { job_id })
}

/// Answer a status query from the manager's current state.
pub fn handle_job_query(
    manager: &JobManager,
    query: &JobQuery,
) -> FrameloomResult<JobQueryResponse> {
    match &query.job_id {
        Some(id) => manager
            .get_job(id)
            .map(|job| JobQueryResponse::Job(JobSnapshot::from(&job)))
            .ok_or_else(|| FrameloomError::state(format!("job not found: {id}"))),
        None => {
            let jobs = manager
                .active_jobs()
                .iter()
                .map(JobSnapshot::from)
                .collect();
            Ok(JobQueryResponse::Jobs { jobs })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> StartJobRequest {
        StartJobRequest {
            composition_id: "comp-a".to_string(),
            video: VideoConfig::default(),
            renderer: None,
            range: None,
        }
    }

    #[test]
    fn test_start_job_registers_pending_job() {
        let manager = JobManager::new();
        let response = handle_start_job(&manager, &valid_request()).unwrap();

        let job = manager.get_job(&response.job_id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.composition_id, "comp-a");
    }

    #[test]
    fn test_start_job_collects_every_validation_problem() {
        let manager = JobManager::new();
        let request = StartJobRequest {
            composition_id: String::new(),
            video: VideoConfig {
                width: 0,
                fps: 0,
                ..VideoConfig::default()
            },
            renderer: None,
            range: None,
        };

        let err = handle_start_job(&manager, &request).unwrap_err();
        match err {
            FrameloomError::Config { messages } => {
                assert!(messages.iter().any(|m| m.contains("width")));
                assert!(messages.iter().any(|m| m.contains("fps")));
                assert!(messages.iter().any(|m| m.contains("composition_id")));
            }
            other => panic!("expected a config error, got {other:?}"),
        }
        assert_eq!(manager.job_count(), 0);
    }

    #[test]
    fn test_start_job_validates_range_against_video() {
        let manager = JobManager::new();
        let mut request = valid_request();
        request.range = Some(ExportRange {
            start: 0,
            end: request.video.duration_in_frames + 10,
        });

        let err = handle_start_job(&manager, &request).unwrap_err();
        assert!(matches!(err, FrameloomError::Config { .. }));
    }

    #[test]
    fn test_query_by_id_and_not_found() {
        let manager = JobManager::new();
        let response = handle_start_job(&manager, &valid_request()).unwrap();

        let query = JobQuery {
            job_id: Some(response.job_id.clone()),
        };
        match handle_job_query(&manager, &query).unwrap() {
            JobQueryResponse::Job(snapshot) => assert_eq!(snapshot.id, response.job_id),
            other => panic!("expected a single job, got {other:?}"),
        }

        let missing = JobQuery {
            job_id: Some("job-nope".to_string()),
        };
        assert!(handle_job_query(&manager, &missing).is_err());
    }

    #[test]
    fn test_query_without_id_lists_active_jobs() {
        let manager = JobManager::new();
        let a = handle_start_job(&manager, &valid_request()).unwrap();
        let b = handle_start_job(&manager, &valid_request()).unwrap();

        manager.start_job(&b.job_id).unwrap();
        manager.complete_job(&b.job_id, None).unwrap();

        match handle_job_query(&manager, &JobQuery::default()).unwrap() {
            JobQueryResponse::Jobs { jobs } => {
                assert_eq!(jobs.len(), 1);
                assert_eq!(jobs[0].id, a.job_id);
            }
            other => panic!("expected a job list, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_omits_unset_fields() {
        let manager = JobManager::new();
        let response = handle_start_job(&manager, &valid_request()).unwrap();
        let job = manager.get_job(&response.job_id).unwrap();

        let json = serde_json::to_value(JobSnapshot::from(&job)).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("start_time").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("output_url").is_none());
    }

    #[test]
    fn test_response_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok()).unwrap();
        assert_eq!(ok["success"], true);
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(ApiResponse::err("boom")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "boom");
    }
}
