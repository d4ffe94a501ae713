//! Handlers for job submission and status reporting.
//!
//! Status and log queries answer with structured data for every input:
//! an unknown (or even unparseable) job id yields a sentinel
//! `status = "not_found"` payload with HTTP 200, never a transport-level
//! fault — pollers treat "not found" as ordinary data.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use mathviz_core::Job;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Sentinel status reported for unknown job ids.
const STATUS_NOT_FOUND: &str = "not_found";

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "topic must not be empty"))]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub message: &'static str,
}

/// POST /generate
///
/// Submit a topic for visualization. Returns immediately with the queued
/// job's id; the pipeline runs on its own task.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let job = state.store.create(&request.topic).await;
    state.orchestrator.spawn(job.id, job.topic.clone());

    tracing::info!(job_id = %job.id, topic = %job.topic, "Job submitted");

    Ok(Json(GenerateResponse {
        job_id: job.id,
        status: job.status.as_str(),
        message: "Visualization generation started in the background. \
                  Use the /status endpoint to check progress.",
    }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: String,
    pub video_path: Option<String>,
    pub error: Option<String>,
}

/// GET /status/{job_id}
///
/// Current status of a job. Unknown ids get the `not_found` sentinel.
pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<StatusResponse> {
    let response = match lookup(&state, &job_id).await {
        Some(job) => StatusResponse {
            job_id,
            status: job.status.as_str().to_string(),
            video_path: job.video_path,
            error: job.last_error,
        },
        None => StatusResponse {
            job_id,
            status: STATUS_NOT_FOUND.to_string(),
            video_path: None,
            error: None,
        },
    };
    Json(response)
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub status: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub jobs: Vec<JobSummary>,
}

/// GET /list-jobs
///
/// All known jobs, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> Json<ListResponse> {
    let jobs = state
        .store
        .list()
        .await
        .into_iter()
        .map(|job| JobSummary {
            job_id: job.id,
            status: job.status.as_str().to_string(),
            topic: job.topic,
            created_at: job.created_at,
        })
        .collect();

    Json(ListResponse { jobs })
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub job_id: String,
    pub status: String,
    pub retry_count: u32,
    pub error: Option<String>,
    pub progress: Option<String>,
}

/// GET /logs/{job_id}
///
/// Retry bookkeeping and failure detail for a job, for pollers that
/// display progress. Same sentinel treatment as `/status`.
pub async fn logs(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<LogsResponse> {
    let response = match lookup(&state, &job_id).await {
        Some(job) => LogsResponse {
            job_id,
            status: job.status.as_str().to_string(),
            retry_count: job.retry_count,
            error: job.last_error,
            progress: job.progress,
        },
        None => LogsResponse {
            job_id,
            status: STATUS_NOT_FOUND.to_string(),
            retry_count: 0,
            error: None,
            progress: None,
        },
    };
    Json(response)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a job by its raw path parameter.
///
/// An id that does not even parse as a UUID is treated exactly like an
/// unknown id rather than a client error.
async fn lookup(state: &AppState, raw_id: &str) -> Option<Job> {
    let id = Uuid::parse_str(raw_id).ok()?;
    state.store.get(id).await
}
