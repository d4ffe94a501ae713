//! Artifact retrieval: streams a completed job's rendered video.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use mathviz_core::JobStatus;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /video/{job_id}
///
/// Streams the rendered artifact for a completed job. A known job in any
/// other status answers 409 ("not yet available"); an unknown id answers
/// 404. Both are structured JSON errors.
pub async fn video(State(state): State<AppState>, Path(job_id): Path<String>) -> AppResult<Response> {
    let id = Uuid::parse_str(&job_id)
        .map_err(|_| AppError::NotFound(format!("Job {job_id} not found")))?;

    let job = state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.status != JobStatus::Completed {
        return Err(AppError::Conflict(format!(
            "Video for job {job_id} is not yet available (status: {})",
            job.status
        )));
    }

    let video_path = job
        .video_path
        .ok_or_else(|| AppError::Internal(format!("Completed job {job_id} has no video path")))?;

    let file = tokio::fs::File::open(&video_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to open artifact {video_path}: {e}")))?;

    let stream = ReaderStream::new(file);
    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for_extension(&video_path))
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Guess a Content-Type from a file extension.
fn content_type_for_extension(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
