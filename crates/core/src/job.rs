//! Job record and status state machine.
//!
//! A [`Job`] is one end-to-end request to turn a topic string into a
//! rendered video. Its [`JobStatus`] moves strictly forward through the
//! pipeline stages; `Completed` and `Failed` are terminal and final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Pipeline stage a job is currently in.
///
/// `queued → generating_code → rendering_video → processing_video`
/// ending in either `completed` or `failed`. Retries re-enter
/// `generating_code`; the transient "retry n of m" detail is carried in
/// [`Job::progress`], not as a status variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    GeneratingCode,
    RenderingVideo,
    ProcessingVideo,
    Completed,
    Failed,
}

impl JobStatus {
    /// String representation matching the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::GeneratingCode => "generating_code",
            JobStatus::RenderingVideo => "rendering_video",
            JobStatus::ProcessingVideo => "processing_video",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One video-generation job.
///
/// Created when a topic is submitted and mutated only by the orchestrator
/// task driving it. `video_path` is set exactly once, on success.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Unique identifier, assigned at submission.
    pub id: Uuid,
    /// The topic the caller asked to visualize.
    pub topic: String,
    /// Current pipeline stage.
    pub status: JobStatus,
    /// Number of completed retry cycles so far.
    pub retry_count: u32,
    /// Most recent failure detail. Cleared on success.
    pub last_error: Option<String>,
    /// Advisory human-readable sub-step detail (e.g. `retry_1_of_3`).
    /// Never consulted for control decisions.
    pub progress: Option<String>,
    /// Canonical path of the rendered video. Set if and only if the job
    /// completed successfully.
    pub video_path: Option<String>,
    /// When the job was submitted.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh job in `queued` status with a new id.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            status: JobStatus::Queued,
            retry_count: 0,
            last_error: None,
            progress: None,
            video_path: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_wire_format() {
        assert_eq!(JobStatus::Queued.as_str(), "queued");
        assert_eq!(JobStatus::GeneratingCode.as_str(), "generating_code");
        assert_eq!(JobStatus::RenderingVideo.as_str(), "rendering_video");
        assert_eq!(JobStatus::ProcessingVideo.as_str(), "processing_video");
        assert_eq!(JobStatus::Completed.as_str(), "completed");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&JobStatus::GeneratingCode).unwrap();
        assert_eq!(json, "\"generating_code\"");

        let parsed: JobStatus = serde_json::from_str("\"rendering_video\"").unwrap();
        assert_eq!(parsed, JobStatus::RenderingVideo);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::GeneratingCode.is_terminal());
        assert!(!JobStatus::RenderingVideo.is_terminal());
        assert!(!JobStatus::ProcessingVideo.is_terminal());
    }

    #[test]
    fn new_job_starts_queued_with_empty_outcome_fields() {
        let job = Job::new("Pythagorean theorem");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.retry_count, 0);
        assert!(job.last_error.is_none());
        assert!(job.progress.is_none());
        assert!(job.video_path.is_none());
        assert_eq!(job.topic, "Pythagorean theorem");
    }

    #[test]
    fn new_jobs_get_distinct_ids() {
        let a = Job::new("a");
        let b = Job::new("b");
        assert_ne!(a.id, b.id);
    }
}
