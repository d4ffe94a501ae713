//! In-memory job registry.
//!
//! [`JobStore`] owns the map of all jobs created during the process
//! lifetime. Records are never deleted. The map is guarded by an async
//! `RwLock` because jobs run as tasks on a multi-threaded runtime; the
//! orchestrator task for a job is the only writer of that job's record,
//! but the lock makes that safe rather than assumed.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::job::Job;

/// Registry of every job submitted to this process.
///
/// Designed to be wrapped in `Arc` and shared across the application.
/// Unknown ids are reported as `None`, never as an error, so read-side
/// status reporting can treat "not found" as ordinary data.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh job for `topic` in `queued` status.
    ///
    /// Returns a snapshot of the created record.
    pub async fn create(&self, topic: &str) -> Job {
        let job = Job::new(topic);
        self.jobs.write().await.insert(job.id, job.clone());
        job
    }

    /// Snapshot of a single job, or `None` if the id is unknown.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Apply a mutation to a job's record and return the updated snapshot.
    ///
    /// Terminal statuses are final: a mutation that would move a job out
    /// of `completed` or `failed` is discarded wholesale and the existing
    /// snapshot is returned. Returns `None` for an unknown id.
    pub async fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Job)) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;

        let mut updated = job.clone();
        mutate(&mut updated);

        if job.status.is_terminal() && updated.status != job.status {
            return Some(job.clone());
        }

        *job = updated;
        Some(job.clone())
    }

    /// Snapshots of all known jobs, newest first.
    pub async fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Number of jobs ever created in this process.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the store has no jobs yet.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::job::JobStatus;

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let store = JobStore::new();
        let created = store.create("Fourier series").await;

        let fetched = store.get(created.id).await.expect("job should exist");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.topic, "Fourier series");
        assert_eq!(fetched.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none_not_error() {
        let store = JobStore::new();
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn update_patches_fields_and_returns_snapshot() {
        let store = JobStore::new();
        let job = store.create("Taylor expansion").await;

        let updated = store
            .update(job.id, |j| {
                j.status = JobStatus::GeneratingCode;
                j.progress = Some("requesting code".into());
            })
            .await
            .expect("job should exist");

        assert_eq!(updated.status, JobStatus::GeneratingCode);
        assert_eq!(updated.progress.as_deref(), Some("requesting code"));

        let fetched = store.get(job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::GeneratingCode);
    }

    #[tokio::test]
    async fn update_unknown_id_is_none() {
        let store = JobStore::new();
        let result = store
            .update(Uuid::new_v4(), |j| j.status = JobStatus::Failed)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn terminal_status_cannot_be_left() {
        let store = JobStore::new();
        let job = store.create("Binary search").await;

        store
            .update(job.id, |j| j.status = JobStatus::Failed)
            .await
            .unwrap();

        // A later attempt to resurrect the job must be discarded entirely.
        let after = store
            .update(job.id, |j| {
                j.status = JobStatus::GeneratingCode;
                j.progress = Some("should not stick".into());
            })
            .await
            .unwrap();

        assert_eq!(after.status, JobStatus::Failed);
        assert!(after.progress.is_none());
    }

    #[tokio::test]
    async fn terminal_job_still_accepts_non_status_patches() {
        let store = JobStore::new();
        let job = store.create("Euler's identity").await;

        store
            .update(job.id, |j| {
                j.status = JobStatus::Completed;
                j.video_path = Some("videos/x.mp4".into());
            })
            .await
            .unwrap();

        let after = store
            .update(job.id, |j| j.progress = Some("archived".into()))
            .await
            .unwrap();
        assert_eq!(after.status, JobStatus::Completed);
        assert_eq!(after.progress.as_deref(), Some("archived"));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_complete() {
        let store = JobStore::new();
        let first = store.create("first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create("second").await;

        let all = store.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }
}
