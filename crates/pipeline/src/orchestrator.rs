//! Per-job retry/state-machine engine.
//!
//! The [`Orchestrator`] drives each submitted job through
//! `generating_code → rendering_video → processing_video` and decides,
//! on every stage failure, between another cycle (with the captured
//! failure detail fed back as correction context) and terminal failure.
//! One shared retry budget covers all stages: a render failure and a
//! subsequent artifact miss draw from the same counter.
//!
//! Each job runs as its own Tokio task; a panic or error inside one job
//! never reaches the engine or other jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use mathviz_anthropic::AnthropicClient;
use mathviz_core::{JobStatus, JobStore};
use uuid::Uuid;

use crate::artifact::{ArtifactError, WideningLocator};
use crate::config::PipelineConfig;
use crate::render::{ManimRenderer, RenderError};

// ---------------------------------------------------------------------------
// Stage error
// ---------------------------------------------------------------------------

/// A single stage's failure.
///
/// The rendered message is what gets recorded as the job's `last_error`
/// and fed forward as correction context, so each variant keeps its
/// distinguishing detail in the message text.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The generation-service call itself failed.
    #[error("code generation failed: {0}")]
    Generation(String),

    /// The render process failed or timed out.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// No artifact could be located after the full widening search.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Any other fault during a stage (staging I/O, panics, ...).
    #[error("unexpected failure while {context}: {detail}")]
    Unexpected {
        context: &'static str,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Code-generation stage collaborator.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Produce source text for `topic`, biased by the previous failure
    /// detail when present.
    async fn generate(&self, topic: &str, prior_error: Option<&str>)
        -> Result<String, StageError>;
}

/// Rendering stage collaborator.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `source` for `job_id` under the implementation's timeout.
    async fn render(&self, source: &Path, job_id: Uuid) -> Result<(), StageError>;
}

/// Artifact-processing stage collaborator.
#[async_trait]
pub trait ArtifactLocator: Send + Sync {
    /// Find the rendered output for `job_id` and return its canonical path.
    async fn locate(&self, job_id: Uuid) -> Result<PathBuf, StageError>;
}

#[async_trait]
impl CodeGenerator for AnthropicClient {
    async fn generate(
        &self,
        topic: &str,
        prior_error: Option<&str>,
    ) -> Result<String, StageError> {
        AnthropicClient::generate(self, topic, prior_error)
            .await
            .map_err(|e| StageError::Generation(e.to_string()))
    }
}

#[async_trait]
impl Renderer for ManimRenderer {
    async fn render(&self, source: &Path, job_id: Uuid) -> Result<(), StageError> {
        Ok(self.run(source, job_id, self.timeout).await?)
    }
}

#[async_trait]
impl ArtifactLocator for WideningLocator {
    async fn locate(&self, job_id: Uuid) -> Result<PathBuf, StageError> {
        Ok(WideningLocator::locate(self, job_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// The retry/state-machine engine.
///
/// Owns the job store and the three stage collaborators; designed to be
/// wrapped in `Arc` and shared with the HTTP layer.
pub struct Orchestrator {
    store: Arc<JobStore>,
    generator: Arc<dyn CodeGenerator>,
    renderer: Arc<dyn Renderer>,
    locator: Arc<dyn ArtifactLocator>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<JobStore>,
        generator: Arc<dyn CodeGenerator>,
        renderer: Arc<dyn Renderer>,
        locator: Arc<dyn ArtifactLocator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            generator,
            renderer,
            locator,
            config,
        }
    }

    /// The job store this engine mutates.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Schedule asynchronous execution of a job. Returns immediately;
    /// the job runs to a terminal state on its own task.
    pub fn spawn(self: &Arc<Self>, job_id: Uuid, topic: String) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run_job(job_id, topic).await })
    }

    /// Drive one job until `completed` or `failed`.
    pub async fn run_job(&self, job_id: Uuid, topic: String) {
        let mut correction: Option<String> = None;
        let mut failures: u32 = 0;

        loop {
            let attempt = std::panic::AssertUnwindSafe(
                self.attempt(job_id, &topic, correction.as_deref()),
            )
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(StageError::Unexpected {
                    context: "driving pipeline stages",
                    detail: panic_message(panic),
                })
            });

            match attempt {
                Ok(video_path) => {
                    self.store
                        .update(job_id, |job| {
                            job.status = JobStatus::Completed;
                            job.video_path = Some(video_path.to_string_lossy().into_owned());
                            job.last_error = None;
                            job.progress = None;
                        })
                        .await;
                    tracing::info!(job_id = %job_id, retries = failures, "Job completed");
                    return;
                }
                Err(stage_error) => {
                    let detail = stage_error.to_string();
                    failures += 1;

                    tracing::warn!(
                        job_id = %job_id,
                        failures,
                        max_retries = self.config.max_retries,
                        error = %detail,
                        "Pipeline stage failed",
                    );

                    if failures >= self.config.max_retries {
                        self.store
                            .update(job_id, |job| {
                                job.status = JobStatus::Failed;
                                job.retry_count = failures;
                                job.last_error = Some(detail);
                                job.progress = None;
                            })
                            .await;
                        tracing::error!(job_id = %job_id, "Job failed, retry budget exhausted");
                        return;
                    }

                    let progress = format!("retry_{}_of_{}", failures, self.config.max_retries);
                    self.store
                        .update(job_id, |job| {
                            job.retry_count = failures;
                            job.last_error = Some(detail.clone());
                            job.progress = Some(progress);
                        })
                        .await;

                    tokio::time::sleep(self.config.retry_backoff).await;
                    correction = Some(detail);
                }
            }
        }
    }

    /// One full pass through the pipeline stages.
    async fn attempt(
        &self,
        job_id: Uuid,
        topic: &str,
        correction: Option<&str>,
    ) -> Result<PathBuf, StageError> {
        self.store
            .update(job_id, |job| {
                job.status = JobStatus::GeneratingCode;
                job.progress = None;
            })
            .await;

        let code = self.generator.generate(topic, correction).await?;

        let source_path = self.config.work_dir.join(format!("manim_code_{job_id}.py"));
        tokio::fs::write(&source_path, &code)
            .await
            .map_err(|e| StageError::Unexpected {
                context: "writing staged source",
                detail: e.to_string(),
            })?;

        self.store
            .update(job_id, |job| job.status = JobStatus::RenderingVideo)
            .await;

        self.renderer.render(&source_path, job_id).await?;

        self.store
            .update(job_id, |job| job.status = JobStatus::ProcessingVideo)
            .await;

        let video_path = self.locator.locate(job_id).await?;

        // The staged source has served its purpose.
        if let Err(e) = tokio::fs::remove_file(&source_path).await {
            tracing::debug!(job_id = %job_id, error = %e, "Could not remove staged source");
        }

        Ok(video_path)
    }
}

/// Render a panic payload into a failure detail string.
fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
