//! External render-process supervision.
//!
//! [`ManimRenderer`] launches one `manim` invocation per attempt, scoped
//! by job id, and enforces a hard wall-clock timeout. Timeouts produce an
//! error whose message is textually distinct from a non-zero-exit failure
//! so the correction loop and operators can tell "hung render" from
//! "broken code".

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use uuid::Uuid;

/// Renderer binary invoked for each job.
pub const DEFAULT_RENDER_BINARY: &str = "manim";

/// Low-quality flag for faster renders.
pub const DEFAULT_QUALITY_FLAG: &str = "-ql";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from a single render invocation.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The renderer binary could not be spawned at all.
    #[error("failed to spawn renderer '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but exited with a non-zero status.
    #[error("manim exited with status {}: {detail}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    ExitFailure {
        exit_code: Option<i32>,
        /// Combined stderr (or stdout when stderr is empty).
        detail: String,
    },

    /// The renderer exceeded its wall-clock budget and was killed.
    #[error("manim render timed out after {}s and was killed", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// I/O failure while waiting on the child process.
    #[error("I/O error while supervising renderer: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ManimRenderer
// ---------------------------------------------------------------------------

/// Supervisor for the external Manim render process.
pub struct ManimRenderer {
    /// Binary to invoke (overridable for tests).
    pub binary: String,
    /// Render quality flag passed before the source file.
    pub quality_flag: String,
    /// Working directory the renderer runs in; its `media/` output tree
    /// grows beneath it.
    pub work_dir: PathBuf,
    /// Wall-clock budget for one invocation.
    pub timeout: Duration,
}

impl ManimRenderer {
    /// Renderer running `manim -ql` in `work_dir` under `timeout`.
    pub fn new(work_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            binary: DEFAULT_RENDER_BINARY.to_string(),
            quality_flag: DEFAULT_QUALITY_FLAG.to_string(),
            work_dir,
            timeout,
        }
    }

    /// Render `source` for `job_id`, waiting at most `timeout`.
    ///
    /// The invocation is `<binary> <quality_flag> <source> -o <job_id>`,
    /// so the output file carries the job id. On timeout the child is
    /// forcibly killed (`kill_on_drop`) and a timeout-specific error is
    /// returned.
    pub async fn run(
        &self,
        source: &Path,
        job_id: Uuid,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(&self.quality_flag)
            .arg(source)
            .arg("-o")
            .arg(job_id.to_string())
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(
            job_id = %job_id,
            binary = %self.binary,
            source = %source.display(),
            "Starting render",
        );

        let child = command.spawn().map_err(|e| RenderError::Spawn {
            binary: self.binary.clone(),
            source: e,
        })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            // Dropping the wait future drops the child handle, which
            // kills the process (`kill_on_drop`).
            Err(_elapsed) => return Err(RenderError::Timeout { timeout }),
            Ok(waited) => waited?,
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        Err(RenderError::ExitFailure {
            exit_code: output.status.code(),
            detail,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
