//! Pipeline tuning knobs, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default retry budget shared across all pipeline stages.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed backoff between retry cycles.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Default wall-clock budget for one render invocation.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(300);

/// Pipeline configuration.
///
/// All fields have defaults suitable for local development; override via
/// environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total stage failures allowed before a job is marked failed.
    pub max_retries: u32,
    /// Fixed sleep between a failure and the next generation attempt.
    pub retry_backoff: Duration,
    /// Hard wall-clock limit on one render invocation.
    pub render_timeout: Duration,
    /// Directory where staged source files are written and the renderer
    /// is run (the renderer's output tree grows beneath it).
    pub work_dir: PathBuf,
    /// Root of the renderer's conventional output tree.
    pub media_root: PathBuf,
    /// Canonical destination directory for located artifacts.
    pub videos_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            work_dir: PathBuf::from("."),
            media_root: PathBuf::from("media/videos"),
            videos_dir: PathBuf::from("videos"),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default        |
    /// |-----------------------|----------------|
    /// | `MAX_RETRIES`         | `3`            |
    /// | `RETRY_BACKOFF_SECS`  | `2`            |
    /// | `RENDER_TIMEOUT_SECS` | `300`          |
    /// | `WORK_DIR`            | `.`            |
    /// | `MEDIA_ROOT`          | `media/videos` |
    /// | `VIDEOS_DIR`          | `videos`       |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_retries: u32 = std::env::var("MAX_RETRIES")
            .map(|v| v.parse().expect("MAX_RETRIES must be a valid u32"))
            .unwrap_or(defaults.max_retries);

        let retry_backoff = std::env::var("RETRY_BACKOFF_SECS")
            .map(|v| {
                Duration::from_secs(v.parse().expect("RETRY_BACKOFF_SECS must be a valid u64"))
            })
            .unwrap_or(defaults.retry_backoff);

        let render_timeout = std::env::var("RENDER_TIMEOUT_SECS")
            .map(|v| {
                Duration::from_secs(v.parse().expect("RENDER_TIMEOUT_SECS must be a valid u64"))
            })
            .unwrap_or(defaults.render_timeout);

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.work_dir);

        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.media_root);

        let videos_dir = std::env::var("VIDEOS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.videos_dir);

        Self {
            max_retries,
            retry_backoff,
            render_timeout,
            work_dir,
            media_root,
            videos_dir,
        }
    }
}
