//! Rendered-artifact discovery and relocation.
//!
//! The renderer writes its output into a conventional `media/` tree whose
//! exact layout varies with renderer version and quality settings, and
//! stale artifacts from prior failed attempts may share the tree.
//! [`WideningLocator`] runs an ordered sequence of search strategies, each
//! tried only when the previous one finds nothing, picks the newest
//! candidate, and copies it to a canonical per-job path.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use uuid::Uuid;

/// File extension the renderer produces.
pub const ARTIFACT_EXTENSION: &str = "mp4";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from artifact location.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Every search strategy came up empty.
    #[error("no rendered artifact found for job {job_id}")]
    NotFound { job_id: Uuid },

    /// Filesystem failure while searching or relocating.
    #[error("I/O error while locating artifact: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Candidate selection policy
// ---------------------------------------------------------------------------

/// One file matched by a search strategy.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    /// Creation time, falling back to modification time where the
    /// filesystem does not record creation.
    pub created: SystemTime,
}

/// Pick the most recently created candidate.
///
/// This is the tie-break that resolves ambiguity from stale artifacts
/// left in the shared output tree by prior failed attempts: the newest
/// file is the one the just-finished render produced.
pub fn newest_candidate(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by_key(|c| c.created)
}

// ---------------------------------------------------------------------------
// Search strategies
// ---------------------------------------------------------------------------

/// Ordered widening search steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStrategy {
    /// The renderer's conventional output directory for this job's
    /// source file (`<media_root>/manim_code_<job_id>/`).
    ExpectedDir,
    /// Recursive walk of the whole media root for files named after the
    /// job id.
    MediaWalk,
    /// Unscoped deep search: any artifact-typed file under the working
    /// root, excluding the canonical destination directory.
    DeepWalk,
}

const STRATEGY_ORDER: [SearchStrategy; 3] = [
    SearchStrategy::ExpectedDir,
    SearchStrategy::MediaWalk,
    SearchStrategy::DeepWalk,
];

// ---------------------------------------------------------------------------
// WideningLocator
// ---------------------------------------------------------------------------

/// Widening filesystem search for a job's rendered output.
pub struct WideningLocator {
    /// Root of the renderer's conventional output tree.
    pub media_root: PathBuf,
    /// Broadest directory the deep search may walk.
    pub search_root: PathBuf,
    /// Canonical destination directory for located artifacts.
    pub videos_dir: PathBuf,
}

impl WideningLocator {
    pub fn new(media_root: PathBuf, search_root: PathBuf, videos_dir: PathBuf) -> Self {
        Self {
            media_root,
            search_root,
            videos_dir,
        }
    }

    /// Locate the rendered artifact for `job_id` and copy it to the
    /// canonical `<videos_dir>/<job_id>.mp4` path.
    ///
    /// The source file is copied, never moved: the output tree may be
    /// shared with concurrently running or retried jobs.
    pub async fn locate(&self, job_id: Uuid) -> Result<PathBuf, ArtifactError> {
        for strategy in STRATEGY_ORDER {
            let candidates = self.candidates_for(strategy, job_id).await?;

            tracing::debug!(
                job_id = %job_id,
                ?strategy,
                count = candidates.len(),
                "Artifact search step finished",
            );

            if let Some(winner) = newest_candidate(candidates) {
                return Ok(self.relocate(job_id, &winner.path).await?);
            }
        }

        Err(ArtifactError::NotFound { job_id })
    }

    /// Run one search strategy.
    async fn candidates_for(
        &self,
        strategy: SearchStrategy,
        job_id: Uuid,
    ) -> std::io::Result<Vec<Candidate>> {
        let id = job_id.to_string();
        match strategy {
            SearchStrategy::ExpectedDir => {
                let expected = self.media_root.join(format!("manim_code_{id}"));
                walk_collect(&expected, None, &|path| has_artifact_extension(path)).await
            }
            SearchStrategy::MediaWalk => {
                walk_collect(&self.media_root, None, &|path| {
                    has_artifact_extension(path) && file_name_contains(path, &id)
                })
                .await
            }
            SearchStrategy::DeepWalk => {
                let skip = tokio::fs::canonicalize(&self.videos_dir).await.ok();
                walk_collect(&self.search_root, skip.as_deref(), &|path| {
                    has_artifact_extension(path)
                })
                .await
            }
        }
    }

    /// Copy the winning file to its canonical destination.
    async fn relocate(&self, job_id: Uuid, source: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.videos_dir).await?;
        let dest = self
            .videos_dir
            .join(format!("{job_id}.{ARTIFACT_EXTENSION}"));
        tokio::fs::copy(source, &dest).await?;

        tracing::info!(
            job_id = %job_id,
            source = %source.display(),
            dest = %dest.display(),
            "Artifact relocated",
        );
        Ok(dest)
    }
}

// ---------------------------------------------------------------------------
// Filesystem walk
// ---------------------------------------------------------------------------

fn has_artifact_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
        .unwrap_or(false)
}

fn file_name_contains(path: &Path, needle: &str) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.contains(needle))
        .unwrap_or(false)
}

/// Recursively collect files under `root` matching `predicate`.
///
/// A missing root is an empty result, not an error (the strategy simply
/// finds nothing). Directories matching `skip` are not descended into.
async fn walk_collect(
    root: &Path,
    skip: Option<&Path>,
    predicate: &(dyn Fn(&Path) -> bool + Sync),
) -> std::io::Result<Vec<Candidate>> {
    let mut found = Vec::new();
    if tokio::fs::metadata(root).await.is_err() {
        return Ok(found);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // Unreadable directories narrow the search rather than
            // failing the job.
            Err(_) => continue,
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                if let Some(skip) = skip {
                    if let Ok(canonical) = tokio::fs::canonicalize(&path).await {
                        if canonical == skip {
                            continue;
                        }
                    }
                }
                stack.push(path);
            } else if predicate(&path) {
                let metadata = entry.metadata().await?;
                let created = metadata
                    .created()
                    .or_else(|_| metadata.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                found.push(Candidate { path, created });
            }
        }
    }

    Ok(found)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
