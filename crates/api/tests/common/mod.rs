//! Shared integration-test harness.
//!
//! Builds the full application router with all middleware layers, exactly
//! as `main.rs` does, but wired to a stub generation client and an
//! instant renderer so tests never touch the network or a real Manim
//! install. The artifact locator is the real `WideningLocator` running
//! against a per-test temp directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use mathviz_api::config::ServerConfig;
use mathviz_api::router::build_app_router;
use mathviz_api::state::AppState;
use mathviz_core::JobStore;
use mathviz_pipeline::artifact::WideningLocator;
use mathviz_pipeline::{CodeGenerator, Orchestrator, PipelineConfig, Renderer, StageError};

/// Bytes the stub renderer writes as the "video".
pub const FAKE_VIDEO_BYTES: &[u8] = b"fake-mp4-bytes";

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Generator returning a fixed program without network access.
struct StubGenerator;

#[async_trait]
impl CodeGenerator for StubGenerator {
    async fn generate(
        &self,
        _topic: &str,
        _prior_error: Option<&str>,
    ) -> Result<String, StageError> {
        Ok("from manim import *\n\nclass Scene1(Scene):\n    pass\n".to_string())
    }
}

/// Renderer that succeeds instantly, dropping its artifact where the
/// locator's expected-directory strategy looks.
struct InstantRenderer {
    media_root: PathBuf,
}

#[async_trait]
impl Renderer for InstantRenderer {
    async fn render(&self, _source: &Path, job_id: Uuid) -> Result<(), StageError> {
        let out_dir = self.media_root.join(format!("manim_code_{job_id}/480p15"));
        let write = async {
            tokio::fs::create_dir_all(&out_dir).await?;
            tokio::fs::write(out_dir.join(format!("{job_id}.mp4")), FAKE_VIDEO_BYTES).await
        };
        write.await.map_err(|e| StageError::Unexpected {
            context: "stub render",
            detail: e.to_string(),
        })
    }
}

/// Renderer that always fails with a fixed detail string.
struct BrokenRenderer;

#[async_trait]
impl Renderer for BrokenRenderer {
    async fn render(&self, _source: &Path, _job_id: Uuid) -> Result<(), StageError> {
        Err(StageError::Unexpected {
            context: "rendering",
            detail: "SyntaxError: invalid syntax on line 3".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// A ready-to-drive application plus the handles tests need.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<JobStore>,
    /// Keeps the per-test work directory alive for the app's lifetime.
    pub work_dir: tempfile::TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8501".to_string()],
        request_timeout_secs: 30,
    }
}

/// App whose pipeline succeeds on the first attempt.
pub fn build_test_app() -> TestContext {
    build_with_renderer(|media_root| {
        Arc::new(InstantRenderer {
            media_root: media_root.to_path_buf(),
        })
    })
}

/// App whose render stage always fails, exhausting the retry budget.
pub fn build_failing_app() -> TestContext {
    build_with_renderer(|_| Arc::new(BrokenRenderer))
}

fn build_with_renderer(
    make_renderer: impl FnOnce(&Path) -> Arc<dyn Renderer>,
) -> TestContext {
    let work_dir = tempfile::tempdir().expect("temp dir");
    let media_root = work_dir.path().join("media/videos");
    let videos_dir = work_dir.path().join("videos");

    let pipeline_config = PipelineConfig {
        max_retries: 2,
        retry_backoff: Duration::ZERO,
        work_dir: work_dir.path().to_path_buf(),
        media_root: media_root.clone(),
        videos_dir: videos_dir.clone(),
        ..PipelineConfig::default()
    };

    let renderer = make_renderer(&media_root);
    let locator = Arc::new(WideningLocator::new(
        media_root,
        work_dir.path().to_path_buf(),
        videos_dir,
    ));

    let store = Arc::new(JobStore::new());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::new(StubGenerator),
        renderer,
        locator,
        pipeline_config,
    ));

    let config = test_config();
    let state = AppState {
        store: Arc::clone(&store),
        orchestrator,
        config: Arc::new(config.clone()),
    };

    TestContext {
        app: build_app_router(state, &config),
        store,
        work_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Perform a GET request against the app.
pub async fn get(app: &Router, path: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Perform a POST request with a JSON body.
pub async fn post_json(app: &Router, path: &str, body: serde_json::Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Poll `/status/{job_id}` until the job reaches a terminal state.
pub async fn wait_for_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app, &format!("/status/{job_id}")).await;
        let json = body_json(response).await;
        let status = json["status"].as_str().unwrap_or_default();
        if status == "completed" || status == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}
