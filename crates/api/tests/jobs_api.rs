//! Integration tests for job submission, status polling, listing, and logs.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, get, post_json, wait_for_terminal};
use serde_json::json;

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_queued_immediately() {
    let ctx = common::build_test_app();

    let response = post_json(
        &ctx.app,
        "/generate",
        json!({ "topic": "Pythagorean theorem" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "queued");
    assert!(body["job_id"].is_string());
    assert!(body["message"].as_str().unwrap().contains("/status"));
}

#[tokio::test]
async fn submit_rejects_empty_topic() {
    let ctx = common::build_test_app();

    let response = post_json(&ctx.app, "/generate", json!({ "topic": "" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Status sentinel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_for_unknown_id_is_a_sentinel_not_an_error() {
    let ctx = common::build_test_app();

    let response = get(
        &ctx.app,
        "/status/00000000-0000-0000-0000-000000000000",
    )
    .await;

    // Structured data with HTTP 200, never a transport-level fault.
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
    assert!(body["video_path"].is_null());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn status_for_malformed_id_behaves_like_unknown() {
    let ctx = common::build_test_app();

    let response = get(&ctx.app, "/status/not-a-uuid").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_job_runs_to_completed_with_video_path() {
    let ctx = common::build_test_app();

    let response = post_json(&ctx.app, "/generate", json!({ "topic": "unit circle" })).await;
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let terminal = wait_for_terminal(&ctx.app, &job_id).await;

    assert_eq!(terminal["status"], "completed");
    assert!(terminal["error"].is_null());
    let video_path = terminal["video_path"].as_str().unwrap();
    assert!(video_path.ends_with(&format!("{job_id}.mp4")));

    // The store agrees with the wire view.
    let job = ctx
        .store
        .get(job_id.parse().unwrap())
        .await
        .expect("job exists");
    assert_eq!(job.retry_count, 0);
    assert_matches!(job.video_path, Some(_));
}

// ---------------------------------------------------------------------------
// Failure path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_pipeline_ends_failed_with_error_detail() {
    let ctx = common::build_failing_app();

    let response = post_json(&ctx.app, "/generate", json!({ "topic": "doomed" })).await;
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let terminal = wait_for_terminal(&ctx.app, &job_id).await;

    assert_eq!(terminal["status"], "failed");
    assert!(terminal["video_path"].is_null());
    assert!(terminal["error"]
        .as_str()
        .unwrap()
        .contains("SyntaxError: invalid syntax on line 3"));

    // The retry budget was fully consumed.
    let logs = body_json(get(&ctx.app, &format!("/logs/{job_id}")).await).await;
    assert_eq!(logs["retry_count"], 2);
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_jobs_reports_all_submissions() {
    let ctx = common::build_test_app();

    post_json(&ctx.app, "/generate", json!({ "topic": "first topic" })).await;
    // Distinct creation timestamps keep the newest-first ordering stable.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    post_json(&ctx.app, "/generate", json!({ "topic": "second topic" })).await;

    let body = body_json(get(&ctx.app, "/list-jobs").await).await;
    let jobs = body["jobs"].as_array().unwrap();

    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert!(job["job_id"].is_string());
        assert!(job["status"].is_string());
        assert!(job["topic"].is_string());
        assert!(job["created_at"].is_string());
    }
    // Newest first.
    assert_eq!(jobs[0]["topic"], "second topic");
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logs_for_unknown_id_is_a_sentinel() {
    let ctx = common::build_test_app();

    let response = get(&ctx.app, "/logs/00000000-0000-0000-0000-000000000000").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["retry_count"], 0);
}
