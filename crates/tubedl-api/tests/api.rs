//! API integration tests.
//!
//! Exercises the full router with an `echo` stand-in for the downloader so
//! jobs finish quickly and deterministically without network access.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tubedl_api::{create_router, ApiConfig, AppState};

async fn test_app(dir: &TempDir) -> (Router, AppState) {
    let config = ApiConfig {
        jobs_dir: dir.path().join("jobs"),
        output_dir: dir.path().join("out"),
        downloader_bin: "echo".to_string(),
        required_tools: vec!["sh".to_string()],
        ..ApiConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (create_router(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_download(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_download_missing_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_download(r#"{"output": "/tmp/x"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("missing url"));

    // No job may have been created.
    assert_eq!(state.registry.live_count().await, 0);
    let listing = app.oneshot(get("/jobs")).await.unwrap();
    let json = body_json(listing).await;
    assert_eq!(json["jobs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_download_missing_tools_is_500_with_details() {
    let dir = TempDir::new().unwrap();
    let config = ApiConfig {
        jobs_dir: dir.path().join("jobs"),
        output_dir: dir.path().join("out"),
        required_tools: vec!["tubedl-absent-tool".to_string()],
        ..ApiConfig::default()
    };
    let app = create_router(AppState::new(config).await.unwrap());

    let response = app
        .oneshot(post_download(r#"{"url": "https://example.com/v"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "missing dependencies");
    assert!(json["details"][0]
        .as_str()
        .unwrap()
        .contains("tubedl-absent-tool"));
}

#[tokio::test]
async fn test_status_for_unknown_job_is_404() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir).await;

    let response = app
        .oneshot(get("/status/550e8400-e29b-41d4-a716-446655440000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logs_for_unknown_job_is_404() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir).await;

    let response = app.oneshot(get("/logs/no-such-job")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_download_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir).await;

    // `echo <url> -o <dir>` exits 0 immediately and writes the url to the log.
    let response = app
        .clone()
        .oneshot(post_download(r#"{"url": "https://example.com/video"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let accepted = body_json(response).await;
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    assert!(accepted["pid"].as_u64().unwrap() > 0);

    // Poll until the waiter reports the exit.
    let mut last = Value::Null;
    for _ in 0..250 {
        let response = app
            .clone()
            .oneshot(get(&format!("/status/{job_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = body_json(response).await;
        if last["running"] == false {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(last["running"], false);
    assert_eq!(last["returncode"], 0);
    assert!(last["log_tail"]
        .as_str()
        .unwrap()
        .contains("https://example.com/video"));

    // Raw log is served as plain text.
    let response = app
        .clone()
        .oneshot(get(&format!("/logs/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    // The finished job shows up in the listing.
    let response = app.oneshot(get("/jobs")).await.unwrap();
    let json = body_json(response).await;
    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["job_id"], job_id.as_str());
}

#[tokio::test]
async fn test_failing_download_reports_returncode() {
    let dir = TempDir::new().unwrap();
    let config = ApiConfig {
        jobs_dir: dir.path().join("jobs"),
        output_dir: dir.path().join("out"),
        // `false` ignores its arguments and exits 1.
        downloader_bin: "false".to_string(),
        required_tools: vec![],
        ..ApiConfig::default()
    };
    let app = create_router(AppState::new(config).await.unwrap());

    let response = app
        .clone()
        .oneshot(post_download(r#"{"url": "https://example.com/v"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut last = Value::Null;
    for _ in 0..250 {
        let response = app
            .clone()
            .oneshot(get(&format!("/status/{job_id}")))
            .await
            .unwrap();
        last = body_json(response).await;
        if last["running"] == false {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(last["running"], false);
    assert_eq!(last["returncode"], 1);
}
