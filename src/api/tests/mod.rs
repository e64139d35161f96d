use super::*;
use crate::Config;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;


/// Config whose run folders live inside `root`, small enough for fast runs
fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.pipeline.page_count = 3;
    config.pipeline.row_count = 20;
    config.pipeline.max_concurrent_pages = 2;
    config.folders.pages_folder = root.join("pages");
    config.folders.builds_folder = root.join("builds");
    config
}

/// Helper to create a test Pipeline backed by a temporary directory
fn create_test_pipeline() -> (Pipeline, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let pipeline = Pipeline::new(test_config(temp_dir.path())).unwrap();
    (pipeline, temp_dir)
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let pipeline = Pipeline::new(config).unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server(pipeline, async {
        shutdown_rx.await.ok();
    }));

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.api.bind_address = occupied.local_addr().unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let result = start_api_server(pipeline, std::future::pending()).await;
    assert!(matches!(result, Err(crate::Error::Io(_))));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (pipeline, _temp_dir) = create_test_pipeline();
    let app = create_router(pipeline);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.api.cors_enabled = false;
    let app = create_router(Pipeline::new(config).unwrap());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(Pipeline::new(config).unwrap());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (pipeline, _temp_dir) = create_test_pipeline();
    let app = create_router(pipeline);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Swagger UI should be accessible when enabled"
    );

    let body_str = body_string(response).await;
    assert!(
        body_str.contains("<!DOCTYPE html>") || body_str.contains("<html"),
        "Response should contain HTML"
    );
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    config.server.api.swagger_ui = false;
    let app = create_router(Pipeline::new(config).unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}
