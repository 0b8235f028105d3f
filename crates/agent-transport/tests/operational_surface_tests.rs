//! Integration tests for the agent operational surface: health, discovery,
//! version, and the authenticated reload endpoint.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_reports_ready_once_runtime_is_up() {
    let app = TestApp::new().await;
    let (status, body) = app.request(TestApp::get("/health")).await;

    assert_eq!(status, 200);
    assert_eq!(body["overall"], "healthy");
    assert!(body["skills"].as_object().unwrap().contains_key("test-agent"));
}

#[tokio::test]
async fn discovery_returns_local_identity() {
    let app = TestApp::new().await;
    let (status, body) = app.request(TestApp::get("/discovery")).await;

    assert_eq!(status, 200);
    assert_eq!(body["id"], "test-agent");
    assert_eq!(body["capabilities"][0], "demo");
}

#[tokio::test]
async fn version_reports_wasmtime_version() {
    let app = TestApp::new().await;
    let (status, body) = app.request(TestApp::get("/version")).await;

    assert_eq!(status, 200);
    assert!(body["wasmtime_version"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn reload_without_auth_token_configured_succeeds_unauthenticated() {
    let app = TestApp::new().await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/skills/demo/reload")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _body) = app.request(req).await;

    assert_eq!(status, 200);
}

#[tokio::test]
async fn reload_with_auth_token_configured_rejects_missing_bearer() {
    let app = TestApp::with_auth_token(Some("super-secret".to_string())).await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/skills/demo/reload")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.request(req).await;

    assert_eq!(status, 401);
    assert_eq!(body["kind"], "Unauthorized");
}

#[tokio::test]
async fn reload_with_auth_token_configured_accepts_correct_bearer() {
    let app = TestApp::with_auth_token(Some("super-secret".to_string())).await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/skills/demo/reload")
        .header("authorization", "Bearer super-secret")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _body) = app.request(req).await;

    assert_eq!(status, 200);
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.request(TestApp::get("/nonexistent")).await;

    assert_eq!(status, 404);
    assert_eq!(body["kind"], "NotFound");
}
