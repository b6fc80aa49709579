//! Routing and bearer-auth gate tests.
//!
//! Everything here resolves before the first database query, so no Postgres
//! instance is needed.

mod helpers;

use helpers::setup_test_app;
use inkpress_api::auth::JwtService;
use inkpress_core::models::Role;
use serde_json::Value;

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["info"]["title"], "Inkpress API");
    assert!(body["paths"]["/api/files/{id}/download"].is_object());
    assert!(body["paths"]["/api/download-requests"].is_object());
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = setup_test_app().await;

    let protected = [
        "/api/auth/profile",
        "/api/files/1/download",
        "/api/download-requests/check/1",
        "/api/download-requests/my-requests",
        "/api/download-requests",
        "/api/download-requests/1",
    ];

    for path in protected {
        let response = app.server.get(path).await;
        assert_eq!(response.status_code(), 401, "expected 401 for {}", path);

        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED", "error code for {}", path);
    }
}

#[tokio::test]
async fn test_create_request_rejected_before_body_is_read() {
    let app = setup_test_app().await;

    // No bearer credential: the identity gate fires before body parsing,
    // even with an invalid payload.
    let response = app
        .server
        .post("/api/download-requests")
        .text("not json")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_malformed_authorization_header_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/api/auth/profile")
        .add_header("Authorization", "Token abc123")
        .await;
    assert_eq!(response.status_code(), 401);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid authorization header format");
}

#[tokio::test]
async fn test_garbage_bearer_token_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/api/auth/profile")
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), 401);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_token_signed_with_wrong_secret_is_rejected() {
    let app = setup_test_app().await;

    let other = JwtService::new("another-secret-key-of-decent-length", 24);
    let token = other.issue(1, "intruder", Role::Admin).expect("issue token");

    let response = app
        .server
        .get("/api/download-requests")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    assert_eq!(response.status_code(), 401);
}
