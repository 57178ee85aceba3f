//! Web API Authentication Tests
//!
//! Integration tests for registration, login, logout and identity.

mod common;

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use common::{TestApp, X_TOKEN};
use serde_json::{json, Value};

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::new().await;

    let response = app.register("a@x.com", "pw1").await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["email"], "a@x.com");
    assert!(body["id"].is_i64());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;
    app.register("a@x.com", "pw1").await;

    let response = app.register("a@x.com", "other").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Already exist");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .json(&json!({ "password": "pw1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["message"], "Missing email");

    let response = app
        .server
        .post("/users")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Missing password"
    );
}

#[tokio::test]
async fn test_register_invalid_json() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/users")
        .bytes("{not json".as_bytes().into())
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login / Logout Tests
// ============================================================================

#[tokio::test]
async fn test_connect_wrong_password() {
    let app = TestApp::new().await;
    app.register("a@x.com", "pw1").await;

    let response = app.connect("a@x.com", "wrong").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_unknown_email() {
    let app = TestApp::new().await;

    app.connect("nobody@x.com", "pw1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_without_authorization() {
    let app = TestApp::new().await;

    app.server
        .get("/connect")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_malformed_authorization() {
    let app = TestApp::new().await;

    app.server
        .get("/connect")
        .add_header(AUTHORIZATION, "Basic !!!".to_string())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_me_logout_flow() {
    let app = TestApp::new().await;
    app.register("a@x.com", "pw1").await;

    let response = app.connect("a@x.com", "pw1").await;
    response.assert_status_ok();
    let token = response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let me = app.get("/users/me", &token).await;
    me.assert_status_ok();
    let body: Value = me.json();
    assert_eq!(body["email"], "a@x.com");
    assert!(body["id"].is_i64());

    app.get("/disconnect", &token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.get("/users/me", &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // A revoked token cannot be revoked again
    app.get("/disconnect", &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_without_token() {
    let app = TestApp::new().await;

    app.server
        .get("/users/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/users/me")
        .add_header(X_TOKEN, "not-a-token".to_string())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_expires() {
    let app = TestApp::with_token_ttl(Duration::from_millis(100)).await;
    let token = app.login("a@x.com", "pw1").await;

    app.get("/users/me", &token).await.assert_status_ok();

    tokio::time::sleep(Duration::from_millis(150)).await;

    app.get("/users/me", &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Status Tests
// ============================================================================

#[tokio::test]
async fn test_status_and_stats() {
    let app = TestApp::new().await;

    let status = app.server.get("/status").await;
    status.assert_status_ok();
    assert_eq!(status.json::<Value>(), json!({ "redis": true, "db": true }));

    let token = app.login("a@x.com", "pw1").await;
    app.create_folder(&token, "docs", 0).await;
    app.login("b@x.com", "pw2").await;

    let stats = app.server.get("/stats").await;
    stats.assert_status_ok();
    assert_eq!(stats.json::<Value>(), json!({ "users": 2, "files": 1 }));
}
