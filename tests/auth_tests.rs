//! Tests for the credential endpoints.
//!
//! Tests cover:
//! - Login success, validation, and enumeration-safe failures
//! - Refresh and logout lifecycle
//! - Forgot/reset password flow

mod common;

use axum::http::StatusCode;
use common::{PASSWORD, create_test_app};
use serde_json::json;

#[tokio::test]
async fn test_login_returns_verifiable_tokens() {
    let app = create_test_app().await;
    let uuid = app.create_active_user("alice@example.com", "alice", "admin").await;

    let (status, body) = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let access = body["accessToken"].as_str().unwrap();
    let claims = app.jwt.validate_access_token(access).unwrap();
    assert_eq!(claims.id, uuid);
    assert_eq!(claims.role, "admin");

    let refresh = body["refreshToken"].as_str().unwrap();
    let refresh_claims = app.jwt.validate_refresh_token(refresh).unwrap();
    assert_eq!(refresh_claims.id, uuid);

    assert_eq!(body["user"]["id"], uuid);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["permissions"], json!(["role.assign", "user.*"]));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = create_test_app().await;
    app.create_active_user("alice@example.com", "alice", "user").await;

    let (status, _) = app.login("ALICE@Example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = create_test_app().await;
    app.create_active_user("alice@example.com", "alice", "user").await;

    let (wrong_status, wrong_body) = app.login("alice@example.com", "wrong-password").await;
    let (unknown_status, unknown_body) = app.login("nobody@example.com", PASSWORD).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_before_activation_is_forbidden() {
    let app = create_test_app().await;
    let admin = app.token_for("admin").await;
    let (status, _) = app
        .post_json(
            "/api/admin/create-user",
            json!({ "email": "new@example.com", "roleName": "user" }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.login("new@example.com", "whatever1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "status": "error", "message": "Please activate your account first" })
    );
}

#[tokio::test]
async fn test_login_validation_errors() {
    let app = create_test_app().await;

    let (status, body) = app
        .post_json("/api/auth/login", json!({ "email": "nope", "password": "123" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);

    let (status, body) = app.post_json("/api/auth/login", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[tokio::test]
async fn test_refresh_issues_new_access_token_until_logout() {
    let app = create_test_app().await;
    let uuid = app.create_active_user("alice@example.com", "alice", "user").await;
    let (_, body) = app.login("alice@example.com", PASSWORD).await;
    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    let (status, first) = app
        .post_json("/api/auth/refresh", json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = first["accessToken"].as_str().unwrap();
    assert_ne!(new_access, access);
    let claims = app.jwt.validate_access_token(new_access).unwrap();
    assert_eq!(claims.id, uuid);
    assert_eq!(claims.role, "user");

    // Not rotated: the same refresh token keeps working.
    let (status, _) = app
        .post_json("/api/auth/refresh", json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_json("/api/auth/logout", json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    let (status, body) = app
        .post_json("/api/auth/refresh", json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Refresh token not found");
}

#[tokio::test]
async fn test_refresh_errors() {
    let app = create_test_app().await;

    let (status, _) = app.post_json("/api/auth/refresh", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/auth/refresh", json!({ "refreshToken": "unknown" }), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_second_login_replaces_refresh_token() {
    let app = create_test_app().await;
    app.create_active_user("alice@example.com", "alice", "user").await;

    let (_, first) = app.login("alice@example.com", PASSWORD).await;
    let (_, second) = app.login("alice@example.com", PASSWORD).await;

    let (status, _) = app
        .post_json(
            "/api/auth/refresh",
            json!({ "refreshToken": first["refreshToken"] }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post_json(
            "/api/auth/refresh",
            json!({ "refreshToken": second["refreshToken"] }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let app = create_test_app().await;

    let (status, _) = app
        .post_json("/api/auth/logout", json!({ "refreshToken": "never-issued" }), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_is_enumeration_safe() {
    let app = create_test_app().await;
    let uuid = app.create_active_user("alice@example.com", "alice", "user").await;

    let (known_status, known_body) = app
        .post_json("/api/auth/forgot-password", json!({ "email": "alice@example.com" }), None)
        .await;
    let (unknown_status, unknown_body) = app
        .post_json("/api/auth/forgot-password", json!({ "email": "ghost@example.com" }), None)
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);

    // A second request leaves exactly one reset token.
    app.post_json("/api/auth/forgot-password", json!({ "email": "alice@example.com" }), None)
        .await;
    let user = app.db.users().get_by_uuid(&uuid).await.unwrap().unwrap();
    assert_eq!(app.db.reset_tokens().count_for_user(user.id).await.unwrap(), 1);

    let (status, _) = app.post_json("/api/auth/forgot-password", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = create_test_app().await;
    app.create_active_user("alice@example.com", "alice", "user").await;
    app.post_json("/api/auth/forgot-password", json!({ "email": "alice@example.com" }), None)
        .await;
    let token = app.mailed_token("alice@example.com", "reset-password");
    assert_eq!(token.len(), 64);

    let path = format!("/api/auth/reset-password/{}", token);
    let (status, _) = app
        .post_json(
            &path,
            json!({ "newPassword": "brand-new-pass", "confirmPassword": "different" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            &path,
            json!({ "newPassword": "brand-new-pass", "confirmPassword": "brand-new-pass" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("alice@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("alice@example.com", "brand-new-pass").await;
    assert_eq!(status, StatusCode::OK);

    // Single use.
    let (status, body) = app
        .post_json(
            &path,
            json!({ "newPassword": "another-pass", "confirmPassword": "another-pass" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = create_test_app().await;
    let (status, body) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}
