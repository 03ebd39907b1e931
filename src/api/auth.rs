//! Credential endpoints: login, refresh, logout and password reset.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{JsonBody, success};
use crate::account::AccountService;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub account: Arc<AccountService>,
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AuthState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .account
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(response))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

async fn refresh(
    State(state): State<AuthState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let access_token = state
        .account
        .refresh_access_token(req.refresh_token.as_deref())
        .await?;
    Ok(Json(RefreshResponse { access_token }))
}

/// Logout never fails, so the body is parsed leniently.
async fn logout(State(state): State<AuthState>, body: Bytes) -> impl IntoResponse {
    let token = serde_json::from_slice::<RefreshRequest>(&body)
        .ok()
        .and_then(|r| r.refresh_token);
    state.account.logout(token.as_deref()).await;
    success("Logged out")
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    email: Option<String>,
}

async fn forgot_password(
    State(state): State<AuthState>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.account.forgot_password(req.email.as_deref()).await?;
    Ok(success(message))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    new_password: Option<String>,
    confirm_password: Option<String>,
}

async fn reset_password(
    State(state): State<AuthState>,
    Path(token): Path<String>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .account
        .reset_password(
            &token,
            req.new_password.as_deref(),
            req.confirm_password.as_deref(),
        )
        .await?;
    Ok(success("Password successfully reset"))
}
