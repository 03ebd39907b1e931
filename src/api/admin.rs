//! Account provisioning endpoints.
//!
//! All endpoints require a bearer token whose role grants `role.assign`.

use axum::{
    Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{JsonBody, data_with_message, success};
use crate::account::AccountService;
use crate::auth::{PermissionGate, RoleResolver, TokenService, authenticate, require_permission};
use crate::error::ApiError;

/// State for admin endpoints.
#[derive(Clone)]
pub struct AdminState {
    pub account: Arc<AccountService>,
    pub tokens: Arc<TokenService>,
    pub resolver: Arc<RoleResolver>,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/create-user", post(create_user))
        .route("/resend-activation", post(resend_activation))
        .layer(middleware::from_fn_with_state(
            PermissionGate::new(state.resolver.clone(), "role.assign"),
            require_permission,
        ))
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    email: Option<String>,
    role_name: Option<String>,
}

async fn create_user(
    State(state): State<AdminState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .account
        .admin_create_user(req.email.as_deref(), req.role_name.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        data_with_message("Activation email sent", user),
    ))
}

#[derive(Deserialize)]
struct ResendActivationRequest {
    email: Option<String>,
}

async fn resend_activation(
    State(state): State<AdminState>,
    JsonBody(req): JsonBody<ResendActivationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .account
        .resend_activation(req.email.as_deref())
        .await?;
    Ok(success("Activation email sent"))
}
