mod activation;
mod admin;
mod auth;
mod extract;
mod photos;
mod users;

use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::account::AccountService;
use crate::auth::{RoleResolver, TokenService};
use crate::db::Database;

pub use extract::JsonBody;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    account: Arc<AccountService>,
    tokens: Arc<TokenService>,
    resolver: Arc<RoleResolver>,
) -> Router {
    let auth_state = auth::AuthState {
        account: account.clone(),
    };

    let activation_state = activation::ActivationState {
        account: account.clone(),
    };

    let admin_state = admin::AdminState {
        account: account.clone(),
        tokens: tokens.clone(),
        resolver,
    };

    let users_state = users::UsersState {
        db: db.clone(),
        tokens: tokens.clone(),
    };

    let photos_state = photos::PhotosState {
        db,
        account,
        tokens,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/activate", activation::router(activation_state))
        .nest("/admin", admin::router(admin_state))
        .nest("/users", users::router(users_state))
        .nest("/photos", photos::router(photos_state))
}

#[derive(Serialize)]
struct MessageResponse {
    status: &'static str,
    message: &'static str,
}

/// `{"status":"success","message":...}`
fn success(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse {
        status: "success",
        message,
    })
}

#[derive(Serialize)]
struct DataResponse<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    data: T,
}

/// `{"status":"success","data":...}`
fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        status: "success",
        message: None,
        data,
    })
}

/// `{"status":"success","message":...,"data":...}`
fn data_with_message<T: Serialize>(message: &'static str, data: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        status: "success",
        message: Some(message),
        data,
    })
}
