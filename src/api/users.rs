//! User administration endpoints.
//!
//! Every route needs a valid bearer token. Deleting is limited to the
//! `admin` and `superadmin` roles, changing a role to `superadmin`.

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, put},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{JsonBody, data, data_with_message, success};
use crate::auth::{Identity, RoleGate, TokenService, allow_roles, authenticate};
use crate::db::Database;
use crate::error::{ApiError, ResultExt, validate_uuid};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
}

const DELETE_ROLES: RoleGate = RoleGate {
    roles: &["admin", "superadmin"],
};

const ASSIGN_ROLES: RoleGate = RoleGate {
    roles: &["superadmin"],
};

pub fn router(state: UsersState) -> Router {
    let read_router = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user));

    let delete_router = Router::new()
        .route("/{id}", delete(delete_user))
        .layer(middleware::from_fn_with_state(DELETE_ROLES, allow_roles));

    let assign_router = Router::new()
        .route("/{id}/role", put(assign_role))
        .layer(middleware::from_fn_with_state(ASSIGN_ROLES, allow_roles));

    Router::new()
        .merge(read_router)
        .merge(delete_router)
        .merge(assign_router)
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ))
        .with_state(state)
}

async fn list_users(State(state): State<UsersState>) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .db
        .users()
        .list_views()
        .await
        .db_err("Failed to list users")?;

    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }
    Ok(data(users))
}

async fn get_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&id)?;

    let user = state
        .db
        .users()
        .get_view(&id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(data(user))
}

async fn delete_user(
    State(state): State<UsersState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&id)?;

    let deleted = state
        .db
        .users()
        .delete(&id)
        .await
        .db_err("Failed to delete user")?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user = %id, by = %identity.user_id, "Deleted user");
    Ok(success("User deleted successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRoleRequest {
    role_name: Option<String>,
}

async fn assign_role(
    State(state): State<UsersState>,
    identity: Identity,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<AssignRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&id)?;

    let role_name = req
        .role_name
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::field("roleName", "Role name is required"))?;

    let role = state
        .db
        .roles()
        .get_by_name(role_name)
        .await
        .db_err("Failed to look up role")?
        .ok_or_else(|| ApiError::bad_request("Invalid role name"))?;

    let users = state.db.users();
    if !users
        .set_role(&id, role.id)
        .await
        .db_err("Failed to assign role")?
    {
        return Err(ApiError::not_found("User not found"));
    }

    let user = users
        .get_view(&id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user = %id, role = %role.name, by = %identity.user_id, "Assigned role");
    Ok(data_with_message("Role assigned", user))
}
