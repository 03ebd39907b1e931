//! Request middleware for authentication and authorization.
//!
//! `authenticate` must run first: it verifies the bearer token and stores the
//! caller's `Identity` in request extensions. The gates read it back from
//! there.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use super::bearer::bearer_token;
use super::errors::{ApiAuthError, AuthErrorKind};
use super::resolver::RoleResolver;
use super::tokens::TokenService;
use super::types::Identity;

/// Verify the access token and attach the caller's identity. No database
/// access.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let token = bearer_token(request.headers())?;
    let identity = tokens.verify_access_token(token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        AuthErrorKind::InvalidToken
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// State for `require_permission`: the key a route needs.
#[derive(Clone)]
pub struct PermissionGate {
    pub resolver: Arc<RoleResolver>,
    pub permission: &'static str,
}

impl PermissionGate {
    pub fn new(resolver: Arc<RoleResolver>, permission: &'static str) -> Self {
        Self {
            resolver,
            permission,
        }
    }
}

/// Allow the request only if the caller's role grants the gate's permission.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    identity: Identity,
    request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let role = gate.resolver.resolve(&identity.role).await.map_err(|e| {
        error!(role = %identity.role, error = %e, "Failed to resolve role");
        AuthErrorKind::ResolverFailure
    })?;

    if !role.grants(gate.permission) {
        debug!(
            user = %identity.user_id,
            role = %identity.role,
            permission = gate.permission,
            "Permission denied"
        );
        return Err(AuthErrorKind::InsufficientPermission.into());
    }

    Ok(next.run(request).await)
}

/// State for `allow_roles`: the role names admitted by a route.
#[derive(Clone, Copy)]
pub struct RoleGate {
    pub roles: &'static [&'static str],
}

/// Allow the request only if the caller's role name is in the gate's list.
/// Permissions are not consulted.
pub async fn allow_roles(
    State(gate): State<RoleGate>,
    identity: Identity,
    request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    if !gate.roles.contains(&identity.role.as_str()) {
        return Err(AuthErrorKind::InsufficientPermission.into());
    }
    Ok(next.run(request).await)
}
