//! Authentication user types.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User UUID
    pub user_id: String,
    /// Role name at the time the token was issued
    pub role: String,
}

/// Reads the `Identity` placed in request extensions by `authenticate`.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiAuthError::new(AuthErrorKind::NotAuthenticated))
    }
}
