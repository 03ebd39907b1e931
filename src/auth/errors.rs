//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why a request was rejected by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    MissingToken,
    MalformedHeader,
    InvalidToken,
    NotAuthenticated,
    InsufficientPermission,
    ResolverFailure,
}

/// API authentication errors. Same body shape as `ApiError`.
#[derive(Debug)]
pub struct ApiAuthError {
    kind: AuthErrorKind,
}

impl ApiAuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::MissingToken
            | AuthErrorKind::MalformedHeader
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthErrorKind::InsufficientPermission => StatusCode::FORBIDDEN,
            AuthErrorKind::ResolverFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::MissingToken => "No token provided",
            AuthErrorKind::MalformedHeader => "Invalid authorization header",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::InsufficientPermission => "Access denied",
            AuthErrorKind::ResolverFailure => "Internal server error",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            status: &'static str,
            message: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                status: "error",
                message: self.message(),
            }),
        )
            .into_response()
    }
}
