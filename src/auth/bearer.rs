//! `Authorization: Bearer` header parsing.

use axum::http::{HeaderMap, header};

use super::errors::AuthErrorKind;

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The value must be exactly two space-separated parts and the scheme is
/// case-sensitive.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthErrorKind> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthErrorKind::MissingToken)?
        .to_str()
        .map_err(|_| AuthErrorKind::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthErrorKind::MalformedHeader),
    }
}
