//! Token issuance and verification.
//!
//! Access tokens are verified from their signature alone. Refresh tokens must
//! also be present in the database, which is what makes logout effective.

use std::sync::Arc;

use tracing::debug;

use super::types::Identity;
use crate::db::Database;
use crate::jwt::{JwtConfig, JwtError, unix_now};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("refresh token not found")]
    NotFound,
    #[error("token storage error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Jwt(JwtError),
}

/// Owner of a verified refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSubject {
    /// Internal user ID from the stored record
    pub user_id: i64,
    /// Public user UUID from the token claims
    pub user_uuid: String,
}

pub struct TokenService {
    db: Database,
    jwt: Arc<JwtConfig>,
}

impl TokenService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        Self { db, jwt }
    }

    pub fn issue_access_token(&self, user_uuid: &str, role: &str) -> Result<String, TokenError> {
        self.jwt
            .generate_access_token(user_uuid, role)
            .map(|r| r.token)
            .map_err(TokenError::Jwt)
    }

    /// Mint a refresh token and store it as the user's only refresh token.
    pub async fn issue_refresh_token(
        &self,
        user_id: i64,
        user_uuid: &str,
    ) -> Result<String, TokenError> {
        let result = self
            .jwt
            .generate_refresh_token(user_uuid)
            .map_err(TokenError::Jwt)?;

        self.db
            .refresh_tokens()
            .upsert(user_id, &result.token, result.expires_at as i64)
            .await?;

        Ok(result.token)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Identity, TokenError> {
        match self.jwt.validate_access_token(token) {
            Ok(claims) => Ok(Identity {
                user_id: claims.id,
                role: claims.role,
            }),
            Err(JwtError::Expired) => Err(TokenError::Expired),
            Err(_) => Err(TokenError::Invalid),
        }
    }

    /// Verify a refresh token against the store and its signature.
    ///
    /// Order: unknown token is `NotFound`, bad signature is `Invalid`, and a
    /// token past either its stored or its signed expiry is deleted and
    /// reported as `Expired`.
    pub async fn verify_refresh_token(&self, token: &str) -> Result<RefreshSubject, TokenError> {
        let store = self.db.refresh_tokens();
        let record = store.find(token).await?.ok_or(TokenError::NotFound)?;

        let claims = match self.jwt.validate_refresh_token(token) {
            Ok(claims) => claims,
            Err(JwtError::Expired) => {
                store.delete(token).await?;
                debug!(user_id = record.user_id, "Purged expired refresh token");
                return Err(TokenError::Expired);
            }
            Err(JwtError::TimeError) => return Err(TokenError::Jwt(JwtError::TimeError)),
            Err(_) => return Err(TokenError::Invalid),
        };

        let now = unix_now().map_err(TokenError::Jwt)? as i64;
        if record.expires_at < now {
            store.delete(token).await?;
            debug!(user_id = record.user_id, "Purged expired refresh token");
            return Err(TokenError::Expired);
        }

        Ok(RefreshSubject {
            user_id: record.user_id,
            user_uuid: claims.id,
        })
    }

    /// Delete a refresh token. Unknown tokens are ignored.
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<(), TokenError> {
        self.db.refresh_tokens().delete(token).await?;
        Ok(())
    }
}
