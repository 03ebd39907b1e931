//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with distinct secrets so that a leaked
//! access secret cannot be used to mint long-lived credentials.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// JWT claims for access tokens (stateless).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User UUID
    pub id: String,
    /// Role name
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique token id
    pub jti: String,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User UUID
    pub id: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique token id
    pub jti: String,
}

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 7 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Signing keys for one token kind.
#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    access: KeyPair,
    refresh: KeyPair,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

impl JwtConfig {
    /// Create a new JWT configuration from the access and refresh secrets.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access: KeyPair::new(access_secret),
            refresh: KeyPair::new(refresh_secret),
        }
    }

    /// Generate an access token carrying the user's role name.
    pub fn generate_access_token(
        &self,
        user_uuid: &str,
        role: &str,
    ) -> Result<AccessTokenResult, JwtError> {
        let now = unix_now()?;

        let claims = AccessClaims {
            id: user_uuid.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + ACCESS_TOKEN_DURATION_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access.encoding)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            duration: ACCESS_TOKEN_DURATION_SECS,
        })
    }

    /// Generate a refresh token. Persisting it is the caller's job.
    pub fn generate_refresh_token(&self, user_uuid: &str) -> Result<RefreshTokenResult, JwtError> {
        let now = unix_now()?;
        let exp = now + REFRESH_TOKEN_DURATION_SECS;

        let claims = RefreshClaims {
            id: user_uuid.to_string(),
            iat: now,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh.encoding)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshTokenResult {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.access.decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(JwtError::from_decode)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        jsonwebtoken::decode::<RefreshClaims>(token, &self.refresh.decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(JwtError::from_decode)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Error encoding the token
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    /// Signature, format or claim failure
    #[error("Failed to decode token: {0}")]
    Decoding(jsonwebtoken::errors::Error),
    /// The token's `exp` claim is in the past
    #[error("Token has expired")]
    Expired,
    /// System time error
    #[error("System time error")]
    TimeError,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Decoding(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new(b"access-secret-for-testing", b"refresh-secret-for-testing")
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = config();

        let result = config.generate_access_token("uuid-123", "admin").unwrap();
        assert_eq!(result.duration, ACCESS_TOKEN_DURATION_SECS);

        let claims = config.validate_access_token(&result.token).unwrap();
        assert_eq!(claims.id, "uuid-123");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_DURATION_SECS);
    }

    #[test]
    fn test_generate_and_validate_refresh_token() {
        let config = config();

        let result = config.generate_refresh_token("uuid-123").unwrap();
        assert_eq!(
            result.expires_at - result.issued_at,
            REFRESH_TOKEN_DURATION_SECS
        );

        let claims = config.validate_refresh_token(&result.token).unwrap();
        assert_eq!(claims.id, "uuid-123");
        assert_eq!(claims.exp, result.expires_at);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let config = config();

        let access = config.generate_access_token("uuid-123", "user").unwrap();
        let refresh = config.generate_refresh_token("uuid-123").unwrap();

        assert!(config.validate_refresh_token(&access.token).is_err());
        assert!(config.validate_access_token(&refresh.token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let result = config().validate_access_token("invalid-token");
        assert!(matches!(result, Err(JwtError::Decoding(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig::new(b"secret-1", b"refresh-1");
        let config2 = JwtConfig::new(b"secret-2", b"refresh-2");

        let result = config1.generate_access_token("uuid-123", "user").unwrap();
        assert!(config2.validate_access_token(&result.token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let secret = b"access-secret-for-testing";
        let encoding_key = EncodingKey::from_secret(secret);
        let now = unix_now().unwrap();

        let claims = AccessClaims {
            id: "uuid-123".to_string(),
            role: "user".to_string(),
            iat: now - 100,
            exp: now - 50,
            jti: "jti".to_string(),
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &encoding_key).unwrap();

        let result = config().validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_tokens_minted_together_differ() {
        let config = config();

        let first = config.generate_access_token("uuid-123", "user").unwrap();
        let second = config.generate_access_token("uuid-123", "user").unwrap();
        assert_ne!(first.token, second.token);

        let first = config.generate_refresh_token("uuid-123").unwrap();
        let second = config.generate_refresh_token("uuid-123").unwrap();
        assert_ne!(first.token, second.token);
    }
}
