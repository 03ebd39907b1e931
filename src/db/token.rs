//! Refresh token storage.
//!
//! Access tokens are stateless and never stored. Each user holds at most one
//! refresh token; issuing a new one overwrites the previous record.

use sqlx::sqlite::SqlitePool;

/// A persisted refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    /// Unix seconds
    pub expires_at: i64,
    pub created_at: String,
}

/// Store for managing refresh tokens.
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the user's refresh token, replacing any existing one.
    pub async fn upsert(
        &self,
        user_id: i64,
        token: &str,
        expires_at: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                token = excluded.token,
                expires_at = excluded.expires_at,
                created_at = datetime('now')",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a refresh token by its exact string.
    pub async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
        let row: Option<(i64, String, i64, i64, String)> = sqlx::query_as(
            "SELECT id, token, user_id, expires_at, created_at FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, token, user_id, expires_at, created_at)| RefreshTokenRecord {
                id,
                token,
                user_id,
                expires_at,
                created_at,
            },
        ))
    }

    /// Delete a refresh token. Returns whether a record was removed.
    pub async fn delete(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count refresh tokens held by a user (0 or 1).
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Delete all tokens whose expiry is before `now` (Unix seconds).
    pub async fn delete_expired(&self, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
