//! Single-use tokens for account activation and password reset.
//!
//! Both kinds share one shape: a unique opaque token, a unique owning user and
//! an expiry in Unix seconds. A token is consumed by deleting it.

use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimeKind {
    Activation,
    PasswordReset,
}

impl OneTimeKind {
    fn table(&self) -> &'static str {
        match self {
            OneTimeKind::Activation => "activation_tokens",
            OneTimeKind::PasswordReset => "password_reset_tokens",
        }
    }
}

/// A stored one-time token.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub token: String,
    pub user_id: i64,
    pub expires_at: i64,
}

pub struct OneTimeTokenStore {
    pool: SqlitePool,
    kind: OneTimeKind,
}

impl OneTimeTokenStore {
    pub fn new(pool: SqlitePool, kind: OneTimeKind) -> Self {
        Self { pool, kind }
    }

    /// Store a token for the user, replacing any previous one.
    pub async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: i64,
    ) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        replace_in(&mut conn, self.kind, user_id, token, expires_at).await
    }

    pub async fn find(&self, token: &str) -> Result<Option<OneTimeToken>, sqlx::Error> {
        let row: Option<(String, i64, i64)> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
            "SELECT token, user_id, expires_at FROM {} WHERE token = ?",
            self.kind.table()
        )))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(token, user_id, expires_at)| OneTimeToken {
            token,
            user_id,
            expires_at,
        }))
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(sqlx::AssertSqlSafe(format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ?",
            self.kind.table()
        )))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Delete all tokens whose expiry is before `now`.
    pub async fn delete_expired(&self, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(sqlx::AssertSqlSafe(format!(
            "DELETE FROM {} WHERE expires_at < ?",
            self.kind.table()
        )))
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

pub(super) async fn replace_in(
    conn: &mut SqliteConnection,
    kind: OneTimeKind,
    user_id: i64,
    token: &str,
    expires_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(sqlx::AssertSqlSafe(format!(
        "INSERT INTO {} (token, user_id, expires_at) VALUES (?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
            token = excluded.token,
            expires_at = excluded.expires_at,
            created_at = datetime('now')",
        kind.table()
    )))
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete an unexpired token and return its owner. `None` if the token is
/// unknown or expired.
pub(super) async fn consume_in(
    conn: &mut SqliteConnection,
    kind: OneTimeKind,
    token: &str,
    now: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(sqlx::AssertSqlSafe(format!(
        "DELETE FROM {} WHERE token = ? AND expires_at >= ? RETURNING user_id",
        kind.table()
    )))
    .bind(token)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|r| r.0))
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        db.seed_defaults().await.unwrap();
        let role = db.roles().get_by_name("user").await.unwrap().unwrap();
        let id = db
            .users()
            .create_pending("uuid-1", "a@x.com", role.id)
            .await
            .unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_replace_keeps_single_token() {
        let (db, user_id) = setup().await;
        let store = db.reset_tokens();

        store.replace_for_user(user_id, "one", 100).await.unwrap();
        store.replace_for_user(user_id, "two", 200).await.unwrap();

        assert_eq!(store.count_for_user(user_id).await.unwrap(), 1);
        assert!(store.find("one").await.unwrap().is_none());
        assert_eq!(store.find("two").await.unwrap().unwrap().expires_at, 200);
    }

    #[tokio::test]
    async fn test_kinds_are_separate() {
        let (db, user_id) = setup().await;

        db.activation_tokens()
            .replace_for_user(user_id, "shared", 100)
            .await
            .unwrap();

        assert!(db.reset_tokens().find("shared").await.unwrap().is_none());
        assert!(db.activation_tokens().find("shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (db, user_id) = setup().await;
        let store = db.activation_tokens();

        store.replace_for_user(user_id, "tok", 100).await.unwrap();
        assert_eq!(store.delete_expired(100).await.unwrap(), 0);
        assert_eq!(store.delete_expired(101).await.unwrap(), 1);
    }
}
