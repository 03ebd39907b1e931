use std::collections::HashMap;

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::one_time::{self, OneTimeKind};
use super::photo::{self, NewPhoto};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Inactive,
    Active,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Inactive => "inactive",
            UserStatus::Active => "active",
        }
    }

    /// Unknown values read as `Inactive`.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "active" => UserStatus::Active,
            _ => UserStatus::Inactive,
        }
    }
}

/// A user joined with the name of its role.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub status: UserStatus,
    pub role_id: i64,
    pub role: String,
    pub phone: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    email: String,
    username: Option<String>,
    password_hash: Option<String>,
    status: String,
    role_id: i64,
    role: String,
    phone: Option<String>,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            status: UserStatus::parse_lossy(&row.status),
            role_id: row.role_id,
            role: row.role,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

/// Public user representation. Never carries the password hash or internal IDs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: Option<String>,
    pub email: String,
    pub role: String,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub photos: Vec<String>,
    pub created_at: String,
}

impl UserView {
    fn from_user(user: User, photos: Vec<String>) -> Self {
        Self {
            id: user.uuid,
            username: user.username,
            email: user.email,
            role: user.role,
            status: user.status,
            phone: user.phone,
            photos,
            created_at: user.created_at,
        }
    }
}

/// Profile data written when an account is activated.
#[derive(Debug, Clone)]
pub struct ActivationUpdate {
    pub username: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub photos: Vec<NewPhoto>,
}

/// Result of consuming an activation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The account is active; carries the user's internal ID.
    Activated(i64),
    /// No unexpired token matched.
    InvalidToken,
    /// Another account already uses the requested username.
    UsernameTaken,
}

const SELECT_USER: &str = "SELECT u.id, u.uuid, u.email, u.username, u.password_hash, u.status,
     u.role_id, r.name AS role, u.phone, u.created_at
     FROM users u JOIN roles r ON r.id = u.role_id";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an inactive user without credentials. Returns the user ID.
    pub async fn create_pending(
        &self,
        uuid: &str,
        email: &str,
        role_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (uuid, email, role_id, status) VALUES (?, ?, ?, 'inactive')")
                .bind(uuid)
                .bind(email)
                .bind(role_id)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Create an inactive user together with its activation token.
    /// Both rows are committed or neither is.
    pub async fn create_pending_with_activation(
        &self,
        uuid: &str,
        email: &str,
        role_id: i64,
        token: &str,
        expires_at: i64,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("INSERT INTO users (uuid, email, role_id, status) VALUES (?, ?, ?, 'inactive')")
                .bind(uuid)
                .bind(email)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        let user_id = result.last_insert_rowid();

        one_time::replace_in(&mut tx, OneTimeKind::Activation, user_id, token, expires_at).await?;

        tx.commit().await?;
        Ok(user_id)
    }

    /// Create an already active user with credentials (used for bootstrapping).
    pub async fn create_active(
        &self,
        uuid: &str,
        email: &str,
        username: &str,
        password_hash: &str,
        role_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (uuid, email, username, password_hash, role_id, status)
             VALUES (?, ?, ?, ?, ?, 'active')",
        )
        .bind(uuid)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(role_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!("{} WHERE u.email = ?", SELECT_USER)))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by internal ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!("{} WHERE u.id = ?", SELECT_USER)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(sqlx::AssertSqlSafe(format!("{} WHERE u.uuid = ?", SELECT_USER)))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// Consume an activation token and activate its user in one transaction.
    ///
    /// The token is deleted first, so a concurrent second attempt with the same
    /// token finds nothing. Any failure rolls the whole activation back.
    pub async fn activate_with_token(
        &self,
        token: &str,
        now: i64,
        update: &ActivationUpdate,
    ) -> Result<ActivationOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(user_id) = one_time::consume_in(&mut tx, OneTimeKind::Activation, token, now).await?
        else {
            return Ok(ActivationOutcome::InvalidToken);
        };

        // The UNIQUE(username) constraint decides conflicts, so two
        // activations racing for one name cannot both succeed.
        let updated = sqlx::query(
            "UPDATE users SET username = ?, password_hash = ?, phone = ?, status = 'active'
             WHERE id = ?",
        )
        .bind(&update.username)
        .bind(&update.password_hash)
        .bind(&update.phone)
        .bind(user_id)
        .execute(&mut *tx)
        .await;
        match updated {
            Ok(_) => {}
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                // Dropping the transaction restores the token.
                return Ok(ActivationOutcome::UsernameTaken);
            }
            Err(e) => return Err(e),
        }

        for new_photo in &update.photos {
            photo::insert_in(&mut tx, Some(user_id), new_photo).await?;
        }

        tx.commit().await?;
        Ok(ActivationOutcome::Activated(user_id))
    }

    /// Consume a password reset token and store the new hash in one transaction.
    /// Returns false if no unexpired token matched.
    pub async fn reset_password_with_token(
        &self,
        token: &str,
        now: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(user_id) =
            one_time::consume_in(&mut tx, OneTimeKind::PasswordReset, token, now).await?
        else {
            return Ok(false);
        };

        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Set the role for a user.
    pub async fn set_role(&self, uuid: &str, role_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET role_id = ? WHERE uuid = ?")
            .bind(role_id)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by UUID.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users as public views, oldest first.
    pub async fn list_views(&self) -> Result<Vec<UserView>, sqlx::Error> {
        let rows: Vec<UserRow> =
            sqlx::query_as(sqlx::AssertSqlSafe(format!("{} ORDER BY u.created_at, u.id", SELECT_USER)))
                .fetch_all(&self.pool)
                .await?;

        let photo_rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT owner_id, uuid FROM photos WHERE owner_id IS NOT NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut photos: HashMap<i64, Vec<String>> = HashMap::new();
        for (owner_id, uuid) in photo_rows {
            photos.entry(owner_id).or_default().push(uuid);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let user = User::from(row);
                let owned = photos.remove(&user.id).unwrap_or_default();
                UserView::from_user(user, owned)
            })
            .collect())
    }

    /// Get a single user as a public view.
    pub async fn get_view(&self, uuid: &str) -> Result<Option<UserView>, sqlx::Error> {
        let Some(user) = self.get_by_uuid(uuid).await? else {
            return Ok(None);
        };

        let photos: Vec<(String,)> =
            sqlx::query_as("SELECT uuid FROM photos WHERE owner_id = ? ORDER BY id")
                .bind(user.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(UserView::from_user(
            user,
            photos.into_iter().map(|p| p.0).collect(),
        )))
    }
}
