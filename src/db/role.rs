//! Roles, permissions and the role-permission relation.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

/// Permission keys seeded on a fresh install.
pub const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("user.create", "Create users"),
    ("user.read", "Read users"),
    ("user.delete", "Delete users"),
    ("role.assign", "Assign roles and provision accounts"),
    ("user.*", "All user permissions"),
    ("*", "All permissions"),
];

/// Default roles with the permission keys each one holds.
pub const DEFAULT_ROLES: &[(&str, &str, &[&str])] = &[
    ("user", "Regular user", &["user.read"]),
    ("moderator", "Moderator", &["user.read", "user.delete"]),
    ("admin", "Administrator", &["user.*", "role.assign"]),
    ("assistant", "Assistant", &["user.read"]),
    ("superadmin", "Super administrator", &["*"]),
];

#[derive(Debug, Clone, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A role together with the keys of every permission it holds.
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

#[derive(Clone)]
pub struct RoleStore {
    pool: SqlitePool,
}

impl RoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, description FROM roles WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, name, description)| Role {
            id,
            name,
            description,
        }))
    }

    /// Load a role and its permission keys.
    pub async fn get_with_permissions(
        &self,
        name: &str,
    ) -> Result<Option<RoleWithPermissions>, sqlx::Error> {
        let Some(role) = self.get_by_name(name).await? else {
            return Ok(None);
        };

        let keys: Vec<(String,)> = sqlx::query_as(
            "SELECT p.key FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.id
             WHERE rp.role_id = ?
             ORDER BY p.key",
        )
        .bind(role.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RoleWithPermissions {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions: keys.into_iter().map(|k| k.0).collect(),
        }))
    }

    pub async fn list(&self) -> Result<Vec<Role>, sqlx::Error> {
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, name, description FROM roles ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, description)| Role {
                id,
                name,
                description,
            })
            .collect())
    }

    /// Create or update a role and set its permissions to exactly `keys`.
    /// Keys that do not name an existing permission are ignored.
    ///
    /// Callers holding a `RoleResolver` must invalidate it afterwards.
    pub async fn upsert(
        &self,
        name: &str,
        description: &str,
        keys: &[&str],
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let (role_id,): (i64,) = sqlx::query_as(
            "INSERT INTO roles (name, description) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET description = excluded.description
             RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for key in keys {
            sqlx::query(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
                 SELECT ?, id FROM permissions WHERE key = ?",
            )
            .bind(role_id)
            .bind(key)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(role_id)
    }
}

#[derive(Clone)]
pub struct PermissionStore {
    pool: SqlitePool,
}

impl PermissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a permission or update its description.
    pub async fn upsert(&self, key: &str, description: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO permissions (key, description) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET description = excluded.description",
        )
        .bind(key)
        .bind(description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All permission keys, sorted.
    pub async fn list_keys(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM permissions ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
