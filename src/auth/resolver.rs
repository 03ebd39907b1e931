//! Role to permission-set resolution with an in-process cache.
//!
//! Roles are reference data that rarely change, so each role is loaded from
//! the database once and kept until `invalidate` is called. Anything that
//! writes roles or permissions must call `invalidate` afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::permission::is_granted;
use crate::db::Database;

/// A role with its flattened permission keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRole {
    pub name: String,
    pub permissions: HashSet<String>,
}

impl ResolvedRole {
    pub fn grants(&self, required: &str) -> bool {
        is_granted(&self.permissions, required)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error("failed to load role: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct RoleResolver {
    db: Database,
    cache: RwLock<HashMap<String, Arc<ResolvedRole>>>,
}

impl RoleResolver {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a role by name, loading it on first use.
    ///
    /// Concurrent misses may load the same role twice; the last insert wins.
    pub async fn resolve(&self, name: &str) -> Result<Arc<ResolvedRole>, ResolveError> {
        if let Some(role) = self.cached(name) {
            return Ok(role);
        }

        let loaded = self
            .db
            .roles()
            .get_with_permissions(name)
            .await?
            .ok_or_else(|| ResolveError::RoleNotFound(name.to_string()))?;

        let role = Arc::new(ResolvedRole {
            name: loaded.name,
            permissions: loaded.permissions.into_iter().collect(),
        });
        debug!(role = %name, permissions = role.permissions.len(), "Cached role");

        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), role.clone());
        Ok(role)
    }

    /// Drop every cached role.
    pub fn invalidate(&self) {
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn cached(&self, name: &str) -> Option<Arc<ResolvedRole>> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    #[cfg(test)]
    fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
