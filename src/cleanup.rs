//! Scheduled removal of expired tokens.

use crate::db::Database;
use crate::jwt::unix_now;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let now = match unix_now() {
        Ok(now) => now as i64,
        Err(e) => {
            error!("Skipping cleanup: {}", e);
            return;
        }
    };

    match db.refresh_tokens().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired refresh tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up refresh tokens: {}", e),
    }

    match db.activation_tokens().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired activation tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up activation tokens: {}", e),
    }

    match db.reset_tokens().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired password reset tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up password reset tokens: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let db = Database::open(":memory:").await.unwrap();
        db.seed_defaults().await.unwrap();
        let role = db.roles().get_by_name("user").await.unwrap().unwrap();
        let a = db.users().create_pending("uuid-a", "a@x.com", role.id).await.unwrap();
        let b = db.users().create_pending("uuid-b", "b@x.com", role.id).await.unwrap();

        db.refresh_tokens().upsert(a, "old-refresh", 1).await.unwrap();
        db.refresh_tokens().upsert(b, "live-refresh", i64::MAX).await.unwrap();
        db.activation_tokens().replace_for_user(a, "old-act", 1).await.unwrap();
        db.reset_tokens().replace_for_user(b, "live-reset", i64::MAX).await.unwrap();

        run_cleanup(&db).await;

        assert!(db.refresh_tokens().find("old-refresh").await.unwrap().is_none());
        assert!(db.refresh_tokens().find("live-refresh").await.unwrap().is_some());
        assert!(db.activation_tokens().find("old-act").await.unwrap().is_none());
        assert!(db.reset_tokens().find("live-reset").await.unwrap().is_some());
    }
}
