//! Repository for the administrative audit log.

use crate::entities::ActivityLog;
use crate::types::{StoreError, StoreResult};
use sqlx::SqlitePool;

/// Repository for activity log rows
#[derive(Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an entry
    pub async fn create(
        &self,
        user_id: i64,
        description: &str,
        metadata: &serde_json::Value,
    ) -> StoreResult<ActivityLog> {
        let result = sqlx::query(
            "INSERT INTO activity_logs (user_id, description, metadata, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(description)
        .bind(metadata.to_string())
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        let log = sqlx::query_as::<_, ActivityLog>(
            "SELECT id, user_id, description, metadata, created_at FROM activity_logs WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_optional(&self.pool)
        .await?;

        log.ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    /// A user's entries, newest first
    pub async fn list_for_user(&self, user_id: i64, limit: i64) -> StoreResult<Vec<ActivityLog>> {
        let logs = sqlx::query_as::<_, ActivityLog>(
            "SELECT id, user_id, description, metadata, created_at FROM activity_logs
             WHERE user_id = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
