//! Repository for channel membership (subscription) operations.

use crate::types::{StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Repository for the `subscriptions` join table
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether the subscriber belongs to the channel
    pub async fn exists(&self, channel_id: i64, subscriber_id: i64) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM subscriptions WHERE channel_id = ? AND subscriber_id = ?",
        )
        .bind(channel_id)
        .bind(subscriber_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Add a subscriber to a channel.
    ///
    /// When `channel_group_id` is set, the subscriber must not belong to any
    /// other channel of that group. The group check runs inside the INSERT
    /// itself, so SQLite holds the write lock for both and a concurrent add
    /// waits on the busy timeout instead of failing a lock upgrade. The
    /// UNIQUE(channel_id, subscriber_id) constraint turns a concurrent
    /// duplicate into [`StoreError::MembershipExists`].
    pub async fn create(
        &self,
        channel_id: i64,
        subscriber_id: i64,
        channel_group_id: Option<i64>,
    ) -> StoreResult<()> {
        let inserted = sqlx::query(
            "INSERT INTO subscriptions (channel_id, subscriber_id, created_at)
             SELECT ?, ?, ?
             WHERE ? IS NULL OR NOT EXISTS (
                 SELECT 1 FROM subscriptions m
                 JOIN channels c ON c.id = m.channel_id
                 WHERE m.subscriber_id = ? AND c.channel_group_id = ? AND m.channel_id != ?
             )",
        )
        .bind(channel_id)
        .bind(subscriber_id)
        .bind(chrono::Utc::now())
        .bind(channel_group_id)
        .bind(subscriber_id)
        .bind(channel_group_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from);

        let rows = match inserted {
            Ok(result) => result.rows_affected(),
            Err(e) if e.is_unique_violation() => return Err(StoreError::MembershipExists),
            Err(e) => return Err(e),
        };

        if rows == 0 {
            let conflicting = match channel_group_id {
                Some(group_id) => {
                    self.conflicting_channel(channel_id, subscriber_id, group_id)
                        .await?
                }
                None => None,
            };
            debug!(
                channel_id,
                subscriber_id,
                ?channel_group_id,
                ?conflicting,
                "subscriber already in another channel of the group"
            );
            return Err(StoreError::GroupMembershipConflict {
                channel_id: conflicting,
            });
        }

        info!(channel_id, subscriber_id, "added subscriber to channel");
        Ok(())
    }

    /// Another channel of the group the subscriber already belongs to
    async fn conflicting_channel(
        &self,
        channel_id: i64,
        subscriber_id: i64,
        group_id: i64,
    ) -> StoreResult<Option<i64>> {
        let conflicting = sqlx::query_scalar(
            "SELECT m.channel_id FROM subscriptions m
             JOIN channels c ON c.id = m.channel_id
             WHERE m.subscriber_id = ? AND c.channel_group_id = ? AND m.channel_id != ?
             ORDER BY m.channel_id ASC
             LIMIT 1",
        )
        .bind(subscriber_id)
        .bind(group_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conflicting)
    }

    /// Remove a subscriber from a channel. Returns whether a row was deleted.
    pub async fn delete(&self, channel_id: i64, subscriber_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE channel_id = ? AND subscriber_id = ?")
            .bind(channel_id)
            .bind(subscriber_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(channel_id, subscriber_id, "removed subscriber from channel");
        }
        Ok(removed)
    }

    /// Number of subscribers in a channel
    pub async fn count_for_channel(&self, channel_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
            .bind(channel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
