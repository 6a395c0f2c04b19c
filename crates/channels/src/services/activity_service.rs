//! Activity service for the administrative audit trail.

use channeldesk_database::{ActivityLog, ActivityRepository, Channel};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::types::ChannelResult;

/// Service for recording administrative actions
#[derive(Clone)]
pub struct ActivityService {
    activity_repository: ActivityRepository,
}

impl ActivityService {
    /// Create a new activity service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            activity_repository: ActivityRepository::new(pool),
        }
    }

    /// Persist an entry and emit it as a trace event.
    pub async fn record(
        &self,
        user_id: i64,
        description: &str,
        metadata: serde_json::Value,
    ) -> ChannelResult<ActivityLog> {
        let log = self
            .activity_repository
            .create(user_id, description, &metadata)
            .await?;
        info!(user_id, activity_id = log.id, %metadata, "{}", description);
        Ok(log)
    }

    /// Record `"{verb} {id}-{name}"` against a channel.
    pub async fn record_channel(
        &self,
        user_id: i64,
        verb: &str,
        channel: &Channel,
    ) -> ChannelResult<ActivityLog> {
        let description = format!("{} {}-{}", verb, channel.id, channel.name);
        self.record(user_id, &description, json!({ "channel_id": channel.id }))
            .await
    }

    /// A user's most recent entries
    pub async fn recent(&self, user_id: i64, limit: i64) -> ChannelResult<Vec<ActivityLog>> {
        Ok(self.activity_repository.list_for_user(user_id, limit).await?)
    }
}
