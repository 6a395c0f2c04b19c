//! Repository for message data access operations.

use crate::entities::{CreateMessageRequest, Message};
use crate::repos::like_pattern;
use crate::types::{StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

const MESSAGE_SELECT: &str = "SELECT id, channel_id, message_type, title, caption, seq_no, schedule,
        next_send_time, active, requires_response, created_at, updated_at
     FROM messages";

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new message
    pub async fn create(&self, request: &CreateMessageRequest) -> StoreResult<Message> {
        let now = chrono::Utc::now();
        let created_at = request.created_at.unwrap_or(now);

        let result = sqlx::query(
            "INSERT INTO messages (channel_id, message_type, title, caption, seq_no, schedule,
                next_send_time, active, requires_response, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(request.channel_id)
        .bind(request.kind.as_str())
        .bind(&request.title)
        .bind(&request.caption)
        .bind(request.seq_no)
        .bind(&request.schedule)
        .bind(request.next_send_time)
        .bind(request.active)
        .bind(request.requires_response)
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();

        info!(
            message_id,
            channel_id = request.channel_id,
            kind = %request.kind,
            "created new message"
        );

        self.find_by_id(message_id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    /// Find a message by id
    pub async fn find_by_id(&self, message_id: i64) -> StoreResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!("{MESSAGE_SELECT} WHERE id = ?"))
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    /// All messages of a channel, narrowed to those whose title or caption
    /// contains `search` (case-insensitive) when one is given.
    ///
    /// Rows come back in id order; display ordering is applied by the caller.
    pub async fn list_by_channel(
        &self,
        channel_id: i64,
        search: Option<&str>,
    ) -> StoreResult<Vec<Message>> {
        let pattern = like_pattern(search);

        let messages = sqlx::query_as::<_, Message>(&format!(
            "{MESSAGE_SELECT}
             WHERE channel_id = ?1
               AND (?2 IS NULL OR title LIKE ?2 ESCAPE '\\' OR caption LIKE ?2 ESCAPE '\\')
             ORDER BY id ASC"
        ))
        .bind(channel_id)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Number of messages in a channel
    pub async fn count_by_channel(&self, channel_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE channel_id = ?")
            .bind(channel_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete every message of a channel in one statement.
    pub async fn delete_all_for_channel(&self, channel_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        info!(channel_id, deleted, "deleted all channel messages");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChannelAttributes, ChannelKind, MessageKind};
    use crate::repos::test_support::{create_test_pool, insert_user};
    use crate::repos::ChannelRepository;

    async fn setup() -> (MessageRepository, i64, tempfile::TempDir) {
        let (pool, temp_dir) = create_test_pool().await;
        let owner = insert_user(&pool, "owner@example.com").await;
        let channel = ChannelRepository::new(pool.clone())
            .create(&ChannelAttributes::new(owner, "Tips", ChannelKind::OrderedMessagesChannel))
            .await
            .unwrap();
        (MessageRepository::new(pool), channel.id, temp_dir)
    }

    #[tokio::test]
    async fn test_search_matches_title_or_caption_case_insensitively() {
        let (repo, channel_id, _temp_dir) = setup().await;

        let mut titled = CreateMessageRequest::new(channel_id, MessageKind::SimpleMessage, "body");
        titled.title = Some("Weekly HELLO".into());
        repo.create(&titled).await.unwrap();
        repo.create(&CreateMessageRequest::new(channel_id, MessageKind::PollMessage, "hello there"))
            .await
            .unwrap();
        repo.create(&CreateMessageRequest::new(channel_id, MessageKind::SimpleMessage, "goodbye"))
            .await
            .unwrap();

        let all = repo.list_by_channel(channel_id, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let found = repo.list_by_channel(channel_id, Some("hello")).await.unwrap();
        assert_eq!(found.len(), 2);

        let blank = repo.list_by_channel(channel_id, Some("  ")).await.unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_all_for_channel() {
        let (repo, channel_id, _temp_dir) = setup().await;

        for caption in ["one", "two"] {
            repo.create(&CreateMessageRequest::new(channel_id, MessageKind::SimpleMessage, caption))
                .await
                .unwrap();
        }

        assert_eq!(repo.delete_all_for_channel(channel_id).await.unwrap(), 2);
        assert_eq!(repo.count_by_channel(channel_id).await.unwrap(), 0);
    }
}
