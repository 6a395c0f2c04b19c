//! Repository for channel data access operations.

use crate::entities::{Channel, ChannelAttributes};
use crate::repos::like_pattern;
use crate::types::{Page, PageRequest, StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

const CHANNEL_SELECT: &str = "SELECT id, user_id, channel_group_id, name, description, channel_type,
        keyword, tparty_keyword, one_word, suffix, moderator_emails, schedule,
        relative_schedule, real_time_update, send_only_once, active,
        allow_mo_subscription, mo_subscription_deadline, created_at, updated_at
     FROM channels";

/// Repository for channel database operations
#[derive(Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a channel through its owner; `None` when missing or owned by someone else.
    pub async fn find_for_user(&self, user_id: i64, channel_id: i64) -> StoreResult<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(&format!(
            "{CHANNEL_SELECT} WHERE id = ? AND user_id = ?"
        ))
        .bind(channel_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(channel)
    }

    /// List a user's channels by name, optionally filtered by a search term.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<Channel>> {
        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM channels
             WHERE user_id = ?1
               AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\'
                    OR keyword LIKE ?2 ESCAPE '\\')",
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let channels = sqlx::query_as::<_, Channel>(&format!(
            "{CHANNEL_SELECT}
             WHERE user_id = ?1
               AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\'
                    OR keyword LIKE ?2 ESCAPE '\\')
             ORDER BY name COLLATE NOCASE ASC, id ASC
             LIMIT ?3 OFFSET ?4"
        ))
        .bind(user_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(channels, page.page, page.per_page, total.max(0) as u64))
    }

    /// Every channel, oldest first.
    pub async fn list_all(&self) -> StoreResult<Vec<Channel>> {
        let channels =
            sqlx::query_as::<_, Channel>(&format!("{CHANNEL_SELECT} ORDER BY created_at ASC, id ASC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(channels)
    }

    /// Another channel of the user using the same keyword on the same number.
    pub async fn find_keyword_conflict(
        &self,
        user_id: i64,
        keyword: &str,
        tparty_keyword: Option<&str>,
        exclude_id: Option<i64>,
    ) -> StoreResult<Option<Channel>> {
        let channel = sqlx::query_as::<_, Channel>(&format!(
            "{CHANNEL_SELECT}
             WHERE user_id = ?1
               AND keyword = ?2 COLLATE NOCASE
               AND IFNULL(tparty_keyword, '') = IFNULL(?3, '')
               AND (?4 IS NULL OR id != ?4)
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(keyword)
        .bind(tparty_keyword)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(channel)
    }

    /// Create a new channel
    pub async fn create(&self, attrs: &ChannelAttributes) -> StoreResult<Channel> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "INSERT INTO channels (user_id, channel_group_id, name, description, channel_type,
                keyword, tparty_keyword, one_word, suffix, moderator_emails, schedule,
                relative_schedule, real_time_update, send_only_once, active,
                allow_mo_subscription, mo_subscription_deadline, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attrs.user_id)
        .bind(attrs.channel_group_id)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(attrs.kind.as_str())
        .bind(&attrs.keyword)
        .bind(&attrs.tparty_keyword)
        .bind(&attrs.one_word)
        .bind(&attrs.suffix)
        .bind(&attrs.moderator_emails)
        .bind(&attrs.schedule)
        .bind(attrs.relative_schedule)
        .bind(attrs.real_time_update)
        .bind(attrs.send_only_once)
        .bind(attrs.active)
        .bind(attrs.allow_mo_subscription)
        .bind(attrs.mo_subscription_deadline)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let channel_id = result.last_insert_rowid();

        info!(
            channel_id,
            user_id = attrs.user_id,
            kind = %attrs.kind,
            "created new channel"
        );

        self.find_for_user(attrs.user_id, channel_id)
            .await?
            .ok_or(StoreError::ChannelNotFound)
    }

    /// Overwrite a channel's attributes
    pub async fn update(&self, channel_id: i64, attrs: &ChannelAttributes) -> StoreResult<Channel> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "UPDATE channels SET channel_group_id = ?, name = ?, description = ?, channel_type = ?,
                keyword = ?, tparty_keyword = ?, one_word = ?, suffix = ?, moderator_emails = ?,
                schedule = ?, relative_schedule = ?, real_time_update = ?, send_only_once = ?,
                active = ?, allow_mo_subscription = ?, mo_subscription_deadline = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(attrs.channel_group_id)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(attrs.kind.as_str())
        .bind(&attrs.keyword)
        .bind(&attrs.tparty_keyword)
        .bind(&attrs.one_word)
        .bind(&attrs.suffix)
        .bind(&attrs.moderator_emails)
        .bind(&attrs.schedule)
        .bind(attrs.relative_schedule)
        .bind(attrs.real_time_update)
        .bind(attrs.send_only_once)
        .bind(attrs.active)
        .bind(attrs.allow_mo_subscription)
        .bind(attrs.mo_subscription_deadline)
        .bind(now)
        .bind(channel_id)
        .bind(attrs.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ChannelNotFound);
        }

        info!(channel_id, kind = %attrs.kind, "updated channel");

        self.find_for_user(attrs.user_id, channel_id)
            .await?
            .ok_or(StoreError::ChannelNotFound)
    }

    /// Delete a channel; messages and memberships cascade.
    pub async fn delete(&self, channel_id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ChannelNotFound);
        }

        info!(channel_id, "deleted channel");
        Ok(())
    }

    /// Remove every row. Used by the maintenance CLI.
    pub async fn delete_all(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM channels").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
