//! Repository for subscriber data access operations.

use crate::entities::{CreateSubscriberRequest, Subscriber};
use crate::repos::like_pattern;
use crate::types::{Page, PageRequest, StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

const SUBSCRIBER_COLUMNS: &str =
    "s.id, s.user_id, s.name, s.phone_number, s.email, s.notes, s.created_at, s.updated_at";

/// Repository for subscriber database operations
#[derive(Clone)]
pub struct SubscriberRepository {
    pool: SqlitePool,
}

impl SubscriberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new subscriber
    pub async fn create(&self, request: &CreateSubscriberRequest) -> StoreResult<Subscriber> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "INSERT INTO subscribers (user_id, name, phone_number, email, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.phone_number)
        .bind(&request.email)
        .bind(&request.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let subscriber_id = result.last_insert_rowid();
        info!(subscriber_id, user_id = request.user_id, "created new subscriber");

        self.find_for_user(request.user_id, subscriber_id)
            .await?
            .ok_or(StoreError::SubscriberNotFound)
    }

    /// Find a subscriber through its owner.
    pub async fn find_for_user(&self, user_id: i64, subscriber_id: i64) -> StoreResult<Option<Subscriber>> {
        let subscriber = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers s WHERE s.id = ? AND s.user_id = ?"
        ))
        .bind(subscriber_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscriber)
    }

    /// Every member of a channel by name.
    pub async fn all_for_channel(&self, channel_id: i64) -> StoreResult<Vec<Subscriber>> {
        let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers s
             JOIN subscriptions m ON m.subscriber_id = s.id
             WHERE m.channel_id = ?
             ORDER BY s.name COLLATE NOCASE ASC, s.id ASC"
        ))
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscribers)
    }

    /// Subscribers of a channel by name, optionally narrowed by name, phone
    /// number or e-mail.
    pub async fn list_for_channel(
        &self,
        channel_id: i64,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<Subscriber>> {
        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscribers s
             JOIN subscriptions m ON m.subscriber_id = s.id
             WHERE m.channel_id = ?1
               AND (?2 IS NULL OR s.name LIKE ?2 ESCAPE '\\' OR s.phone_number LIKE ?2 ESCAPE '\\'
                    OR s.email LIKE ?2 ESCAPE '\\')",
        )
        .bind(channel_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers s
             JOIN subscriptions m ON m.subscriber_id = s.id
             WHERE m.channel_id = ?1
               AND (?2 IS NULL OR s.name LIKE ?2 ESCAPE '\\' OR s.phone_number LIKE ?2 ESCAPE '\\'
                    OR s.email LIKE ?2 ESCAPE '\\')
             ORDER BY s.name COLLATE NOCASE ASC, s.id ASC
             LIMIT ?3 OFFSET ?4"
        ))
        .bind(channel_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(subscribers, page.page, page.per_page, total.max(0) as u64))
    }

    /// The user's subscribers that are not members of the channel.
    pub async fn list_not_in_channel(
        &self,
        user_id: i64,
        channel_id: i64,
        page: PageRequest,
    ) -> StoreResult<Page<Subscriber>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscribers s
             WHERE s.user_id = ?1
               AND NOT EXISTS (SELECT 1 FROM subscriptions m
                               WHERE m.subscriber_id = s.id AND m.channel_id = ?2)",
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers s
             WHERE s.user_id = ?1
               AND NOT EXISTS (SELECT 1 FROM subscriptions m
                               WHERE m.subscriber_id = s.id AND m.channel_id = ?2)
             ORDER BY s.name COLLATE NOCASE ASC, s.id ASC
             LIMIT ?3 OFFSET ?4"
        ))
        .bind(user_id)
        .bind(channel_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(subscribers, page.page, page.per_page, total.max(0) as u64))
    }
}
