//! Repository for channel group data access operations.

use crate::entities::{ChannelGroup, CreateChannelGroupRequest};
use crate::repos::like_pattern;
use crate::types::{Page, PageRequest, StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

const GROUP_SELECT: &str = "SELECT id, user_id, name, description, keyword, tparty_keyword,
        created_at, updated_at
     FROM channel_groups";

/// Repository for channel group database operations
#[derive(Clone)]
pub struct ChannelGroupRepository {
    pool: SqlitePool,
}

impl ChannelGroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new channel group
    pub async fn create(&self, request: &CreateChannelGroupRequest) -> StoreResult<ChannelGroup> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "INSERT INTO channel_groups (user_id, name, description, keyword, tparty_keyword, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.keyword)
        .bind(&request.tparty_keyword)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let group_id = result.last_insert_rowid();
        info!(group_id, user_id = request.user_id, "created new channel group");

        self.find_for_user(request.user_id, group_id)
            .await?
            .ok_or(StoreError::ChannelGroupNotFound)
    }

    /// Find a group through its owner.
    pub async fn find_for_user(&self, user_id: i64, group_id: i64) -> StoreResult<Option<ChannelGroup>> {
        let group = sqlx::query_as::<_, ChannelGroup>(&format!(
            "{GROUP_SELECT} WHERE id = ? AND user_id = ?"
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    /// Every group of a user by name, for group pickers.
    pub async fn all_for_user(&self, user_id: i64) -> StoreResult<Vec<ChannelGroup>> {
        let groups = sqlx::query_as::<_, ChannelGroup>(&format!(
            "{GROUP_SELECT} WHERE user_id = ? ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// List a user's groups by name, optionally filtered by a search term.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        search: Option<&str>,
        page: PageRequest,
    ) -> StoreResult<Page<ChannelGroup>> {
        let pattern = like_pattern(search);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM channel_groups
             WHERE user_id = ?1
               AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\')",
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let groups = sqlx::query_as::<_, ChannelGroup>(&format!(
            "{GROUP_SELECT}
             WHERE user_id = ?1
               AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\')
             ORDER BY name COLLATE NOCASE ASC, id ASC
             LIMIT ?3 OFFSET ?4"
        ))
        .bind(user_id)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(groups, page.page, page.per_page, total.max(0) as u64))
    }
}
