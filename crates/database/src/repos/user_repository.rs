//! Repository for user data access operations.

use crate::entities::{CreateUserRequest, User};
use crate::types::{StoreError, StoreResult};
use sqlx::SqlitePool;
use tracing::info;

const USER_COLUMNS: &str = "id, email, display_name, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: &CreateUserRequest) -> StoreResult<User> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "INSERT INTO users (email, display_name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();
        info!(user_id, email = %request.email, "created new user");

        self.find_by_id(user_id).await?.ok_or(StoreError::UserNotFound)
    }

    /// Find a user by id
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find a user by e-mail address
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }
}
