//! Channeldesk Database Crate
//!
//! Connection management, embedded migrations, row entities and the
//! repositories the channel services are built on.

use channeldesk_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};

// Re-export repositories
pub use repos::{
    ActivityRepository, ChannelGroupRepository, ChannelRepository, MessageRepository,
    SubscriberRepository, SubscriptionRepository, UserRepository,
};

// Re-export entities
pub use entities::{
    activity::ActivityLog,
    channel::{Channel, ChannelAttributes, ChannelKind, UnknownChannelKind},
    channel_group::{ChannelGroup, CreateChannelGroupRequest},
    message::{CreateMessageRequest, Message, MessageKind, UnknownMessageKind},
    subscriber::{CreateSubscriberRequest, Subscriber},
    user::{CreateUserRequest, User},
};

// Re-export types
pub use types::{
    errors::{DatabaseError, StoreError},
    DatabaseResult, Page, PageRequest, StoreResult,
};

/// Connect and bring the schema up to date
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_database_creates_schema() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("init.db").display()),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_initialize_database_reports_connection_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", blocker.join("db.sqlite").display()),
            max_connections: 1,
        };

        let err = initialize_database(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
    }
}
