//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Channel-store specific errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Channel group not found")]
    ChannelGroupNotFound,

    #[error("Subscriber not found")]
    SubscriberNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Subscriber is already a member of this channel")]
    MembershipExists,

    #[error("Subscriber already belongs to another channel in the same group")]
    GroupMembershipConflict { channel_id: Option<i64> },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the error means the row was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ChannelNotFound
                | StoreError::ChannelGroupNotFound
                | StoreError::SubscriberNotFound
                | StoreError::UserNotFound
                | StoreError::Database(sqlx::Error::RowNotFound)
        )
    }

    /// Whether the error came from a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
