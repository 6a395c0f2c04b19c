//! Domain entities for the database layer
//!
//! Row-shaped entity definitions shared by the repositories and the
//! channel services.

pub mod activity;
pub mod channel;
pub mod channel_group;
pub mod message;
pub mod subscriber;
pub mod user;

pub use activity::ActivityLog;
pub use channel::{Channel, ChannelAttributes, ChannelKind};
pub use channel_group::{ChannelGroup, CreateChannelGroupRequest};
pub use message::{CreateMessageRequest, Message, MessageKind};
pub use subscriber::{CreateSubscriberRequest, Subscriber};
pub use user::{CreateUserRequest, User};

use sqlx::error::BoxDynError;

/// Build the decode error sqlx expects for a column holding an unknown value.
pub(crate) fn column_decode_error(column: &str, source: impl Into<BoxDynError>) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: source.into(),
    }
}
