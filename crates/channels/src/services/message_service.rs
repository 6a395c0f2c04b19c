//! Message service for listing and bulk maintenance of channel messages.

use channeldesk_database::{Channel, CreateMessageRequest, Message, MessageRepository};
use sqlx::SqlitePool;
use tracing::debug;

use crate::query::{build_listing, sort_primary, ListingMode, MessageListing};
use crate::services::ActivityService;
use crate::types::{ChannelResult, MessageQuery};
use crate::utils::ChannelPolicy;

/// Service for managing message operations
#[derive(Clone)]
pub struct MessageService {
    message_repository: MessageRepository,
    activity: ActivityService,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            message_repository: MessageRepository::new(pool.clone()),
            activity: ActivityService::new(pool),
        }
    }

    /// Searched, counted, filtered, ordered and paged messages of a channel.
    pub async fn listing(
        &self,
        channel: &Channel,
        query: &MessageQuery,
        mode: ListingMode,
    ) -> ChannelResult<MessageListing> {
        let searched = self
            .message_repository
            .list_by_channel(channel.id, query.message_search.as_deref())
            .await?;

        debug!(
            channel_id = channel.id,
            matched = searched.len(),
            message_type = ?query.message_type,
            "building message listing"
        );

        Ok(build_listing(
            &ChannelPolicy::for_channel(channel),
            searched,
            query,
            mode,
        ))
    }

    /// Every message of the channel in its primary order.
    pub async fn in_channel_order(&self, channel: &Channel) -> ChannelResult<Vec<Message>> {
        let mut messages = self
            .message_repository
            .list_by_channel(channel.id, None)
            .await?;
        sort_primary(&mut messages, ChannelPolicy::for_channel(channel).message_order());
        Ok(messages)
    }

    /// Add a message to a channel.
    pub async fn create(&self, request: &CreateMessageRequest) -> ChannelResult<Message> {
        Ok(self.message_repository.create(request).await?)
    }

    /// Delete every message of the channel and record it.
    pub async fn delete_all(&self, actor_id: i64, channel: &Channel) -> ChannelResult<u64> {
        let deleted = self
            .message_repository
            .delete_all_for_channel(channel.id)
            .await?;
        self.activity
            .record_channel(actor_id, "Deleted all messages in", channel)
            .await?;
        Ok(deleted)
    }
}
