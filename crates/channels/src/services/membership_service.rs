//! Membership service for channel subscribers.
//!
//! Adding and removing never fail for business reasons: every ordinary
//! outcome, including a rejected add, is a [`MembershipOutcome`] with its
//! own notice. Errors are reserved for storage failures.

use channeldesk_database::{
    Channel, Page, PageRequest, StoreError, Subscriber, SubscriberRepository,
    SubscriptionRepository,
};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::services::ActivityService;
use crate::types::{ChannelResult, SubscriberListing};

/// Rows per page in the subscriber lists.
pub const SUBSCRIBERS_PER_PAGE: u32 = 10;

/// Result of an add or remove request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MembershipOutcome {
    Added,
    AlreadyMember,
    RejectedByGroupConstraint,
    Removed,
    NotMember,
}

impl MembershipOutcome {
    /// The flash text shown after the request.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Added => "Subscriber added to channel.",
            Self::AlreadyMember => {
                "Subscriber is already a member of this channel. No changes made."
            }
            Self::RejectedByGroupConstraint => {
                "Subscriber is already a member of a channel in the channel group. Cannot add."
            }
            Self::Removed => "Subscriber removed from channel.",
            Self::NotMember => {
                "Subscriber not currently subscribed to this channel. No changes done."
            }
        }
    }

    /// Rejections are flashed as alerts, everything else as notices.
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::RejectedByGroupConstraint)
    }

    pub fn changed(&self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Service for managing channel membership
#[derive(Clone)]
pub struct MembershipService {
    subscription_repository: SubscriptionRepository,
    subscriber_repository: SubscriberRepository,
    activity: ActivityService,
}

impl MembershipService {
    /// Create a new membership service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            subscription_repository: SubscriptionRepository::new(pool.clone()),
            subscriber_repository: SubscriberRepository::new(pool.clone()),
            activity: ActivityService::new(pool),
        }
    }

    /// Look a subscriber up through its owner.
    pub async fn find_subscriber(
        &self,
        user_id: i64,
        subscriber_id: i64,
    ) -> ChannelResult<Option<Subscriber>> {
        Ok(self
            .subscriber_repository
            .find_for_user(user_id, subscriber_id)
            .await?)
    }

    /// Make the subscriber a member of the channel.
    pub async fn add(
        &self,
        actor_id: i64,
        channel: &Channel,
        subscriber: &Subscriber,
    ) -> ChannelResult<MembershipOutcome> {
        if self
            .subscription_repository
            .exists(channel.id, subscriber.id)
            .await?
        {
            return Ok(MembershipOutcome::AlreadyMember);
        }

        let created = self
            .subscription_repository
            .create(channel.id, subscriber.id, channel.channel_group_id)
            .await;

        match created {
            Ok(()) => {}
            Err(StoreError::MembershipExists) => return Ok(MembershipOutcome::AlreadyMember),
            Err(StoreError::GroupMembershipConflict { channel_id }) => {
                info!(
                    channel_id = channel.id,
                    subscriber_id = subscriber.id,
                    conflicting_channel_id = ?channel_id,
                    "membership rejected by channel group"
                );
                return Ok(MembershipOutcome::RejectedByGroupConstraint);
            }
            Err(e) => return Err(e.into()),
        }

        let description = format!(
            "Added subscriber {}-{} to {}-{}",
            subscriber.id, subscriber.name, channel.id, channel.name
        );
        self.activity
            .record(
                actor_id,
                &description,
                json!({ "subscriber_id": subscriber.id, "channel_id": channel.id }),
            )
            .await?;

        Ok(MembershipOutcome::Added)
    }

    /// Take the subscriber out of the channel.
    pub async fn remove(
        &self,
        actor_id: i64,
        channel: &Channel,
        subscriber: &Subscriber,
    ) -> ChannelResult<MembershipOutcome> {
        let removed = self
            .subscription_repository
            .delete(channel.id, subscriber.id)
            .await?;

        if !removed {
            return Ok(MembershipOutcome::NotMember);
        }

        let description = format!(
            "Removed subscriber {}-{} from {}-{}",
            subscriber.id, subscriber.name, channel.id, channel.name
        );
        self.activity
            .record(
                actor_id,
                &description,
                json!({ "subscriber_id": subscriber.id, "channel_id": channel.id }),
            )
            .await?;

        Ok(MembershipOutcome::Removed)
    }

    /// The channel's members and the owner's other subscribers, one page each.
    pub async fn list_subscribers(
        &self,
        channel: &Channel,
        user_id: i64,
        subscribed_page: Option<i64>,
        unsubscribed_page: Option<i64>,
    ) -> ChannelResult<SubscriberListing> {
        let subscribed = self
            .subscriber_repository
            .list_for_channel(
                channel.id,
                None,
                PageRequest::new(subscribed_page, SUBSCRIBERS_PER_PAGE),
            )
            .await?;
        let unsubscribed = self
            .subscriber_repository
            .list_not_in_channel(
                user_id,
                channel.id,
                PageRequest::new(unsubscribed_page, SUBSCRIBERS_PER_PAGE),
            )
            .await?;

        Ok(SubscriberListing {
            subscribed,
            unsubscribed,
        })
    }

    /// Members of the channel matching `search` by name, phone or e-mail.
    pub async fn channel_subscribers(
        &self,
        channel: &Channel,
        search: Option<&str>,
        page: Option<i64>,
    ) -> ChannelResult<Page<Subscriber>> {
        Ok(self
            .subscriber_repository
            .list_for_channel(
                channel.id,
                search,
                PageRequest::new(page, SUBSCRIBERS_PER_PAGE),
            )
            .await?)
    }

    /// Every member of the channel.
    pub async fn members(&self, channel: &Channel) -> ChannelResult<Vec<Subscriber>> {
        Ok(self
            .subscriber_repository
            .all_for_channel(channel.id)
            .await?)
    }

    pub async fn subscriber_count(&self, channel: &Channel) -> ChannelResult<i64> {
        Ok(self
            .subscription_repository
            .count_for_channel(channel.id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_notices() {
        assert_eq!(MembershipOutcome::Added.notice(), "Subscriber added to channel.");
        assert_eq!(
            MembershipOutcome::NotMember.notice(),
            "Subscriber not currently subscribed to this channel. No changes done."
        );
        assert!(MembershipOutcome::RejectedByGroupConstraint.is_alert());
        assert!(!MembershipOutcome::AlreadyMember.is_alert());
        assert!(!MembershipOutcome::AlreadyMember.changed());
        assert!(MembershipOutcome::Removed.changed());
    }
}
