//! Channel service for channel lifecycle operations.
//!
//! Every lookup goes through the acting user's own channels; a channel that
//! exists but belongs to someone else is reported exactly like a missing one.

use channeldesk_database::{
    Channel, ChannelAttributes, ChannelGroup, ChannelGroupRepository, ChannelRepository,
    CreateChannelGroupRequest, PageRequest,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::services::channel_factory::{ChannelFactory, GroupAssignment};
use crate::services::ActivityService;
use crate::types::{ChannelError, ChannelForm, ChannelIndex, ChannelIndexQuery, ChannelResult};
use crate::utils::ValidationErrors;

/// Rows per page on the channel index.
pub const CHANNELS_PER_PAGE: u32 = 10;
pub const CHANNEL_GROUPS_PER_PAGE: u32 = 10;

enum ResolvedGroup {
    Unchanged,
    Ungrouped,
    Group(ChannelGroup),
}

impl ResolvedGroup {
    fn assignment(&self) -> GroupAssignment<'_> {
        match self {
            ResolvedGroup::Unchanged => GroupAssignment::Unchanged,
            ResolvedGroup::Ungrouped => GroupAssignment::Ungrouped,
            ResolvedGroup::Group(group) => GroupAssignment::Group(group),
        }
    }
}

/// Service for managing channels
#[derive(Clone)]
pub struct ChannelService {
    channel_repository: ChannelRepository,
    channel_group_repository: ChannelGroupRepository,
    activity: ActivityService,
}

impl ChannelService {
    /// Create a new channel service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            channel_repository: ChannelRepository::new(pool.clone()),
            channel_group_repository: ChannelGroupRepository::new(pool.clone()),
            activity: ActivityService::new(pool),
        }
    }

    /// A channel of the user, or `None`.
    pub async fn find_owned(&self, user_id: i64, channel_id: i64) -> ChannelResult<Option<Channel>> {
        Ok(self
            .channel_repository
            .find_for_user(user_id, channel_id)
            .await?)
    }

    /// A channel group of the user, or `None`.
    pub async fn find_owned_group(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> ChannelResult<Option<ChannelGroup>> {
        Ok(self
            .channel_group_repository
            .find_for_user(user_id, group_id)
            .await?)
    }

    /// The user's channels and channel groups, each searched and paged on its own.
    pub async fn index(&self, user_id: i64, query: &ChannelIndexQuery) -> ChannelResult<ChannelIndex> {
        let channels = self
            .channel_repository
            .list_for_user(
                user_id,
                query.channel_search.as_deref(),
                PageRequest::new(query.channels_page, CHANNELS_PER_PAGE),
            )
            .await?;
        let channel_groups = self
            .channel_group_repository
            .list_for_user(
                user_id,
                query.channel_group_search.as_deref(),
                PageRequest::new(query.channel_groups_page, CHANNEL_GROUPS_PER_PAGE),
            )
            .await?;

        Ok(ChannelIndex {
            channels,
            channel_groups,
        })
    }

    /// Build, validate and insert a channel.
    pub async fn create(&self, actor_id: i64, form: &ChannelForm) -> ChannelResult<Channel> {
        let group = self
            .resolve_group(actor_id, form.channel_group_id.as_deref())
            .await?;
        let attrs = ChannelFactory::build(form, None, actor_id, group.assignment())?;
        self.ensure_keyword_available(&attrs, None).await?;

        let channel = self.channel_repository.create(&attrs).await?;
        self.activity
            .record_channel(actor_id, "Created channel", &channel)
            .await?;
        Ok(channel)
    }

    /// Apply a form to one of the actor's channels.
    pub async fn update(
        &self,
        actor_id: i64,
        channel_id: i64,
        form: &ChannelForm,
    ) -> ChannelResult<Channel> {
        let prior = self
            .find_owned(actor_id, channel_id)
            .await?
            .ok_or(ChannelError::AccessDenied)?;

        let group = self
            .resolve_group(actor_id, form.channel_group_id.as_deref())
            .await?;
        let attrs = ChannelFactory::build(form, Some(&prior), actor_id, group.assignment())?;
        self.ensure_keyword_available(&attrs, Some(prior.id)).await?;

        let channel = self.channel_repository.update(prior.id, &attrs).await?;
        if channel.kind != prior.kind {
            info!(
                channel_id = channel.id,
                from = %prior.kind,
                to = %channel.kind,
                "channel type changed"
            );
        }
        self.activity
            .record_channel(actor_id, "Changed channel", &channel)
            .await?;
        Ok(channel)
    }

    /// Record and delete a channel; its messages and memberships go with it.
    pub async fn destroy(&self, actor_id: i64, channel: &Channel) -> ChannelResult<()> {
        self.activity
            .record_channel(actor_id, "Destroyed channel", channel)
            .await?;
        self.channel_repository.delete(channel.id).await?;
        Ok(())
    }

    /// Every channel of every user.
    pub async fn list_all(&self) -> ChannelResult<Vec<Channel>> {
        Ok(self.channel_repository.list_all().await?)
    }

    /// Delete every channel of every user.
    pub async fn delete_all(&self) -> ChannelResult<u64> {
        Ok(self.channel_repository.delete_all().await?)
    }

    /// All of the user's channel groups, for the channel form.
    pub async fn groups_for(&self, user_id: i64) -> ChannelResult<Vec<ChannelGroup>> {
        Ok(self.channel_group_repository.all_for_user(user_id).await?)
    }

    pub async fn create_group(&self, request: &CreateChannelGroupRequest) -> ChannelResult<ChannelGroup> {
        Ok(self.channel_group_repository.create(request).await?)
    }

    /// Map the raw `channel_group_id` field to a group the actor owns.
    async fn resolve_group(&self, actor_id: i64, raw: Option<&str>) -> ChannelResult<ResolvedGroup> {
        let Some(raw) = raw else {
            return Ok(ResolvedGroup::Unchanged);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ResolvedGroup::Ungrouped);
        }

        let group_id = raw.parse::<i64>().map_err(|_| ChannelError::AccessDenied)?;
        let group = self
            .find_owned_group(actor_id, group_id)
            .await?
            .ok_or_else(|| {
                debug!(actor_id, group_id, "channel group not owned by actor");
                ChannelError::AccessDenied
            })?;
        Ok(ResolvedGroup::Group(group))
    }

    async fn ensure_keyword_available(
        &self,
        attrs: &ChannelAttributes,
        exclude_id: Option<i64>,
    ) -> ChannelResult<()> {
        let Some(keyword) = attrs.keyword.as_deref() else {
            return Ok(());
        };

        let conflict = self
            .channel_repository
            .find_keyword_conflict(
                attrs.user_id,
                keyword,
                attrs.tparty_keyword.as_deref(),
                exclude_id,
            )
            .await?;

        if conflict.is_some() {
            let mut errors = ValidationErrors::new();
            errors.add("keyword", "has already been taken");
            return Err(errors.into());
        }
        Ok(())
    }
}
