//! Per-kind channel behaviour.

use channeldesk_database::{Channel, ChannelKind};
use serde::Serialize;

/// How a channel's messages are put in their primary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrder {
    /// `seq_no` ascending, messages without one last.
    SeqNoAscending,
    CreatedAscending,
    CreatedDescending,
}

/// Behaviour flags derived from a channel's kind and its `relative_schedule` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    kind: ChannelKind,
    relative_schedule: bool,
}

impl ChannelPolicy {
    pub fn new(kind: ChannelKind, relative_schedule: bool) -> Self {
        Self {
            kind,
            relative_schedule,
        }
    }

    pub fn for_channel(channel: &Channel) -> Self {
        Self::new(channel.kind, channel.relative_schedule)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Messages carry a meaningful manual order.
    pub fn sequenced(&self) -> bool {
        matches!(
            self.kind,
            ChannelKind::OrderedMessagesChannel | ChannelKind::SecondaryMessagesChannel
        )
    }

    /// Each message carries its own schedule.
    pub fn individually_scheduled(&self) -> bool {
        self.relative_schedule
            || matches!(
                self.kind,
                ChannelKind::IndividuallyScheduledMessagesChannel
                    | ChannelKind::ScheduledMessagesChannel
            )
    }

    /// The channel-level `schedule` field applies.
    pub fn has_schedule(&self) -> bool {
        matches!(
            self.kind,
            ChannelKind::OrderedMessagesChannel
                | ChannelKind::RandomMessagesChannel
                | ChannelKind::AnnouncementsChannel
        )
    }

    pub fn broadcastable(&self) -> bool {
        matches!(
            self.kind,
            ChannelKind::AnnouncementsChannel | ChannelKind::OnDemandMessagesChannel
        )
    }

    /// Up/Down controls are shown for messages.
    pub fn reorderable(&self) -> bool {
        self.sequenced()
    }

    pub fn message_order(&self) -> MessageOrder {
        if self.sequenced() {
            MessageOrder::SeqNoAscending
        } else if self.individually_scheduled() {
            MessageOrder::CreatedAscending
        } else {
            MessageOrder::CreatedDescending
        }
    }

    pub fn flags(&self) -> PolicyFlags {
        PolicyFlags {
            sequenced: self.sequenced(),
            individually_scheduled: self.individually_scheduled(),
            has_schedule: self.has_schedule(),
            broadcastable: self.broadcastable(),
            reorderable: self.reorderable(),
        }
    }
}

/// The policy as plain data, for views and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyFlags {
    pub sequenced: bool,
    pub individually_scheduled: bool,
    pub has_schedule: bool,
    pub broadcastable: bool,
    pub reorderable: bool,
}
