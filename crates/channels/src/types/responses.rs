//! Response types for channel administration.

use channeldesk_database::{Channel, ChannelGroup, Page, Subscriber};
use serde::Serialize;

/// The channel index: one page of channels and one of channel groups.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelIndex {
    pub channels: Page<Channel>,
    pub channel_groups: Page<ChannelGroup>,
}

/// Members of a channel next to the owner's subscribers who are not.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberListing {
    pub subscribed: Page<Subscriber>,
    pub unsubscribed: Page<Subscriber>,
}

/// A generated CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub filename: String,
    pub body: Vec<u8>,
}
