//! Shared types for channel administration.

pub mod errors;
pub mod requests;
pub mod responses;

pub use errors::{ChannelError, ChannelResult};
pub use requests::{
    ChannelForm, ChannelIndexQuery, MessageQuery, SubscriberListQuery, SubscriberPanelQuery,
};
pub use responses::{ChannelIndex, CsvDocument, SubscriberListing};
