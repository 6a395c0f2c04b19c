//! # Channeldesk Channels Crate
//!
//! Business logic for channel administration: the per-kind channel policy,
//! the message listing pipeline, subscriber membership, the channel factory,
//! CSV export and the activity log.
//!
//! ## Architecture
//!
//! - **Query**: the pure search/count/filter/order/page pipeline
//! - **Services**: business logic over the database repositories
//! - **Types**: requests, responses and errors
//! - **Utils**: channel policy and field validation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use channeldesk_channels::{ListingMode, MessageQuery, MessageService};
//! # async fn run(pool: sqlx::SqlitePool, channel: channeldesk_database::Channel) -> channeldesk_channels::ChannelResult<()> {
//! let service = MessageService::new(pool);
//! let listing = service.listing(&channel, &MessageQuery::default(), ListingMode::Paged).await?;
//! println!("{} messages", listing.counts.total());
//! # Ok(())
//! # }
//! ```

pub mod query;
pub mod services;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use query::{ListingMode, MessageListing, MessageTypeCounts, MESSAGES_PER_PAGE};
pub use services::{
    ActivityService, ChannelFactory, ChannelService, ExportService, GroupAssignment,
    MembershipOutcome, MembershipService, MessageService,
};
pub use types::{
    ChannelError, ChannelForm, ChannelIndex, ChannelIndexQuery, ChannelResult, CsvDocument,
    MessageQuery, SubscriberListQuery, SubscriberListing, SubscriberPanelQuery,
};
pub use utils::{ChannelPolicy, PolicyFlags, ValidationErrors};
