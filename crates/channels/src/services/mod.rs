//! Business logic services for channel administration.
//!
//! Services coordinate the repositories, apply channel policy and record
//! administrative actions in the activity log.

pub mod activity_service;
pub mod channel_factory;
pub mod channel_service;
pub mod export_service;
pub mod membership_service;
pub mod message_service;

// Re-export all services
pub use activity_service::ActivityService;
pub use channel_factory::{ChannelFactory, GroupAssignment};
pub use channel_service::ChannelService;
pub use export_service::ExportService;
pub use membership_service::{MembershipOutcome, MembershipService};
pub use message_service::MessageService;
