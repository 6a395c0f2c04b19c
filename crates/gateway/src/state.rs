//! Shared state for the gateway

use channeldesk_auth::Authenticator;
use channeldesk_channels::{
    ActivityService, ChannelService, ExportService, MembershipService, MessageService,
};
use channeldesk_config::AuthConfig;
use sqlx::SqlitePool;

use crate::error::GatewayResult;
use crate::views::Views;

/// Services and settings shared by every request.
#[derive(Clone)]
pub struct GatewayState {
    pool: SqlitePool,
    authenticator: Authenticator,
    channel_service: ChannelService,
    message_service: MessageService,
    membership_service: MembershipService,
    export_service: ExportService,
    activity_service: ActivityService,
    views: Views,
    session_cookie: String,
}

impl GatewayState {
    /// Create a new gateway state over an initialised pool.
    pub fn new(pool: SqlitePool, authenticator: Authenticator, auth: &AuthConfig) -> GatewayResult<Self> {
        Ok(Self {
            channel_service: ChannelService::new(pool.clone()),
            message_service: MessageService::new(pool.clone()),
            membership_service: MembershipService::new(pool.clone()),
            export_service: ExportService::new(pool.clone()),
            activity_service: ActivityService::new(pool.clone()),
            views: Views::new()?,
            session_cookie: auth.session_cookie.clone(),
            authenticator,
            pool,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn channel_service(&self) -> &ChannelService {
        &self.channel_service
    }

    pub fn message_service(&self) -> &MessageService {
        &self.message_service
    }

    pub fn membership_service(&self) -> &MembershipService {
        &self.membership_service
    }

    pub fn export_service(&self) -> &ExportService {
        &self.export_service
    }

    pub fn activity_service(&self) -> &ActivityService {
        &self.activity_service
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Name of the cookie carrying the session token.
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }
}
