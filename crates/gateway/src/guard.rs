//! Authentication and ownership guards.
//!
//! Handlers take these extractors instead of raw ids. Resources are always
//! looked up through the signed-in user's own collections, so a foreign id
//! and a missing id produce the same `AccessDenied`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use channeldesk_database::{Channel, Subscriber, User};
use tracing::debug;

use crate::error::{ChannelResultExt, GatewayError, GatewayResult};
use crate::format::Format;
use crate::state::GatewayState;

/// The signed-in user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| GatewayError::AuthenticationRequired(Format::from_parts(parts)))
    }
}

/// A channel owned by the signed-in user, taken from the `:id` segment.
#[derive(Debug, Clone)]
pub struct OwnedChannel {
    pub user: User,
    pub channel: Channel,
}

#[axum::async_trait]
impl FromRequestParts<Arc<GatewayState>> for OwnedChannel {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let format = Format::from_parts(parts);
        let params = path_params(parts, state, format).await?;

        let channel = load_channel(state, &user, &params, format).await?;
        Ok(Self { user, channel })
    }
}

/// A channel and a subscriber, both owned by the signed-in user.
#[derive(Debug, Clone)]
pub struct OwnedMembership {
    pub user: User,
    pub channel: Channel,
    pub subscriber: Subscriber,
}

#[axum::async_trait]
impl FromRequestParts<Arc<GatewayState>> for OwnedMembership {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let format = Format::from_parts(parts);
        let params = path_params(parts, state, format).await?;

        let channel = load_channel(state, &user, &params, format).await?;
        let subscriber_id = parse_id(&params, "subscriber_id", format)?;
        let subscriber = state
            .membership_service()
            .find_subscriber(user.id, subscriber_id)
            .await
            .for_format(format)?
            .ok_or_else(|| {
                debug!(user_id = user.id, subscriber_id, "subscriber not owned by user");
                GatewayError::AccessDenied(format)
            })?;

        Ok(Self {
            user,
            channel,
            subscriber,
        })
    }
}

async fn path_params(
    parts: &mut Parts,
    state: &Arc<GatewayState>,
    format: Format,
) -> GatewayResult<HashMap<String, String>> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| GatewayError::AccessDenied(format))?;
    Ok(params)
}

fn parse_id(params: &HashMap<String, String>, name: &str, format: Format) -> GatewayResult<i64> {
    params
        .get(name)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or(GatewayError::AccessDenied(format))
}

async fn load_channel(
    state: &GatewayState,
    user: &User,
    params: &HashMap<String, String>,
    format: Format,
) -> GatewayResult<Channel> {
    let channel_id = parse_id(params, "id", format)?;
    state
        .channel_service()
        .find_owned(user.id, channel_id)
        .await
        .for_format(format)?
        .ok_or_else(|| {
            debug!(user_id = user.id, channel_id, "channel not owned by user");
            GatewayError::AccessDenied(format)
        })
}
