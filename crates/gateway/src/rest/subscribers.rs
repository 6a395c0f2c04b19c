//! Channel membership endpoints

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use channeldesk_channels::{MembershipOutcome, SubscriberListQuery};
use std::sync::Arc;

use crate::error::{ChannelResultExt, ErrorBody, GatewayResult};
use crate::format::{query_pairs_except, Format};
use crate::guard::{OwnedChannel, OwnedMembership};
use crate::navigation::{back_target, channel_path, FLASH_KEYS};
use crate::rest::{json_with_location, redirect_with_flash, Navigation};
use crate::state::GatewayState;
use crate::views::{page_context, pagination_links};

#[utoipa::path(
    get,
    path = "/channels/{id}/list_subscribers",
    tag = "Subscribers",
    params(
        ("id" = i64, Path, description = "Channel id"),
        ("subscribed_subscribers_page" = Option<i64>, Query, description = "Page of members"),
        ("unsubscribed_subscribers_page" = Option<i64>, Query, description = "Page of non-members"),
    ),
    responses(
        (status = 200, description = "The channel"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody)
    )
)]
pub async fn list_subscribers(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    uri: Uri,
    Query(query): Query<SubscriberListQuery>,
) -> GatewayResult<Response> {
    if !format.is_html() {
        return Ok(Json(channel).into_response());
    }

    let listing = state
        .membership_service()
        .list_subscribers(
            &channel,
            user.id,
            query.subscribed_subscribers_page,
            query.unsubscribed_subscribers_page,
        )
        .await
        .for_format(format)?;

    let path = format!("{}/list_subscribers", channel_path(channel.id));
    let params = query_pairs_except(&uri, &FLASH_KEYS);
    let return_to = return_to_value(&path, &params);

    let mut context = page_context(Some(&user), &uri);
    context.insert("channel", &channel);
    context.insert(
        "subscribed_links",
        &pagination_links(&listing.subscribed, &path, "subscribed_subscribers_page", &params),
    );
    context.insert(
        "unsubscribed_links",
        &pagination_links(&listing.unsubscribed, &path, "unsubscribed_subscribers_page", &params),
    );
    context.insert("listing", &listing);
    context.insert("return_to", &return_to);

    Ok(state
        .views()
        .render("channels/list_subscribers.html", &context)?
        .into_response())
}

#[utoipa::path(
    post,
    path = "/channels/{id}/subscribers/{subscriber_id}",
    tag = "Subscribers",
    params(
        ("id" = i64, Path, description = "Channel id"),
        ("subscriber_id" = i64, Path, description = "Subscriber id"),
    ),
    responses(
        (status = 200, description = "Members of the channel after the change"),
        (status = 403, description = "Channel or subscriber not owned by the user", body = ErrorBody)
    )
)]
pub async fn add_subscriber(
    State(state): State<Arc<GatewayState>>,
    membership: OwnedMembership,
    format: Format,
    headers: HeaderMap,
    Query(navigation): Query<Navigation>,
) -> GatewayResult<Response> {
    let outcome = state
        .membership_service()
        .add(membership.user.id, &membership.channel, &membership.subscriber)
        .await
        .for_format(format)?;
    membership_response(&state, &membership, outcome, format, &headers, &navigation).await
}

#[utoipa::path(
    delete,
    path = "/channels/{id}/subscribers/{subscriber_id}",
    tag = "Subscribers",
    params(
        ("id" = i64, Path, description = "Channel id"),
        ("subscriber_id" = i64, Path, description = "Subscriber id"),
    ),
    responses(
        (status = 200, description = "Members of the channel after the change"),
        (status = 403, description = "Channel or subscriber not owned by the user", body = ErrorBody)
    )
)]
pub async fn remove_subscriber(
    State(state): State<Arc<GatewayState>>,
    membership: OwnedMembership,
    format: Format,
    headers: HeaderMap,
    Query(navigation): Query<Navigation>,
) -> GatewayResult<Response> {
    let outcome = state
        .membership_service()
        .remove(membership.user.id, &membership.channel, &membership.subscriber)
        .await
        .for_format(format)?;
    membership_response(&state, &membership, outcome, format, &headers, &navigation).await
}

/// HTML forms post here; `_method=delete` turns the post into a removal.
pub async fn add_or_remove_subscriber(
    state: State<Arc<GatewayState>>,
    membership: OwnedMembership,
    format: Format,
    headers: HeaderMap,
    navigation: Query<Navigation>,
) -> GatewayResult<Response> {
    if navigation.wants_delete() {
        remove_subscriber(state, membership, format, headers, navigation).await
    } else {
        add_subscriber(state, membership, format, headers, navigation).await
    }
}

async fn membership_response(
    state: &GatewayState,
    membership: &OwnedMembership,
    outcome: MembershipOutcome,
    format: Format,
    headers: &HeaderMap,
    navigation: &Navigation,
) -> GatewayResult<Response> {
    let channel_location = channel_path(membership.channel.id);

    if format.is_html() {
        let target = back_target(navigation.return_to.as_deref(), headers, &channel_location);
        let kind = if outcome.is_alert() { "alert" } else { "notice" };
        return Ok(redirect_with_flash(&target, kind, outcome.notice()));
    }

    let members = state
        .membership_service()
        .members(&membership.channel)
        .await
        .for_format(format)?;
    json_with_location(StatusCode::OK, &channel_location, &members)
}

/// `return_to` for the add/remove forms, already percent-encoded.
fn return_to_value(path: &str, params: &[(String, String)]) -> String {
    let target = if params.is_empty() {
        path.to_string()
    } else {
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect();
        format!("{}?{}", path, query.join("&"))
    };
    urlencoding::encode(&target).into_owned()
}
