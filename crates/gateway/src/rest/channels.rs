//! Channel endpoints

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use channeldesk_channels::utils::Validator;
use channeldesk_channels::{
    ChannelError, ChannelForm, ChannelIndexQuery, ChannelPolicy, ListingMode, MessageQuery,
    SubscriberPanelQuery, ValidationErrors,
};
use channeldesk_database::{ChannelKind, Message, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;

use crate::error::{ChannelResultExt, ErrorBody, GatewayError, GatewayResult};
use crate::format::{query_pairs_except, Format};
use crate::guard::{CurrentUser, OwnedChannel};
use crate::navigation::{back_target, channel_path, user_path, FLASH_KEYS};
use crate::rest::{csv_attachment, json_with_location, redirect_with_flash, Navigation, Payload};
use crate::state::GatewayState;
use crate::views::{page_context, pagination_links};

pub const CREATED_NOTICE: &str = "Channel was successfully created.";
pub const UPDATED_NOTICE: &str = "Channel was successfully updated.";
pub const MESSAGES_DELETED_NOTICE: &str = "All messages were deleted.";

const TEXT_FIELDS: [(&str, &str); 7] = [
    ("keyword", "Keyword"),
    ("tparty_keyword", "Tparty keyword"),
    ("schedule", "Schedule"),
    ("one_word", "One word"),
    ("suffix", "Suffix"),
    ("moderator_emails", "Moderator e-mails"),
    ("mo_subscription_deadline", "MO subscription deadline"),
];

const FLAG_FIELDS: [(&str, &str); 5] = [
    ("active", "Active"),
    ("real_time_update", "Real time update"),
    ("relative_schedule", "Relative schedule"),
    ("send_only_once", "Send only once"),
    ("allow_mo_subscription", "Allow MO subscription"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChannelQuery {
    pub channel_group_id: Option<String>,
}

#[derive(Serialize)]
struct MessageRow<'a> {
    #[serde(flatten)]
    message: &'a Message,
    target_time: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct TypeTab {
    label: &'static str,
    count: usize,
    href: String,
    active: bool,
}

#[derive(Serialize)]
struct FormField {
    name: &'static str,
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct FlagField {
    name: &'static str,
    label: &'static str,
    value: bool,
}

#[utoipa::path(
    get,
    path = "/channels",
    tag = "Channels",
    params(
        ("channel_search" = Option<String>, Query, description = "Search channel name, description and keyword"),
        ("channel_group_search" = Option<String>, Query, description = "Search channel groups"),
        ("channels_page" = Option<i64>, Query, description = "Page of channels"),
        ("channel_groups_page" = Option<i64>, Query, description = "Page of channel groups"),
    ),
    responses(
        (status = 200, description = "The user's channels"),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn index(
    State(state): State<Arc<GatewayState>>,
    CurrentUser(user): CurrentUser,
    format: Format,
    uri: Uri,
    Query(query): Query<ChannelIndexQuery>,
) -> GatewayResult<Response> {
    let index = state
        .channel_service()
        .index(user.id, &query)
        .await
        .for_format(format)?;

    if !format.is_html() {
        return Ok(Json(index.channels.items).into_response());
    }

    let params = query_pairs_except(&uri, &FLASH_KEYS);
    let mut context = page_context(Some(&user), &uri);
    context.insert(
        "channel_links",
        &pagination_links(&index.channels, "/channels", "channels_page", &params),
    );
    context.insert(
        "channel_group_links",
        &pagination_links(&index.channel_groups, "/channels", "channel_groups_page", &params),
    );
    context.insert("channels", &index.channels);
    context.insert("channel_groups", &index.channel_groups);
    context.insert("channel_search", &query.channel_search.unwrap_or_default());
    context.insert("channel_group_search", &query.channel_group_search.unwrap_or_default());

    render(&state, "channels/index.html", &context)
}

#[utoipa::path(
    get,
    path = "/channels/{id}",
    tag = "Channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 200, description = "The channel"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody)
    )
)]
pub async fn show(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    uri: Uri,
    Query(message_query): Query<MessageQuery>,
    Query(panel): Query<SubscriberPanelQuery>,
) -> GatewayResult<Response> {
    if !format.is_html() {
        return Ok(Json(channel).into_response());
    }

    let listing = state
        .message_service()
        .listing(&channel, &message_query, ListingMode::Paged)
        .await
        .for_format(format)?;
    let subscribers = state
        .membership_service()
        .channel_subscribers(&channel, panel.subscriber_search.as_deref(), panel.subscribers_page)
        .await
        .for_format(format)?;
    let subscriber_count = state
        .membership_service()
        .subscriber_count(&channel)
        .await
        .for_format(format)?;

    let path = channel_path(channel.id);
    let params = query_pairs_except(&uri, &FLASH_KEYS);
    let type_tabs: Vec<TypeTab> = listing
        .counts
        .iter()
        .map(|(tag, count)| TypeTab {
            label: tag,
            count,
            href: type_tab_href(&path, tag, listing.message_search.as_deref()),
            active: tag == listing.message_type,
        })
        .collect();

    let mut context = page_context(Some(&user), &uri);
    context.insert("channel", &channel);
    context.insert("policy", &ChannelPolicy::for_channel(&channel).flags());
    context.insert("message_rows", &message_rows(&listing.messages.items));
    context.insert(
        "message_links",
        &pagination_links(&listing.messages, &path, "messages_page", &params),
    );
    context.insert("type_tabs", &type_tabs);
    context.insert("message_type", &listing.message_type);
    context.insert("message_search", &listing.message_search.clone().unwrap_or_default());
    context.insert(
        "subscriber_links",
        &pagination_links(&subscribers, &path, "subscribers_page", &params),
    );
    context.insert("subscribers", &subscribers);
    context.insert("subscriber_search", &panel.subscriber_search.unwrap_or_default());
    context.insert("subscriber_count", &subscriber_count);
    context.insert("listing", &listing);

    render(&state, "channels/show.html", &context)
}

pub async fn all(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    uri: Uri,
    Query(message_query): Query<MessageQuery>,
) -> GatewayResult<Response> {
    if !format.is_html() {
        return Ok(Json(channel).into_response());
    }

    let listing = state
        .message_service()
        .listing(&channel, &message_query, ListingMode::All)
        .await
        .for_format(format)?;

    let mut context = page_context(Some(&user), &uri);
    context.insert("channel", &channel);
    context.insert("listing", &listing);
    render(&state, "channels/all.html", &context)
}

pub async fn new_channel(
    State(state): State<Arc<GatewayState>>,
    CurrentUser(user): CurrentUser,
    format: Format,
    uri: Uri,
    Query(query): Query<NewChannelQuery>,
) -> GatewayResult<Response> {
    let mut form = ChannelForm::default();

    let requested_group = query
        .channel_group_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty());
    if let Some(raw) = requested_group {
        let group_id = raw
            .parse::<i64>()
            .map_err(|_| GatewayError::AccessDenied(format))?;
        let group = state
            .channel_service()
            .find_owned_group(user.id, group_id)
            .await
            .for_format(format)?
            .ok_or(GatewayError::AccessDenied(format))?;
        form.channel_group_id = Some(group.id.to_string());
    }

    if !format.is_html() {
        return Ok(Json(form).into_response());
    }
    render_form(&state, &user, &uri, &form, None, None).await
}

#[utoipa::path(
    post,
    path = "/channels",
    tag = "Channels",
    responses(
        (status = 201, description = "Channel created"),
        (status = 403, description = "Channel group not owned by the user", body = ErrorBody),
        (status = 422, description = "Validation errors keyed by field")
    )
)]
pub async fn create(
    State(state): State<Arc<GatewayState>>,
    CurrentUser(user): CurrentUser,
    format: Format,
    uri: Uri,
    Payload(form): Payload<ChannelForm>,
) -> GatewayResult<Response> {
    match state.channel_service().create(user.id, &form).await {
        Ok(channel) => {
            let location = channel_path(channel.id);
            if format.is_html() {
                Ok(redirect_with_flash(&location, "notice", CREATED_NOTICE))
            } else {
                json_with_location(StatusCode::CREATED, &location, &channel)
            }
        }
        Err(ChannelError::Validation(errors)) if format.is_html() => {
            render_form(&state, &user, &uri, &form, None, Some(&errors)).await
        }
        Err(error) => Err(GatewayError::from_channel(error, format)),
    }
}

pub async fn edit(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    uri: Uri,
) -> GatewayResult<Response> {
    if !format.is_html() {
        return Ok(Json(channel).into_response());
    }
    render_form(&state, &user, &uri, &ChannelForm::from(&channel), Some(channel.id), None).await
}

#[utoipa::path(
    patch,
    path = "/channels/{id}",
    tag = "Channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 204, description = "Channel updated"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody),
        (status = 422, description = "Validation errors keyed by field")
    )
)]
pub async fn update(
    State(state): State<Arc<GatewayState>>,
    owned: OwnedChannel,
    format: Format,
    uri: Uri,
    Payload(form): Payload<ChannelForm>,
) -> GatewayResult<Response> {
    update_channel(&state, owned, format, &uri, &form).await
}

/// POST from an HTML form: an update, or a destroy with `_method=delete`.
pub async fn update_or_destroy(
    State(state): State<Arc<GatewayState>>,
    owned: OwnedChannel,
    format: Format,
    uri: Uri,
    Query(navigation): Query<Navigation>,
    Payload(form): Payload<ChannelForm>,
) -> GatewayResult<Response> {
    if navigation.wants_delete() {
        return destroy_channel(&state, owned, format).await;
    }
    update_channel(&state, owned, format, &uri, &form).await
}

#[utoipa::path(
    delete,
    path = "/channels/{id}",
    tag = "Channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 204, description = "Channel destroyed"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody)
    )
)]
pub async fn destroy(
    State(state): State<Arc<GatewayState>>,
    owned: OwnedChannel,
    format: Format,
) -> GatewayResult<Response> {
    destroy_channel(&state, owned, format).await
}

#[utoipa::path(
    get,
    path = "/channels/{id}/messages_report",
    tag = "Channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 200, description = "CSV report of the channel's messages"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody)
    )
)]
pub async fn messages_report(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { channel, .. }: OwnedChannel,
    format: Format,
) -> GatewayResult<Response> {
    let document = state
        .export_service()
        .messages_report(&channel, Utc::now().date_naive())
        .await
        .for_format(format)?;
    csv_attachment(document)
}

#[utoipa::path(
    get,
    path = "/channels/{id}/export",
    tag = "Channels",
    params(("id" = i64, Path, description = "Channel id")),
    responses(
        (status = 200, description = "CSV export of every message"),
        (status = 403, description = "Not one of the user's channels", body = ErrorBody)
    )
)]
pub async fn export(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
) -> GatewayResult<Response> {
    let document = state
        .export_service()
        .export(user.id, &channel, Utc::now().date_naive())
        .await
        .for_format(format)?;
    csv_attachment(document)
}

pub async fn delete_all_messages(
    State(state): State<Arc<GatewayState>>,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    headers: HeaderMap,
    Query(navigation): Query<Navigation>,
) -> GatewayResult<Response> {
    let deleted = state
        .message_service()
        .delete_all(user.id, &channel)
        .await
        .for_format(format)?;

    if !format.is_html() {
        return Ok(Json(serde_json::json!({ "deleted": deleted })).into_response());
    }

    let target = back_target(navigation.return_to.as_deref(), &headers, &channel_path(channel.id));
    Ok(redirect_with_flash(&target, "notice", MESSAGES_DELETED_NOTICE))
}

async fn update_channel(
    state: &GatewayState,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
    uri: &Uri,
    form: &ChannelForm,
) -> GatewayResult<Response> {
    match state.channel_service().update(user.id, channel.id, form).await {
        Ok(channel) => {
            if format.is_html() {
                Ok(redirect_with_flash(&channel_path(channel.id), "notice", UPDATED_NOTICE))
            } else {
                Ok(StatusCode::NO_CONTENT.into_response())
            }
        }
        Err(ChannelError::Validation(errors)) if format.is_html() => {
            render_form(state, &user, uri, form, Some(channel.id), Some(&errors)).await
        }
        Err(error) => Err(GatewayError::from_channel(error, format)),
    }
}

async fn destroy_channel(
    state: &GatewayState,
    OwnedChannel { user, channel }: OwnedChannel,
    format: Format,
) -> GatewayResult<Response> {
    state
        .channel_service()
        .destroy(user.id, &channel)
        .await
        .for_format(format)?;

    if format.is_html() {
        Ok(Redirect::to(&user_path(user.id)).into_response())
    } else {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

/// The new/edit form; 422 when re-rendered with errors.
async fn render_form(
    state: &GatewayState,
    user: &User,
    uri: &Uri,
    form: &ChannelForm,
    channel_id: Option<i64>,
    errors: Option<&ValidationErrors>,
) -> GatewayResult<Response> {
    let groups = state
        .channel_service()
        .groups_for(user.id)
        .await
        .for_format(Format::Html)?;
    let kinds: Vec<&str> = ChannelKind::ALL.iter().map(ChannelKind::as_str).collect();

    let values = form_values(form)?;
    let text = |name: &str| {
        values
            .get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let text_fields: Vec<FormField> = TEXT_FIELDS
        .iter()
        .map(|&(name, label)| FormField {
            name,
            label,
            value: text(name),
        })
        .collect();
    let flag_fields: Vec<FlagField> = FLAG_FIELDS
        .iter()
        .map(|&(name, label)| FlagField {
            name,
            label,
            value: Validator::boolean(&text(name)).unwrap_or(name == "active"),
        })
        .collect();

    let mut context = page_context(Some(user), uri);
    context.insert("form", &values);
    context.insert("channel_id", &channel_id);
    context.insert("kinds", &kinds);
    context.insert("groups", &groups);
    context.insert(
        "selected_group_id",
        &form
            .channel_group_id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok()),
    );
    context.insert("text_fields", &text_fields);
    context.insert("flag_fields", &flag_fields);
    context.insert("error_sentence", &errors.map(ValidationErrors::to_sentence));

    let status = if errors.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let html = state.views().render("channels/form.html", &context)?;
    Ok((status, html).into_response())
}

/// Form fields as a JSON object with absent values rendered as empty text.
fn form_values(form: &ChannelForm) -> GatewayResult<serde_json::Map<String, serde_json::Value>> {
    let value = serde_json::to_value(form)
        .map_err(|e| GatewayError::internal(format!("serializing channel form: {}", e)))?;
    let serde_json::Value::Object(mut values) = value else {
        return Err(GatewayError::internal("channel form is not an object"));
    };
    for value in values.values_mut() {
        if value.is_null() {
            *value = serde_json::Value::String(String::new());
        }
    }
    Ok(values)
}

fn message_rows(messages: &[Message]) -> Vec<MessageRow<'_>> {
    messages
        .iter()
        .map(|message| MessageRow {
            message,
            target_time: message.target_time(),
        })
        .collect()
}

fn type_tab_href(path: &str, tag: &str, search: Option<&str>) -> String {
    let mut href = format!("{}?message_type={}", path, urlencoding::encode(tag));
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        href.push_str("&message_search=");
        href.push_str(&urlencoding::encode(search));
    }
    href
}

fn render(state: &GatewayState, template: &str, context: &Context) -> GatewayResult<Response> {
    Ok(state.views().render(template, context)?.into_response())
}
