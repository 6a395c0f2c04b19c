//! User profile endpoint

use axum::{
    extract::{Path, State},
    http::Uri,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{ChannelResultExt, ErrorBody, GatewayError, GatewayResult};
use crate::format::Format;
use crate::guard::CurrentUser;
use crate::state::GatewayState;
use crate::views::page_context;

const RECENT_ACTIVITY: i64 = 20;

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The signed-in user's profile"),
        (status = 403, description = "Another user's profile", body = ErrorBody)
    )
)]
pub async fn show_user(
    State(state): State<Arc<GatewayState>>,
    CurrentUser(user): CurrentUser,
    format: Format,
    uri: Uri,
    Path(raw_id): Path<String>,
) -> GatewayResult<Response> {
    let requested = raw_id.trim().parse::<i64>().ok();
    if requested != Some(user.id) {
        return Err(GatewayError::AccessDenied(format));
    }

    if !format.is_html() {
        return Ok(Json(user).into_response());
    }

    let activity = state
        .activity_service()
        .recent(user.id, RECENT_ACTIVITY)
        .await
        .for_format(format)?;

    let mut context = page_context(Some(&user), &uri);
    context.insert("user", &user);
    context.insert("activity", &activity);
    Ok(state.views().render("users/show.html", &context)?.into_response())
}
