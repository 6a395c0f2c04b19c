//! Landing page

use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
    Extension,
};
use channeldesk_database::User;
use std::sync::Arc;

use crate::error::GatewayResult;
use crate::state::GatewayState;
use crate::views::page_context;

/// Renders whatever flash the redirect carried; open to anonymous visitors.
pub async fn home(
    State(state): State<Arc<GatewayState>>,
    user: Option<Extension<User>>,
    uri: Uri,
) -> GatewayResult<Response> {
    let user = user.map(|Extension(user)| user);
    let context = page_context(user.as_ref(), &uri);
    Ok(state.views().render("home.html", &context)?.into_response())
}
