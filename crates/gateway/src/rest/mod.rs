//! HTTP endpoints of the gateway

pub mod channels;
pub mod health;
pub mod home;
pub mod subscribers;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use channeldesk_channels::CsvDocument;
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};
use crate::navigation::flash_url;
use crate::state::GatewayState;

/// Create all routes that need the shared state
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health_check))
        .route("/users/:id", get(users::show_user))
        .route("/channels", get(channels::index).post(channels::create))
        .route("/channels/new", get(channels::new_channel))
        .route(
            "/channels/:id",
            get(channels::show)
                .put(channels::update)
                .patch(channels::update)
                .post(channels::update_or_destroy)
                .delete(channels::destroy),
        )
        .route("/channels/:id/all", get(channels::all))
        .route("/channels/:id/edit", get(channels::edit))
        .route("/channels/:id/messages_report", get(channels::messages_report))
        .route("/channels/:id/export", get(channels::export))
        .route(
            "/channels/:id/delete_all_messages",
            post(channels::delete_all_messages).delete(channels::delete_all_messages),
        )
        .route("/channels/:id/list_subscribers", get(subscribers::list_subscribers))
        .route(
            "/channels/:id/subscribers/:subscriber_id",
            post(subscribers::add_or_remove_subscriber).delete(subscribers::remove_subscriber),
        )
}

/// `return_to` for actions that go back, and `_method` for HTML forms that
/// cannot send DELETE.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Navigation {
    pub return_to: Option<String>,
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl Navigation {
    pub fn wants_delete(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|method| method.eq_ignore_ascii_case("delete"))
    }
}

/// A request body sent either as JSON or as an HTML form.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = GatewayError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("application/json") => {
                let Json(value) = Json::<T>::from_request(request, state)
                    .await
                    .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
                Ok(Payload(value))
            }
            Some(_) => {
                let Form(value) = Form::<T>::from_request(request, state)
                    .await
                    .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
                Ok(Payload(value))
            }
            None => {
                let value = serde_json::from_value(serde_json::json!({}))
                    .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
                Ok(Payload(value))
            }
        }
    }
}

/// 303 to `target` with a notice or alert attached.
pub fn redirect_with_flash(target: &str, kind: &str, message: &str) -> Response {
    Redirect::to(&flash_url(target, kind, message)).into_response()
}

/// 201/200 JSON with a `Location` header.
pub fn json_with_location<T: serde::Serialize>(
    status: StatusCode,
    location: &str,
    body: &T,
) -> GatewayResult<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| GatewayError::internal(format!("invalid location header: {}", e)))?;
    Ok((status, [(header::LOCATION, location)], Json(body)).into_response())
}

pub fn csv_attachment(document: CsvDocument) -> GatewayResult<Response> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.filename
    ))
    .map_err(|e| GatewayError::internal(format!("invalid filename: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    )
        .into_response())
}
