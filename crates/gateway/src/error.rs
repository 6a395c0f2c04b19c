//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use channeldesk_auth::AuthError;
use channeldesk_channels::{ChannelError, ValidationErrors};
use channeldesk_database::StoreError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::format::Format;
use crate::navigation::flash_url;

pub const SIGN_IN_REQUIRED: &str = "You need to sign in before continuing.";
pub const ACCESS_DENIED: &str = "Access Denied";

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("You need to sign in before continuing.")]
    AuthenticationRequired(Format),

    /// Missing, foreign and malformed resources all end up here.
    #[error("Access Denied")]
    AccessDenied(Format),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON body of every error response except validation failures.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AccessDenied(_) => StatusCode::FORBIDDEN,
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::InternalError(message.into())
    }

    /// Map a service error, keeping the client's format for denials.
    pub fn from_channel(error: ChannelError, format: Format) -> Self {
        match error {
            ChannelError::AccessDenied => GatewayError::AccessDenied(format),
            ChannelError::Validation(errors) => GatewayError::Validation(errors),
            other => GatewayError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            GatewayError::AuthenticationRequired(Format::Html) => {
                Redirect::to(&flash_url("/", "alert", SIGN_IN_REQUIRED)).into_response()
            }
            GatewayError::AccessDenied(Format::Html) => {
                Redirect::to(&flash_url("/", "alert", ACCESS_DENIED)).into_response()
            }
            GatewayError::Validation(errors) => {
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            GatewayError::InternalError(message) => {
                error!(%message, "request failed");
                let body = json!({
                    "error": status.as_str(),
                    "message": "Internal server error",
                });
                (status, Json(body)).into_response()
            }
            other => {
                let body = json!({
                    "error": status.as_str(),
                    "message": other.to_string(),
                });
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Attach the negotiated format to a service result.
pub trait ChannelResultExt<T> {
    fn for_format(self, format: Format) -> GatewayResult<T>;
}

impl<T> ChannelResultExt<T> for Result<T, ChannelError> {
    fn for_format(self, format: Format) -> GatewayResult<T> {
        self.map_err(|error| GatewayError::from_channel(error, format))
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::UserNotFound => {
                GatewayError::AuthenticationRequired(Format::Json)
            }
            other => GatewayError::InternalError(other.to_string()),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(error: StoreError) -> Self {
        GatewayError::InternalError(error.to_string())
    }
}

impl From<tera::Error> for GatewayError {
    fn from(error: tera::Error) -> Self {
        // tera keeps the useful part in the source chain
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        GatewayError::InternalError(format!("template error: {}", message))
    }
}

impl From<axum::http::Error> for GatewayError {
    fn from(error: axum::http::Error) -> Self {
        GatewayError::InternalError(format!("response build error: {}", error))
    }
}
