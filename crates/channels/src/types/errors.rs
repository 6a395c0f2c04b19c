//! Error types for channel administration.

use channeldesk_database::StoreError;
use thiserror::Error;

use crate::utils::ValidationErrors;

/// Result type alias for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Main error type for channel administration
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The resource is missing or belongs to someone else. The two cases are
    /// deliberately indistinguishable.
    #[error("Access denied")]
    AccessDenied,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ChannelError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error should be shown to the user rather than logged.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::AccessDenied | Self::Validation(_))
    }
}

impl From<ValidationErrors> for ChannelError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization error: {}", err),
        }
    }
}
