//! Channel group entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A set of channels whose subscribers are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChannelGroup {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub keyword: Option<String>,
    pub tparty_keyword: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelGroupRequest {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub keyword: Option<String>,
    pub tparty_keyword: Option<String>,
}

impl CreateChannelGroupRequest {
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            description: None,
            keyword: None,
            tparty_keyword: None,
        }
    }
}
