//! Subscriber entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriberRequest {
    pub user_id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl CreateSubscriberRequest {
    pub fn new(user_id: i64, name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            phone_number: Some(phone_number.into()),
            email: None,
            notes: None,
        }
    }
}
