//! Message entity definitions

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

use super::column_decode_error;

/// Closed set of message variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageKind {
    ActionMessage,
    PollMessage,
    ResponseMessage,
    SimpleMessage,
    TagMessage,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        MessageKind::ActionMessage,
        MessageKind::PollMessage,
        MessageKind::ResponseMessage,
        MessageKind::SimpleMessage,
        MessageKind::TagMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::ActionMessage => "ActionMessage",
            MessageKind::PollMessage => "PollMessage",
            MessageKind::ResponseMessage => "ResponseMessage",
            MessageKind::SimpleMessage => "SimpleMessage",
            MessageKind::TagMessage => "TagMessage",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMessageKind(pub String);

impl fmt::Display for UnknownMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown message type '{}'", self.0)
    }
}

impl std::error::Error for UnknownMessageKind {}

impl FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMessageKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub channel_id: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub seq_no: Option<i64>,
    pub schedule: Option<String>,
    pub next_send_time: Option<DateTime<Utc>>,
    pub active: bool,
    pub requires_response: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// When the message is due, for display ordering.
    ///
    /// The scheduler-maintained `next_send_time` wins; otherwise an absolute
    /// `YYYY-MM-DD HH:MM` schedule (UTC) is used. Relative schedules such as
    /// `Day 1 12:00` depend on the subscriber and have no single target time.
    pub fn target_time(&self) -> Option<DateTime<Utc>> {
        self.next_send_time
            .or_else(|| self.schedule.as_deref().and_then(parse_absolute_schedule))
    }
}

fn parse_absolute_schedule(schedule: &str) -> Option<DateTime<Utc>> {
    let schedule = schedule.trim();
    ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(schedule, format).ok())
        .map(|naive| naive.and_utc())
}

impl<'r> FromRow<'r, SqliteRow> for Message {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("message_type")?;
        let kind = kind
            .parse::<MessageKind>()
            .map_err(|e| column_decode_error("message_type", e))?;

        Ok(Self {
            id: row.try_get("id")?,
            channel_id: row.try_get("channel_id")?,
            kind,
            title: row.try_get("title")?,
            caption: row.try_get("caption")?,
            seq_no: row.try_get("seq_no")?,
            schedule: row.try_get("schedule")?,
            next_send_time: row.try_get("next_send_time")?,
            active: row.try_get("active")?,
            requires_response: row.try_get("requires_response")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub channel_id: i64,
    pub kind: MessageKind,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub seq_no: Option<i64>,
    pub schedule: Option<String>,
    pub next_send_time: Option<DateTime<Utc>>,
    pub active: bool,
    pub requires_response: bool,
    /// Defaults to the insertion time.
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateMessageRequest {
    pub fn new(channel_id: i64, kind: MessageKind, caption: impl Into<String>) -> Self {
        Self {
            channel_id,
            kind,
            title: None,
            caption: Some(caption.into()),
            seq_no: None,
            schedule: None,
            next_send_time: None,
            active: true,
            requires_response: matches!(kind, MessageKind::ResponseMessage | MessageKind::PollMessage),
            created_at: None,
        }
    }
}
