//! Channel entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

use super::column_decode_error;

/// The `type` discriminator of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    AnnouncementsChannel,
    IndividuallyScheduledMessagesChannel,
    OnDemandMessagesChannel,
    OrderedMessagesChannel,
    RandomMessagesChannel,
    ScheduledMessagesChannel,
    SecondaryMessagesChannel,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 7] = [
        ChannelKind::AnnouncementsChannel,
        ChannelKind::IndividuallyScheduledMessagesChannel,
        ChannelKind::OnDemandMessagesChannel,
        ChannelKind::OrderedMessagesChannel,
        ChannelKind::RandomMessagesChannel,
        ChannelKind::ScheduledMessagesChannel,
        ChannelKind::SecondaryMessagesChannel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::AnnouncementsChannel => "AnnouncementsChannel",
            ChannelKind::IndividuallyScheduledMessagesChannel => {
                "IndividuallyScheduledMessagesChannel"
            }
            ChannelKind::OnDemandMessagesChannel => "OnDemandMessagesChannel",
            ChannelKind::OrderedMessagesChannel => "OrderedMessagesChannel",
            ChannelKind::RandomMessagesChannel => "RandomMessagesChannel",
            ChannelKind::ScheduledMessagesChannel => "ScheduledMessagesChannel",
            ChannelKind::SecondaryMessagesChannel => "SecondaryMessagesChannel",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannelKind(pub String);

impl fmt::Display for UnknownChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel type '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannelKind {}

impl FromStr for ChannelKind {
    type Err = UnknownChannelKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownChannelKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub user_id: i64,
    pub channel_group_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub keyword: Option<String>,
    pub tparty_keyword: Option<String>,
    pub one_word: Option<String>,
    pub suffix: Option<String>,
    pub moderator_emails: Option<String>,
    pub schedule: Option<String>,
    pub relative_schedule: bool,
    pub real_time_update: bool,
    pub send_only_once: bool,
    pub active: bool,
    pub allow_mo_subscription: bool,
    pub mo_subscription_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// The editable attributes of this channel, used as the base for updates.
    pub fn attributes(&self) -> ChannelAttributes {
        ChannelAttributes {
            user_id: self.user_id,
            channel_group_id: self.channel_group_id,
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            keyword: self.keyword.clone(),
            tparty_keyword: self.tparty_keyword.clone(),
            one_word: self.one_word.clone(),
            suffix: self.suffix.clone(),
            moderator_emails: self.moderator_emails.clone(),
            schedule: self.schedule.clone(),
            relative_schedule: self.relative_schedule,
            real_time_update: self.real_time_update,
            send_only_once: self.send_only_once,
            active: self.active,
            allow_mo_subscription: self.allow_mo_subscription,
            mo_subscription_deadline: self.mo_subscription_deadline,
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Channel {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("channel_type")?;
        let kind = kind
            .parse::<ChannelKind>()
            .map_err(|e| column_decode_error("channel_type", e))?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            channel_group_id: row.try_get("channel_group_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            kind,
            keyword: row.try_get("keyword")?,
            tparty_keyword: row.try_get("tparty_keyword")?,
            one_word: row.try_get("one_word")?,
            suffix: row.try_get("suffix")?,
            moderator_emails: row.try_get("moderator_emails")?,
            schedule: row.try_get("schedule")?,
            relative_schedule: row.try_get("relative_schedule")?,
            real_time_update: row.try_get("real_time_update")?,
            send_only_once: row.try_get("send_only_once")?,
            active: row.try_get("active")?,
            allow_mo_subscription: row.try_get("allow_mo_subscription")?,
            mo_subscription_deadline: row.try_get("mo_subscription_deadline")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Everything a channel row stores apart from its id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAttributes {
    pub user_id: i64,
    pub channel_group_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub keyword: Option<String>,
    pub tparty_keyword: Option<String>,
    pub one_word: Option<String>,
    pub suffix: Option<String>,
    pub moderator_emails: Option<String>,
    pub schedule: Option<String>,
    pub relative_schedule: bool,
    pub real_time_update: bool,
    pub send_only_once: bool,
    pub active: bool,
    pub allow_mo_subscription: bool,
    pub mo_subscription_deadline: Option<DateTime<Utc>>,
}

impl ChannelAttributes {
    /// Minimal attributes for a channel of `kind` named `name`.
    pub fn new(user_id: i64, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            user_id,
            channel_group_id: None,
            name: name.into(),
            description: None,
            kind,
            keyword: None,
            tparty_keyword: None,
            one_word: None,
            suffix: None,
            moderator_emails: None,
            schedule: None,
            relative_schedule: false,
            real_time_update: false,
            send_only_once: false,
            active: true,
            allow_mo_subscription: false,
            mo_subscription_deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ChannelKind::ALL {
            assert_eq!(kind.as_str().parse::<ChannelKind>(), Ok(kind));
        }
        assert!("PigeonChannel".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_type_name() {
        let attrs = ChannelAttributes::new(1, "Daily tips", ChannelKind::RandomMessagesChannel);
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["type"], "RandomMessagesChannel");
        assert_eq!(json["active"], true);
    }
}
