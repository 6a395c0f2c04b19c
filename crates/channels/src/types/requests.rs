//! Request types for channel administration.
//!
//! Query strings and form bodies arrive as loose text; these types accept
//! whatever the browser or API client sends and leave interpretation to the
//! services.

use channeldesk_database::Channel;
use serde::{Deserialize, Deserializer, Serialize};

/// Raw channel fields from a create or update form.
///
/// `None` means the field was not submitted; on update that keeps the prior
/// value. Present-but-blank text clears an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelForm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tparty_keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub schedule: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub channel_group_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub one_word: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub suffix: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub moderator_emails: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub real_time_update: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub relative_schedule: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub send_only_once: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub active: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub allow_mo_subscription: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mo_subscription_deadline: Option<String>,
}

impl ChannelForm {
    /// A form with only `name` and `type` filled in.
    pub fn named(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
            ..Self::default()
        }
    }
}

impl From<&Channel> for ChannelForm {
    /// The edit form of an existing channel.
    fn from(channel: &Channel) -> Self {
        let flag = |value: bool| Some(value.to_string());
        Self {
            name: Some(channel.name.clone()),
            description: channel.description.clone(),
            kind: Some(channel.kind.to_string()),
            keyword: channel.keyword.clone(),
            tparty_keyword: channel.tparty_keyword.clone(),
            schedule: channel.schedule.clone(),
            channel_group_id: channel.channel_group_id.map(|id| id.to_string()),
            one_word: channel.one_word.clone(),
            suffix: channel.suffix.clone(),
            moderator_emails: channel.moderator_emails.clone(),
            real_time_update: flag(channel.real_time_update),
            relative_schedule: flag(channel.relative_schedule),
            send_only_once: flag(channel.send_only_once),
            active: flag(channel.active),
            allow_mo_subscription: flag(channel.allow_mo_subscription),
            mo_subscription_deadline: channel
                .mo_subscription_deadline
                .map(|deadline| deadline.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

/// Search and paging for the channel index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelIndexQuery {
    #[serde(default, deserialize_with = "lenient_text")]
    pub channel_search: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub channel_group_search: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub channels_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub channel_groups_page: Option<i64>,
}

/// Message filters for the show and all pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQuery {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message_search: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub messages_page: Option<i64>,
}

/// Subscriber panel of the show page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberPanelQuery {
    #[serde(default, deserialize_with = "lenient_text")]
    pub subscriber_search: Option<String>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub subscribers_page: Option<i64>,
}

/// The two pages of the list_subscribers screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberListQuery {
    #[serde(default, deserialize_with = "lenient_page")]
    pub subscribed_subscribers_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_page")]
    pub unsubscribed_subscribers_page: Option<i64>,
}

/// Accept strings, numbers and booleans as text.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Page numbers that do not parse read as absent.
pub fn lenient_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.and_then(|text| text.trim().parse::<i64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_form_accepts_json_scalars() {
        let form: ChannelForm = serde_json::from_value(json!({
            "name": "Tips",
            "type": "OrderedMessagesChannel",
            "active": false,
            "channel_group_id": 7
        }))
        .unwrap();

        assert_eq!(form.name.as_deref(), Some("Tips"));
        assert_eq!(form.kind.as_deref(), Some("OrderedMessagesChannel"));
        assert_eq!(form.active.as_deref(), Some("false"));
        assert_eq!(form.channel_group_id.as_deref(), Some("7"));
        assert!(form.keyword.is_none());
    }

    #[test]
    fn test_garbage_page_reads_as_absent() {
        let query: MessageQuery =
            serde_json::from_value(json!({"messages_page": "abc", "message_type": "All"})).unwrap();
        assert_eq!(query.messages_page, None);

        let query: MessageQuery = serde_json::from_value(json!({"messages_page": "3"})).unwrap();
        assert_eq!(query.messages_page, Some(3));
    }
}
