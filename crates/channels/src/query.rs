//! The message listing pipeline.
//!
//! Given the messages left after the search filter, counts them by type,
//! applies the type filter, orders them the way the channel's policy asks
//! and cuts out the requested page. Everything here is pure; loading is done
//! by [`MessageService`](crate::services::MessageService).

use channeldesk_database::{Message, MessageKind, Page};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;

use crate::types::MessageQuery;
use crate::utils::{ChannelPolicy, MessageOrder};

/// Rows per page on the show page.
pub const MESSAGES_PER_PAGE: u32 = 10;

/// The type filter value that selects every message.
pub const ALL_TYPES: &str = "All";

/// Whether the listing is cut into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Paged,
    /// Every message on one page, finally ordered by `seq_no`.
    All,
}

/// Message counts by type tag, `"All"` first, then each type with a
/// non-zero count in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTypeCounts(Vec<(&'static str, usize)>);

impl MessageTypeCounts {
    pub fn get(&self, tag: &str) -> Option<usize> {
        self.0.iter().find(|(t, _)| *t == tag).map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.get(ALL_TYPES).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().copied()
    }
}

impl Serialize for MessageTypeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tag, count) in &self.0 {
            map.serialize_entry(tag, count)?;
        }
        map.end()
    }
}

/// Parsed `message_type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Only(MessageKind),
    /// A tag that names no message type; matches nothing.
    Unknown,
}

impl TypeFilter {
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(str::trim).filter(|t| !t.is_empty()) {
            None | Some(ALL_TYPES) => TypeFilter::All,
            Some(tag) => tag
                .parse::<MessageKind>()
                .map(TypeFilter::Only)
                .unwrap_or(TypeFilter::Unknown),
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(kind) => message.kind == *kind,
            TypeFilter::Unknown => false,
        }
    }
}

/// One rendered view of a channel's messages.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageListing {
    pub messages: Page<Message>,
    pub counts: MessageTypeCounts,
    /// The selected type tag, `"All"` when unfiltered.
    pub message_type: String,
    pub message_search: Option<String>,
}

pub fn count_types(messages: &[Message]) -> MessageTypeCounts {
    let mut counts = vec![(ALL_TYPES, messages.len())];
    for kind in MessageKind::ALL {
        let n = messages.iter().filter(|m| m.kind == kind).count();
        if n > 0 {
            counts.push((kind.as_str(), n));
        }
    }
    MessageTypeCounts(counts)
}

/// Primary order, ties broken by id in the same direction.
pub fn sort_primary(messages: &mut [Message], order: MessageOrder) {
    match order {
        MessageOrder::SeqNoAscending => messages.sort_by(|a, b| {
            absent_last(a.seq_no, b.seq_no).then_with(|| a.id.cmp(&b.id))
        }),
        MessageOrder::CreatedAscending => {
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
        }
        MessageOrder::CreatedDescending => {
            messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)))
        }
    }
}

/// Stable sort by target time; messages without one keep their order at the end.
pub fn sort_by_target_time(messages: &mut [Message]) {
    messages.sort_by_cached_key(|m| {
        let target = m.target_time();
        (target.is_none(), target)
    });
}

/// Stable sort by `seq_no`, absent last.
pub fn sort_by_seq_no(messages: &mut [Message]) {
    messages.sort_by(|a, b| absent_last(a.seq_no, b.seq_no));
}

/// Cut out one page. Pages below 1 read as 1; pages past the end show the last page.
pub fn paginate(messages: Vec<Message>, requested: Option<i64>, per_page: u32) -> Page<Message> {
    let total = messages.len() as u64;
    let per_page = per_page.max(1);
    let last_page = total.div_ceil(u64::from(per_page)).max(1);
    let page = requested
        .unwrap_or(1)
        .clamp(1, i64::try_from(last_page).unwrap_or(i64::MAX));
    let page = u32::try_from(page).unwrap_or(u32::MAX);

    let skip = (page as usize - 1) * per_page as usize;
    let items = messages.into_iter().skip(skip).take(per_page as usize).collect();
    Page::new(items, page, per_page, total)
}

/// Run the pipeline over the post-search messages of one channel.
pub fn build_listing(
    policy: &ChannelPolicy,
    searched: Vec<Message>,
    query: &MessageQuery,
    mode: ListingMode,
) -> MessageListing {
    let counts = count_types(&searched);

    let filter = TypeFilter::parse(query.message_type.as_deref());
    let mut messages: Vec<Message> = searched.into_iter().filter(|m| filter.matches(m)).collect();

    sort_primary(&mut messages, policy.message_order());
    sort_by_target_time(&mut messages);

    let page = match mode {
        ListingMode::Paged => paginate(messages, query.messages_page, MESSAGES_PER_PAGE),
        ListingMode::All => {
            sort_by_seq_no(&mut messages);
            let total = messages.len();
            Page::new(messages, 1, u32::try_from(total).unwrap_or(u32::MAX), total as u64)
        }
    };

    MessageListing {
        messages: page,
        counts,
        message_type: query
            .message_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| ALL_TYPES.to_string()),
        message_search: query.message_search.clone().filter(|s| !s.trim().is_empty()),
    }
}

fn absent_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channeldesk_database::ChannelKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn message(id: i64, kind: MessageKind) -> Message {
        let created = base_time() + Duration::minutes(id);
        Message {
            id,
            channel_id: 1,
            kind,
            title: None,
            caption: Some(format!("message {id}")),
            seq_no: None,
            schedule: None,
            next_send_time: None,
            active: true,
            requires_response: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn ids(messages: &[Message]) -> Vec<i64> {
        messages.iter().map(|m| m.id).collect()
    }

    fn policy(kind: ChannelKind) -> ChannelPolicy {
        ChannelPolicy::new(kind, false)
    }

    #[test]
    fn test_counts_all_first_and_omit_zero_types() {
        let messages = vec![
            message(1, MessageKind::SimpleMessage),
            message(2, MessageKind::PollMessage),
            message(3, MessageKind::SimpleMessage),
        ];

        let counts = count_types(&messages);
        let tags: Vec<_> = counts.iter().collect();
        assert_eq!(
            tags,
            vec![("All", 3), ("PollMessage", 1), ("SimpleMessage", 2)]
        );
        assert_eq!(counts.get("TagMessage"), None);

        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"All":3,"PollMessage":1,"SimpleMessage":2}"#);
    }

    #[test]
    fn test_counts_for_empty_channel() {
        let counts = count_types(&[]);
        assert_eq!(counts.iter().collect::<Vec<_>>(), vec![("All", 0)]);
    }

    #[test]
    fn test_type_filter_keeps_counts_of_whole_set() {
        let messages = vec![
            message(1, MessageKind::SimpleMessage),
            message(2, MessageKind::SimpleMessage),
            message(3, MessageKind::PollMessage),
        ];
        let query = MessageQuery {
            message_type: Some("PollMessage".into()),
            ..MessageQuery::default()
        };

        let listing = build_listing(
            &policy(ChannelKind::RandomMessagesChannel),
            messages,
            &query,
            ListingMode::Paged,
        );

        assert_eq!(ids(&listing.messages.items), vec![3]);
        assert_eq!(listing.counts.get("All"), Some(3));
        assert_eq!(listing.counts.get("SimpleMessage"), Some(2));
        assert_eq!(listing.counts.get("PollMessage"), Some(1));
        assert_eq!(listing.message_type, "PollMessage");
    }

    #[test]
    fn test_unknown_type_yields_empty_listing() {
        let query = MessageQuery {
            message_type: Some("CarrierPigeon".into()),
            ..MessageQuery::default()
        };
        let listing = build_listing(
            &policy(ChannelKind::RandomMessagesChannel),
            vec![message(1, MessageKind::SimpleMessage)],
            &query,
            ListingMode::Paged,
        );
        assert!(listing.messages.items.is_empty());
        assert_eq!(listing.counts.total(), 1);
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let messages = vec![
            message(1, MessageKind::SimpleMessage),
            message(2, MessageKind::SimpleMessage),
            message(3, MessageKind::SimpleMessage),
        ];
        let listing = build_listing(
            &policy(ChannelKind::RandomMessagesChannel),
            messages,
            &MessageQuery::default(),
            ListingMode::Paged,
        );
        assert_eq!(ids(&listing.messages.items), vec![3, 2, 1]);
    }

    #[test]
    fn test_target_time_reorders_after_primary_order() {
        let mut early = message(1, MessageKind::SimpleMessage);
        early.next_send_time = Some(base_time() + Duration::days(2));
        let mut late = message(2, MessageKind::SimpleMessage);
        late.next_send_time = Some(base_time() + Duration::days(1));
        let unscheduled = message(3, MessageKind::SimpleMessage);

        let mut messages = vec![early, late, unscheduled];
        sort_primary(&mut messages, MessageOrder::CreatedDescending);
        assert_eq!(ids(&messages), vec![3, 2, 1]);

        sort_by_target_time(&mut messages);
        assert_eq!(ids(&messages), vec![2, 1, 3]);
    }

    #[test]
    fn test_target_time_ties_keep_primary_order() {
        let when = base_time() + Duration::days(1);
        let mut messages: Vec<Message> = (1..=3)
            .map(|id| {
                let mut m = message(id, MessageKind::SimpleMessage);
                m.next_send_time = Some(when);
                m
            })
            .collect();

        sort_primary(&mut messages, MessageOrder::CreatedAscending);
        sort_by_target_time(&mut messages);
        assert_eq!(ids(&messages), vec![1, 2, 3]);
    }

    #[test]
    fn test_sequenced_order_puts_missing_seq_no_last() {
        let mut first = message(1, MessageKind::SimpleMessage);
        first.seq_no = Some(2);
        let mut second = message(2, MessageKind::SimpleMessage);
        second.seq_no = Some(1);
        let loose = message(3, MessageKind::SimpleMessage);

        let mut messages = vec![loose, first, second];
        sort_primary(&mut messages, MessageOrder::SeqNoAscending);
        assert_eq!(ids(&messages), vec![2, 1, 3]);
    }

    #[test]
    fn test_individually_scheduled_order_is_oldest_first() {
        let listing = build_listing(
            &policy(ChannelKind::ScheduledMessagesChannel),
            vec![
                message(2, MessageKind::SimpleMessage),
                message(1, MessageKind::SimpleMessage),
            ],
            &MessageQuery::default(),
            ListingMode::Paged,
        );
        assert_eq!(ids(&listing.messages.items), vec![1, 2]);
    }

    #[test]
    fn test_pagination_clamps_page_numbers() {
        let messages: Vec<Message> = (1..=25).map(|id| message(id, MessageKind::SimpleMessage)).collect();

        let first = paginate(messages.clone(), Some(0), MESSAGES_PER_PAGE);
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), 10);

        let last = paginate(messages.clone(), Some(99), MESSAGES_PER_PAGE);
        assert_eq!(last.page, 3);
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.total_pages(), 3);

        let empty = paginate(Vec::new(), Some(4), MESSAGES_PER_PAGE);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_all_mode_is_unpaged_and_sorted_by_seq_no() {
        let messages: Vec<Message> = (1..=12)
            .map(|id| {
                let mut m = message(id, MessageKind::SimpleMessage);
                m.seq_no = if id == 5 { None } else { Some(100 - id) };
                m
            })
            .collect();

        let listing = build_listing(
            &policy(ChannelKind::RandomMessagesChannel),
            messages,
            &MessageQuery::default(),
            ListingMode::All,
        );

        assert_eq!(listing.messages.items.len(), 12);
        assert_eq!(listing.messages.total_pages(), 1);
        assert_eq!(listing.messages.items.first().map(|m| m.id), Some(12));
        assert_eq!(listing.messages.items.last().map(|m| m.id), Some(5));
    }
}
