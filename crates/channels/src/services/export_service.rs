//! CSV export of channel messages.

use channeldesk_database::{Channel, Message};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::query::ListingMode;
use crate::services::{ActivityService, MessageService};
use crate::types::{ChannelResult, CsvDocument, MessageQuery};

pub const EXPORT_HEADER: [&str; 10] = [
    "id",
    "type",
    "seq_no",
    "title",
    "caption",
    "schedule",
    "target_time",
    "active",
    "requires_response",
    "created_at",
];

pub const REPORT_HEADER: [&str; 5] = ["message_id", "type", "caption", "target_time", "status"];

/// Service producing CSV downloads
#[derive(Clone)]
pub struct ExportService {
    messages: MessageService,
    activity: ActivityService,
}

impl ExportService {
    /// Create a new export service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            messages: MessageService::new(pool.clone()),
            activity: ActivityService::new(pool),
        }
    }

    /// Every message of the channel in its primary order. Recorded in the activity log.
    pub async fn export(
        &self,
        actor_id: i64,
        channel: &Channel,
        today: NaiveDate,
    ) -> ChannelResult<CsvDocument> {
        let messages = self.messages.in_channel_order(channel).await?;
        let body = export_csv(&messages)?;
        self.activity
            .record_channel(actor_id, "Exported messages in", channel)
            .await?;

        Ok(CsvDocument {
            filename: export_filename(channel.id, today),
            body,
        })
    }

    /// Messages in display order with their delivery status.
    pub async fn messages_report(&self, channel: &Channel, today: NaiveDate) -> ChannelResult<CsvDocument> {
        let listing = self
            .messages
            .listing(channel, &MessageQuery::default(), ListingMode::All)
            .await?;

        Ok(CsvDocument {
            filename: report_filename(channel.id, today),
            body: messages_report_csv(&listing.messages.items)?,
        })
    }
}

pub fn export_filename(channel_id: i64, date: NaiveDate) -> String {
    format!("channel-{}-messages-{}.csv", channel_id, date.format("%Y-%m-%d"))
}

pub fn report_filename(channel_id: i64, date: NaiveDate) -> String {
    format!("channel-{}-messages-report-{}.csv", channel_id, date.format("%Y-%m-%d"))
}

pub fn export_csv(messages: &[Message]) -> ChannelResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for message in messages {
        writer.write_record([
            message.id.to_string(),
            message.kind.to_string(),
            message.seq_no.map(|n| n.to_string()).unwrap_or_default(),
            message.title.clone().unwrap_or_default(),
            message.caption.clone().unwrap_or_default(),
            message.schedule.clone().unwrap_or_default(),
            message.target_time().map(timestamp).unwrap_or_default(),
            message.active.to_string(),
            message.requires_response.to_string(),
            timestamp(message.created_at),
        ])?;
    }

    finish(writer)
}

pub fn messages_report_csv(messages: &[Message]) -> ChannelResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;

    for message in messages {
        writer.write_record([
            message.id.to_string(),
            message.kind.to_string(),
            message.caption.clone().unwrap_or_default(),
            message.target_time().map(timestamp).unwrap_or_default(),
            if message.active { "active" } else { "inactive" }.to_string(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ChannelResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| crate::types::ChannelError::internal(format!("flushing csv: {}", e.error())))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use channeldesk_database::MessageKind;
    use chrono::TimeZone;

    fn message(id: i64, caption: &str, active: bool) -> Message {
        let created = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        Message {
            id,
            channel_id: 1,
            kind: MessageKind::SimpleMessage,
            title: None,
            caption: Some(caption.to_string()),
            seq_no: Some(id),
            schedule: Some("2024-03-01 10:00".into()),
            next_send_time: None,
            active,
            requires_response: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_filenames() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        assert_eq!(export_filename(12, date), "channel-12-messages-2024-07-09.csv");
        assert_eq!(report_filename(12, date), "channel-12-messages-report-2024-07-09.csv");
    }

    #[test]
    fn test_export_csv_rows() {
        let body = export_csv(&[message(1, "Hello, world", true)]).unwrap();
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("id,type,seq_no,title,caption,schedule,target_time,active,requires_response,created_at")
        );
        assert_eq!(
            lines.next(),
            Some("1,SimpleMessage,1,,\"Hello, world\",2024-03-01 10:00,2024-03-01T10:00:00Z,true,false,2024-02-03T04:05:06Z")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_report_status_column() {
        let body = messages_report_csv(&[message(1, "on", true), message(2, "off", false)]).unwrap();
        let text = String::from_utf8(body).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "message_id,type,caption,target_time,status");
        assert!(lines[1].ends_with(",active"));
        assert!(lines[2].ends_with(",inactive"));
    }
}
