//! Integration tests for the channels crate.

use channeldesk_channels::{
    ActivityService, ChannelError, ChannelForm, ChannelIndexQuery, ChannelService, ExportService,
    ListingMode, MembershipOutcome, MembershipService, MessageQuery, MessageService,
};
use channeldesk_database::{
    Channel, CreateChannelGroupRequest, CreateMessageRequest, CreateSubscriberRequest, MessageKind,
    Subscriber, SubscriberRepository, MIGRATOR,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    user_id: i64,
    channels: ChannelService,
    messages: MessageService,
    memberships: MembershipService,
    activity: ActivityService,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_url = format!("sqlite://{}", temp_dir.path().join("channels.sqlite").display());
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(StdDuration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        MIGRATOR.run(&pool).await?;

        let user_id = insert_user(&pool, "owner@example.com").await?;

        Ok(Self {
            channels: ChannelService::new(pool.clone()),
            messages: MessageService::new(pool.clone()),
            memberships: MembershipService::new(pool.clone()),
            activity: ActivityService::new(pool.clone()),
            pool,
            user_id,
            _temp_dir: temp_dir,
        })
    }

    async fn channel(&self, name: &str, kind: &str) -> TestResult<Channel> {
        Ok(self
            .channels
            .create(self.user_id, &ChannelForm::named(name, kind))
            .await?)
    }

    async fn subscriber(&self, name: &str) -> TestResult<Subscriber> {
        Ok(SubscriberRepository::new(self.pool.clone())
            .create(&CreateSubscriberRequest::new(self.user_id, name, "+15550100000"))
            .await?)
    }

    async fn message(&self, channel: &Channel, kind: MessageKind, minutes: i64) -> TestResult<i64> {
        let mut request = CreateMessageRequest::new(channel.id, kind, format!("caption {minutes}"));
        request.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes));
        Ok(self.messages.create(&request).await?.id)
    }

    async fn activity_count(&self, prefix: &str) -> TestResult<usize> {
        Ok(self
            .activity
            .recent(self.user_id, 100)
            .await?
            .iter()
            .filter(|log| log.description.starts_with(prefix))
            .count())
    }
}

async fn insert_user(pool: &SqlitePool, email: &str) -> TestResult<i64> {
    let now = Utc::now();
    let id = sqlx::query("INSERT INTO users (email, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?
        .last_insert_rowid();
    Ok(id)
}

#[tokio::test]
async fn default_view_lists_newest_first() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Tips", "RandomMessagesChannel").await?;

    let mut ids = Vec::new();
    for minutes in 0..3 {
        ids.push(ctx.message(&channel, MessageKind::SimpleMessage, minutes).await?);
    }

    let listing = ctx
        .messages
        .listing(&channel, &MessageQuery::default(), ListingMode::Paged)
        .await?;
    let shown: Vec<i64> = listing.messages.items.iter().map(|m| m.id).collect();

    assert_eq!(shown, vec![ids[2], ids[1], ids[0]]);
    Ok(())
}

#[tokio::test]
async fn type_filter_keeps_full_counts() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Tips", "RandomMessagesChannel").await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 0).await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 1).await?;
    ctx.message(&channel, MessageKind::PollMessage, 2).await?;

    let query = MessageQuery {
        message_type: Some("PollMessage".into()),
        ..MessageQuery::default()
    };
    let listing = ctx.messages.listing(&channel, &query, ListingMode::Paged).await?;

    assert_eq!(listing.messages.items.len(), 1);
    assert_eq!(
        serde_json::to_value(&listing.counts)?,
        serde_json::json!({"All": 3, "SimpleMessage": 2, "PollMessage": 1})
    );
    Ok(())
}

#[tokio::test]
async fn search_narrows_before_counting() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Tips", "RandomMessagesChannel").await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 0).await?;
    ctx.message(&channel, MessageKind::PollMessage, 1).await?;

    let query = MessageQuery {
        message_search: Some("CAPTION 1".into()),
        ..MessageQuery::default()
    };
    let listing = ctx.messages.listing(&channel, &query, ListingMode::Paged).await?;

    assert_eq!(listing.messages.items.len(), 1);
    assert_eq!(listing.counts.total(), 1);
    assert_eq!(listing.counts.get("PollMessage"), Some(1));
    assert_eq!(listing.counts.get("SimpleMessage"), None);
    Ok(())
}

#[tokio::test]
async fn empty_channel_listing() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Quiet", "OrderedMessagesChannel").await?;

    let listing = ctx
        .messages
        .listing(&channel, &MessageQuery::default(), ListingMode::Paged)
        .await?;

    assert!(listing.messages.items.is_empty());
    assert_eq!(serde_json::to_value(&listing.counts)?, serde_json::json!({"All": 0}));
    Ok(())
}

#[tokio::test]
async fn add_twice_is_idempotent_and_logged_once() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("News", "AnnouncementsChannel").await?;
    let subscriber = ctx.subscriber("Ada").await?;

    let first = ctx.memberships.add(ctx.user_id, &channel, &subscriber).await?;
    let second = ctx.memberships.add(ctx.user_id, &channel, &subscriber).await?;

    assert_eq!(first, MembershipOutcome::Added);
    assert_eq!(second, MembershipOutcome::AlreadyMember);
    assert_eq!(ctx.memberships.subscriber_count(&channel).await?, 1);
    assert_eq!(ctx.activity_count("Added subscriber").await?, 1);

    let logs = ctx.activity.recent(ctx.user_id, 1).await?;
    assert_eq!(
        logs[0].description,
        format!("Added subscriber {}-Ada to {}-News", subscriber.id, channel.id)
    );
    assert_eq!(logs[0].metadata["subscriber_id"], subscriber.id);
    Ok(())
}

#[tokio::test]
async fn remove_non_member_changes_nothing() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("News", "AnnouncementsChannel").await?;
    let subscriber = ctx.subscriber("Ada").await?;

    let outcome = ctx.memberships.remove(ctx.user_id, &channel, &subscriber).await?;

    assert_eq!(outcome, MembershipOutcome::NotMember);
    assert_eq!(ctx.activity_count("Removed subscriber").await?, 0);

    ctx.memberships.add(ctx.user_id, &channel, &subscriber).await?;
    let outcome = ctx.memberships.remove(ctx.user_id, &channel, &subscriber).await?;
    assert_eq!(outcome, MembershipOutcome::Removed);
    assert_eq!(ctx.memberships.subscriber_count(&channel).await?, 0);
    Ok(())
}

#[tokio::test]
async fn group_constraint_rejects_second_channel_in_group() -> TestResult {
    let ctx = TestContext::new().await?;
    let group = ctx
        .channels
        .create_group(&CreateChannelGroupRequest::new(ctx.user_id, "Programs"))
        .await?;

    let mut form_a = ChannelForm::named("A", "OrderedMessagesChannel");
    form_a.channel_group_id = Some(group.id.to_string());
    let channel_a = ctx.channels.create(ctx.user_id, &form_a).await?;
    let mut form_b = ChannelForm::named("B", "OrderedMessagesChannel");
    form_b.channel_group_id = Some(group.id.to_string());
    let channel_b = ctx.channels.create(ctx.user_id, &form_b).await?;
    let outside = ctx.channel("C", "OrderedMessagesChannel").await?;

    let subscriber = ctx.subscriber("Ada").await?;

    assert_eq!(
        ctx.memberships.add(ctx.user_id, &channel_a, &subscriber).await?,
        MembershipOutcome::Added
    );
    assert_eq!(
        ctx.memberships.add(ctx.user_id, &channel_b, &subscriber).await?,
        MembershipOutcome::RejectedByGroupConstraint
    );
    assert_eq!(
        ctx.memberships.add(ctx.user_id, &outside, &subscriber).await?,
        MembershipOutcome::Added
    );
    Ok(())
}

async fn concurrent_adds(ctx: &TestContext, targets: &[Channel], subscriber: &Subscriber) -> TestResult<Vec<MembershipOutcome>> {
    let handles: Vec<_> = targets
        .iter()
        .cloned()
        .map(|channel| {
            let memberships = MembershipService::new(ctx.pool.clone());
            let subscriber = subscriber.clone();
            let user_id = ctx.user_id;
            tokio::spawn(async move { memberships.add(user_id, &channel, &subscriber).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await??);
    }
    Ok(outcomes)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_within_a_group_return_outcomes() -> TestResult {
    let ctx = TestContext::new().await?;
    let group = ctx
        .channels
        .create_group(&CreateChannelGroupRequest::new(ctx.user_id, "Programs"))
        .await?;

    let mut grouped = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let mut form = ChannelForm::named(name, "OrderedMessagesChannel");
        form.channel_group_id = Some(group.id.to_string());
        grouped.push(ctx.channels.create(ctx.user_id, &form).await?);
    }

    for round in 0..10 {
        let subscriber = ctx.subscriber(&format!("Ada {round}")).await?;
        let outcomes = concurrent_adds(&ctx, &grouped, &subscriber).await?;

        let added = outcomes.iter().filter(|o| **o == MembershipOutcome::Added).count();
        assert_eq!(added, 1, "round {round}: {outcomes:?}");
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, MembershipOutcome::Added | MembershipOutcome::RejectedByGroupConstraint)));

        let mut memberships = 0;
        for channel in &grouped {
            memberships += ctx.memberships.subscriber_count(channel).await?;
        }
        assert_eq!(memberships, 1);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_double_submit_reports_already_member() -> TestResult {
    let ctx = TestContext::new().await?;
    let group = ctx
        .channels
        .create_group(&CreateChannelGroupRequest::new(ctx.user_id, "Programs"))
        .await?;
    let mut form = ChannelForm::named("A", "OrderedMessagesChannel");
    form.channel_group_id = Some(group.id.to_string());
    let channel = ctx.channels.create(ctx.user_id, &form).await?;

    for round in 0..10 {
        let subscriber = ctx.subscriber(&format!("Grace {round}")).await?;
        let targets = vec![channel.clone(); 4];
        let outcomes = concurrent_adds(&ctx, &targets, &subscriber).await?;

        let added = outcomes.iter().filter(|o| **o == MembershipOutcome::Added).count();
        assert_eq!(added, 1, "round {round}: {outcomes:?}");
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, MembershipOutcome::Added | MembershipOutcome::AlreadyMember)));
    }
    assert_eq!(ctx.memberships.subscriber_count(&channel).await?, 10);
    Ok(())
}

#[tokio::test]
async fn foreign_group_is_access_denied() -> TestResult {
    let ctx = TestContext::new().await?;
    let stranger = insert_user(&ctx.pool, "stranger@example.com").await?;
    let group = ctx
        .channels
        .create_group(&CreateChannelGroupRequest::new(stranger, "Theirs"))
        .await?;

    let mut form = ChannelForm::named("Mine", "OrderedMessagesChannel");
    form.channel_group_id = Some(group.id.to_string());
    let err = ctx.channels.create(ctx.user_id, &form).await.unwrap_err();

    assert!(matches!(err, ChannelError::AccessDenied));
    Ok(())
}

#[tokio::test]
async fn invalid_channel_is_not_saved() -> TestResult {
    let ctx = TestContext::new().await?;

    let err = ctx
        .channels
        .create(ctx.user_id, &ChannelForm::named("  ", "OrderedMessagesChannel"))
        .await
        .unwrap_err();

    match err {
        ChannelError::Validation(errors) => assert_eq!(errors.to_sentence(), "Name can't be blank"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let index = ctx
        .channels
        .index(ctx.user_id, &ChannelIndexQuery::default())
        .await?;
    assert_eq!(index.channels.total_entries, 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_keyword_pair_is_rejected() -> TestResult {
    let ctx = TestContext::new().await?;
    let mut form = ChannelForm::named("Quit", "OnDemandMessagesChannel");
    form.keyword = Some("quit".into());
    form.tparty_keyword = Some("+14084084080".into());
    let first = ctx.channels.create(ctx.user_id, &form).await?;

    form.name = Some("Quit again".into());
    let err = ctx.channels.create(ctx.user_id, &form).await.unwrap_err();
    assert!(matches!(err, ChannelError::Validation(ref e) if e.on("keyword") == vec!["has already been taken"]));

    let renamed = ctx
        .channels
        .update(ctx.user_id, first.id, &ChannelForm::named("Quit now", "OnDemandMessagesChannel"))
        .await?;
    assert_eq!(renamed.keyword.as_deref(), Some("quit"));
    Ok(())
}

#[tokio::test]
async fn update_through_foreign_owner_is_denied() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Mine", "OrderedMessagesChannel").await?;
    let stranger = insert_user(&ctx.pool, "stranger@example.com").await?;

    let err = ctx
        .channels
        .update(stranger, channel.id, &ChannelForm::named("Theirs", "OrderedMessagesChannel"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChannelError::AccessDenied));

    let unchanged = ctx.channels.find_owned(ctx.user_id, channel.id).await?;
    assert_eq!(unchanged.map(|c| c.name), Some("Mine".to_string()));
    Ok(())
}

#[tokio::test]
async fn lifecycle_is_audit_logged() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Tips", "OrderedMessagesChannel").await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 0).await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 1).await?;

    let deleted = ctx.messages.delete_all(ctx.user_id, &channel).await?;
    assert_eq!(deleted, 2);
    let listing = ctx
        .messages
        .listing(&channel, &MessageQuery::default(), ListingMode::All)
        .await?;
    assert!(listing.messages.items.is_empty());

    ctx.channels.destroy(ctx.user_id, &channel).await?;
    assert!(ctx.channels.find_owned(ctx.user_id, channel.id).await?.is_none());

    assert_eq!(ctx.activity_count("Created channel").await?, 1);
    assert_eq!(ctx.activity_count("Deleted all messages in").await?, 1);
    assert_eq!(ctx.activity_count("Destroyed channel").await?, 1);
    Ok(())
}

#[tokio::test]
async fn export_writes_csv_and_logs() -> TestResult {
    let ctx = TestContext::new().await?;
    let channel = ctx.channel("Tips", "OrderedMessagesChannel").await?;
    ctx.message(&channel, MessageKind::SimpleMessage, 0).await?;

    let export = ExportService::new(ctx.pool.clone());
    let today = NaiveDate::from_ymd_opt(2024, 5, 6).ok_or("bad date")?;
    let document = export.export(ctx.user_id, &channel, today).await?;

    assert_eq!(
        document.filename,
        format!("channel-{}-messages-2024-05-06.csv", channel.id)
    );
    let text = String::from_utf8(document.body)?;
    assert_eq!(text.lines().count(), 2);
    assert_eq!(ctx.activity_count("Exported messages in").await?, 1);

    let report = export.messages_report(&channel, today).await?;
    assert!(String::from_utf8(report.body)?.starts_with("message_id,type,caption,target_time,status"));
    Ok(())
}
