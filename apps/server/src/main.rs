use anyhow::Context;
use channeldesk_channels::{ChannelForm, ChannelService, MembershipService, MessageService};
use channeldesk_config::{load as load_config, AppConfig};
use channeldesk_database::{
    CreateChannelGroupRequest, CreateMessageRequest, CreateSubscriberRequest, MessageKind,
    SubscriberRepository,
};
use channeldesk_gateway::{create_router, GatewayState};
use channeldesk_runtime::{telemetry, BackendServices};
use clap::{Parser, Subcommand};
use sqlx::Row;
use tokio::net::TcpListener;
use tracing::info;

const DEMO_EMAIL: &str = "demo@example.com";

#[derive(Parser)]
#[command(name = "channeldesk-backend")]
#[command(about = "Channeldesk backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print channels, memberships and the activity log
    DumpData,
    /// Delete every channel together with its messages and memberships
    ClearData,
    /// Seed the database with a demo user and sample channels
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config).await,
        Commands::DumpData => dump_data(&config).await,
        Commands::ClearData => clear_data(&config).await,
        Commands::SeedData => seed_data(&config).await,
    }
}

async fn initialise(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    info!("starting Channeldesk backend");

    let services = initialise(config).await?;

    let state = GatewayState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        &config.auth,
    )
    .context("failed to build gateway state")?;
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(channeldesk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data(config: &AppConfig) -> anyhow::Result<()> {
    let services = initialise(config).await?;
    let pool = &services.db_pool;

    let channels = ChannelService::new(pool.clone())
        .list_all()
        .await
        .context("failed to fetch channels")?;

    println!("=== CHANNELS ===");
    if channels.is_empty() {
        println!("No channels found in database");
    } else {
        println!("Found {} channels:", channels.len());
        println!(
            "{:<5} {:<8} {:<8} {:<30} {:<26} {:<8} {:<25}",
            "ID", "User ID", "Group", "Name", "Type", "Active", "Created At"
        );
        println!("{}", "-".repeat(115));

        for channel in channels {
            println!(
                "{:<5} {:<8} {:<8} {:<30} {:<26} {:<8} {:<25}",
                channel.id,
                channel.user_id,
                channel
                    .channel_group_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "NULL".to_string()),
                channel.name,
                channel.kind.as_str(),
                channel.active,
                channel.created_at.to_rfc3339()
            );
        }
    }

    println!("\n=== SUBSCRIPTIONS ===");
    let subscriptions = sqlx::query(
        r#"
        SELECT subscriptions.channel_id, subscriptions.subscriber_id, subscribers.name
        FROM subscriptions
        JOIN subscribers ON subscribers.id = subscriptions.subscriber_id
        ORDER BY subscriptions.channel_id ASC, subscribers.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch subscriptions")?;

    if subscriptions.is_empty() {
        println!("No subscriptions found in database");
    } else {
        println!("{:<12} {:<15} {:<30}", "Channel ID", "Subscriber ID", "Subscriber");
        println!("{}", "-".repeat(60));
        for row in subscriptions {
            let channel_id: i64 = row.try_get("channel_id")?;
            let subscriber_id: i64 = row.try_get("subscriber_id")?;
            let name: String = row.try_get("name")?;
            println!("{:<12} {:<15} {:<30}", channel_id, subscriber_id, name);
        }
    }

    println!("\n=== ACTIVITY ===");
    let activity = sqlx::query(
        r#"
        SELECT id, user_id, description, metadata, created_at
        FROM activity_logs
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch activity log")?;

    if activity.is_empty() {
        println!("No activity recorded");
    } else {
        println!(
            "{:<5} {:<8} {:<45} {:<20} {:<25}",
            "ID", "User ID", "Description", "Metadata", "Created At"
        );
        println!("{}", "-".repeat(110));
        for row in activity {
            let id: i64 = row.try_get("id")?;
            let user_id: i64 = row.try_get("user_id")?;
            let description: String = row.try_get("description")?;
            let metadata: String = row.try_get("metadata")?;
            let created_at: String = row.try_get("created_at")?;
            println!(
                "{:<5} {:<8} {:<45} {:<20} {:<25}",
                id, user_id, description, metadata, created_at
            );
        }
    }

    Ok(())
}

async fn clear_data(config: &AppConfig) -> anyhow::Result<()> {
    info!("clearing channel data from database");

    let services = initialise(config).await?;

    let channels_deleted = ChannelService::new(services.db_pool.clone())
        .delete_all()
        .await
        .context("failed to delete channels")?;

    let groups_deleted = sqlx::query("DELETE FROM channel_groups")
        .execute(&services.db_pool)
        .await
        .context("failed to delete channel groups")?;

    let subscribers_deleted = sqlx::query("DELETE FROM subscribers")
        .execute(&services.db_pool)
        .await
        .context("failed to delete subscribers")?;

    println!("Database cleared:");
    println!("- {} channels deleted", channels_deleted);
    println!("- {} channel groups deleted", groups_deleted.rows_affected());
    println!("- {} subscribers deleted", subscribers_deleted.rows_affected());

    Ok(())
}

async fn seed_data(config: &AppConfig) -> anyhow::Result<()> {
    info!("seeding database with demo data");

    let services = initialise(config).await?;
    let pool = services.db_pool.clone();

    let user = services
        .authenticator
        .ensure_user(DEMO_EMAIL, Some("Demo Owner"))
        .await
        .context("failed to create demo user")?;

    let channel_service = ChannelService::new(pool.clone());
    let group = channel_service
        .create_group(&CreateChannelGroupRequest::new(user.id, "Campaigns"))
        .await
        .context("failed to create channel group")?;

    let mut grouped = ChannelForm::named("Spring campaign", "AnnouncementsChannel");
    grouped.channel_group_id = Some(group.id.to_string());
    grouped.keyword = Some("spring".to_string());
    let spring = channel_service
        .create(user.id, &grouped)
        .await
        .context("failed to create grouped channel")?;

    let mut ordered = ChannelForm::named("Daily tips", "OnDemandMessagesChannel");
    ordered.description = Some("One tip a day".to_string());
    let tips = channel_service
        .create(user.id, &ordered)
        .await
        .context("failed to create channel")?;

    let message_service = MessageService::new(pool.clone());
    let samples = [
        (spring.id, MessageKind::SimpleMessage, "Spring sale starts Monday"),
        (spring.id, MessageKind::PollMessage, "Which colour should we stock?"),
        (tips.id, MessageKind::SimpleMessage, "Drink a glass of water"),
        (tips.id, MessageKind::ActionMessage, "Reply STOP to unsubscribe"),
        (tips.id, MessageKind::ResponseMessage, "How did today's tip work?"),
    ];
    for (seq_no, (channel_id, kind, caption)) in samples.into_iter().enumerate() {
        let mut request = CreateMessageRequest::new(channel_id, kind, caption);
        request.seq_no = i64::try_from(seq_no).ok();
        message_service
            .create(&request)
            .await
            .context("failed to create message")?;
    }

    let subscribers = SubscriberRepository::new(pool.clone());
    let membership = MembershipService::new(pool.clone());
    for (name, phone) in [("Ada", "+15550000001"), ("Grace", "+15550000002"), ("Linus", "+15550000003")] {
        let subscriber = subscribers
            .create(&CreateSubscriberRequest::new(user.id, name, phone))
            .await
            .context("failed to create subscriber")?;
        membership
            .add(user.id, &tips, &subscriber)
            .await
            .context("failed to subscribe")?;
    }

    let session = services
        .authenticator
        .issue_session(user.id)
        .await
        .context("failed to issue session")?;

    println!("Database seeded with demo data:");
    println!("- user {} (id {})", user.email, user.id);
    println!("- 1 channel group, 2 channels, {} messages, 3 subscribers", samples.len());
    println!("Session token (valid until {}):", session.expires_at.to_rfc3339());
    println!("{}", session.token);
    println!("Use it as 'Authorization: Bearer <token>' or the '{}' cookie", config.auth.session_cookie);

    Ok(())
}
