use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rss_bot::cli::{Cli, Commands};
use rss_bot::config::Config;
use rss_bot::domain::{Notification, Subscription};
use rss_bot::errors::{BotError, BotResult};
use rss_bot::scheduler::{PollingScheduler, SchedulerHandle};
use rss_bot::services::{
    ChatNotificationService, ConsoleNotificationService, EntryDetector, NotificationSink,
    SubscriptionService,
};
use rss_bot::sources::HttpFeedFetcher;
use rss_bot::storage::sqlite::{SqliteEntryRepository, SqliteStorage, SqliteSubscriptionRepository};

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path))?;

    match cli.command {
        Commands::Subscribe { channel, url } => cmd_subscribe(&channel, &url, storage)?,
        Commands::List { channel } => cmd_list(channel.as_deref(), storage)?,
        Commands::Unsubscribe { id, channel } => cmd_unsubscribe(id, channel.as_deref(), storage)?,
        Commands::Check { url, channel } => cmd_check(&url, channel.as_deref(), storage, &config)?,
        Commands::Run { dry_run, once } => cmd_run(storage, &config, dry_run, once)?,
    }

    Ok(())
}

fn cmd_subscribe(channel: &str, url: &str, storage: SqliteStorage) -> BotResult<()> {
    let service = SubscriptionService::new(SqliteSubscriptionRepository::new(storage));

    match service.subscribe(channel, url) {
        Ok(subscription) => {
            println!("Successfully subscribed to RSS feed: {}", subscription.feed_url);
            println!("  ID: {}", subscription.id.unwrap_or_default());
            println!("  Channel: {}", subscription.channel_id);
            Ok(())
        }
        Err(BotError::InvalidUrl(_)) => {
            println!("Invalid URL.");
            Ok(())
        }
        Err(BotError::SubscriptionExists(url)) => {
            println!("Channel {} is already subscribed to {}", channel, url);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_list(channel: Option<&str>, storage: SqliteStorage) -> BotResult<()> {
    let service = SubscriptionService::new(SqliteSubscriptionRepository::new(storage));
    let subscriptions = service.list(channel)?;

    if subscriptions.is_empty() {
        println!("No subscriptions configured.");
        return Ok(());
    }

    println!("Subscribed RSS feeds:\n");
    println!("  {:>4}  {:<20}  {}", "ID", "CHANNEL", "RSS URL");
    for subscription in subscriptions {
        println!(
            "  {:>4}  {:<20}  {}",
            subscription.id.unwrap_or_default(),
            subscription.channel_id,
            subscription.feed_url
        );
    }

    Ok(())
}

fn cmd_unsubscribe(id: i64, channel: Option<&str>, storage: SqliteStorage) -> BotResult<()> {
    let service = SubscriptionService::new(SqliteSubscriptionRepository::new(storage));
    service.unsubscribe(id, channel)?;
    println!("Successfully deleted subscription {}.", id);
    Ok(())
}

fn cmd_check(
    url: &str,
    channel: Option<&str>,
    storage: SqliteStorage,
    config: &Config,
) -> BotResult<()> {
    let feed_url = match rss_bot::services::subscription_service::validate_feed_url(url) {
        Ok(feed_url) => feed_url,
        Err(_) => {
            println!("Invalid URL.");
            return Ok(());
        }
    };

    let fetcher = HttpFeedFetcher::new(config.fetch_timeout)?;
    let detector = EntryDetector::new(fetcher, SqliteEntryRepository::new(storage));
    let probe = Subscription::new(channel.unwrap_or_default().to_string(), feed_url);

    let Some(entry) = detector.check(&probe) else {
        println!("No new entries.");
        return Ok(());
    };

    println!("New entry found.");
    println!("  Title: {}", entry.entry_title);
    println!("  Link: {}", entry.entry_link);
    println!("  Published: {}", entry.published_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(channel) = channel {
        let sink = ChatNotificationService::new(config)?;
        if let Err(e) = sink.send(&Notification::from_entry(channel, &entry)) {
            error!(channel_id = channel, error = %e, "failed to send notification");
        }
    }

    Ok(())
}

fn cmd_run(storage: SqliteStorage, config: &Config, dry_run: bool, once: bool) -> anyhow::Result<()> {
    if dry_run {
        run_scheduler(storage, config, ConsoleNotificationService, once)
    } else {
        let sink = ChatNotificationService::new(config)?;
        run_scheduler(storage, config, sink, once)
    }
}

fn run_scheduler<N: NotificationSink + 'static>(
    storage: SqliteStorage,
    config: &Config,
    sink: N,
    once: bool,
) -> anyhow::Result<()> {
    // Blocking HTTP clients are built here, outside the async runtime
    let fetcher = HttpFeedFetcher::new(config.fetch_timeout)?;
    let detector = EntryDetector::new(fetcher, SqliteEntryRepository::new(storage.clone()));
    let scheduler = Arc::new(PollingScheduler::new(
        SqliteSubscriptionRepository::new(storage),
        detector,
        sink,
        config.poll_interval,
    ));

    if once {
        let report = scheduler.tick()?;
        if report.skipped {
            anyhow::bail!(
                "stored entries could not be looked up, polling pass over {} subscriptions skipped",
                report.subscriptions
            );
        }
        println!(
            "Checked {} subscriptions, found {} new entries.",
            report.subscriptions, report.new_entries
        );
        if report.failed > 0 {
            println!("Failed to deliver {} notifications.", report.failed);
        }
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    println!(
        "Polling every {} seconds. Press Ctrl-C to exit.",
        scheduler.interval().as_secs()
    );

    let result = runtime.block_on(async {
        let (handle, receiver) = SchedulerHandle::channel();

        let interrupt = handle.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, shutting down");
                    interrupt.shutdown().await;
                }
                Err(e) => error!(error = %e, "failed to listen for interrupt signal"),
            }
        });

        // Holding a sender keeps the scheduler alive if the signal listener gives up
        let result = Arc::clone(&scheduler).run(receiver).await;
        drop(handle);
        result
    });

    // Last reference to the blocking clients is dropped outside the runtime
    drop(runtime);
    drop(scheduler);

    result.context("polling stopped")
}
