//! Periodic polling of all subscriptions.
//!
//! The scheduler owns the only writer of feed entries. Each tick runs on the blocking
//! pool and is awaited before the timer is polled again, so ticks never overlap.
//! Shutdown is observed between ticks only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::domain::{Notification, Subscription};
use crate::errors::{BotError, BotResult};
use crate::services::{EntryDetector, NotificationSink};
use crate::sources::FeedFetcher;
use crate::storage::traits::{EntryRepository, SubscriptionRepository};

pub enum SchedulerMessage {
    Shutdown,
}

/// Handle for stopping a running scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SchedulerHandle {
    pub fn channel() -> (Self, mpsc::Receiver<SchedulerMessage>) {
        let (sender, receiver) = mpsc::channel(8);
        (Self { sender }, receiver)
    }

    /// Ask the scheduler to stop after the tick in progress, if any
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerMessage::Shutdown).await;
    }
}

/// Counts from a single polling pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub subscriptions: usize,
    pub new_entries: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Set when stored entries could not be looked up and nothing was detected.
    pub skipped: bool,
}

pub struct PollingScheduler<S, F, E, N>
where
    S: SubscriptionRepository,
    F: FeedFetcher,
    E: EntryRepository,
    N: NotificationSink,
{
    subscriptions: S,
    detector: EntryDetector<F, E>,
    sink: N,
    interval: Duration,
}

impl<S, F, E, N> PollingScheduler<S, F, E, N>
where
    S: SubscriptionRepository,
    F: FeedFetcher,
    E: EntryRepository,
    N: NotificationSink,
{
    pub fn new(subscriptions: S, detector: EntryDetector<F, E>, sink: N, interval: Duration) -> Self {
        Self {
            subscriptions,
            detector,
            sink,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One polling pass: detect new entries and notify every subscribed channel.
    ///
    /// Only a failure to list subscriptions is returned as an error.
    pub fn tick(&self) -> BotResult<TickReport> {
        let subscriptions = self.subscriptions.find_all()?;
        let mut report = TickReport {
            subscriptions: subscriptions.len(),
            ..Default::default()
        };

        let new_entries = match self.detector.check_new_entries(&subscriptions) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "failed to look up stored entries, skipping tick");
                report.skipped = true;
                return Ok(report);
            }
        };
        report.new_entries = new_entries.len();

        let mut by_feed: HashMap<&str, Vec<&Subscription>> = HashMap::new();
        for subscription in &subscriptions {
            by_feed
                .entry(subscription.feed_url.as_str())
                .or_default()
                .push(subscription);
        }

        for entry in &new_entries {
            let Some(subscribers) = by_feed.get(entry.feed_url.as_str()) else {
                continue;
            };

            for subscription in subscribers {
                let notification = Notification::from_entry(&subscription.channel_id, entry);

                match self.sink.send(&notification) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        error!(
                            channel_id = %subscription.channel_id,
                            entry_link = %entry.entry_link,
                            error = %e,
                            "failed to send notification"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        debug!(?report, "tick complete");
        Ok(report)
    }
}

impl<S, F, E, N> PollingScheduler<S, F, E, N>
where
    S: SubscriptionRepository + 'static,
    F: FeedFetcher + 'static,
    E: EntryRepository + 'static,
    N: NotificationSink + 'static,
{
    /// Poll until shut down. The first tick fires one interval after start.
    ///
    /// Returns the error if subscriptions cannot be listed; the polling task ends then.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<SchedulerMessage>) -> BotResult<()> {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip first tick (immediate)
        timer.tick().await;

        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                biased;

                msg = receiver.recv() => {
                    match msg {
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!("scheduler stopped");
                            return Ok(());
                        }
                    }
                }
                _ = timer.tick() => {
                    let scheduler = Arc::clone(&self);
                    let outcome = tokio::task::spawn_blocking(move || scheduler.tick())
                        .await
                        .map_err(|e| BotError::Scheduler(e.to_string()))?;

                    match outcome {
                        Ok(report) => info!(
                            subscriptions = report.subscriptions,
                            new_entries = report.new_entries,
                            delivered = report.delivered,
                            failed = report.failed,
                            skipped = report.skipped,
                            "polled feeds"
                        ),
                        Err(e) => {
                            error!(error = %e, "failed to list subscriptions, stopping scheduler");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}
