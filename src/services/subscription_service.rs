use tracing::info;
use url::Url;

use crate::domain::{Subscription, SubscriptionFilter};
use crate::errors::{BotError, BotResult};
use crate::storage::traits::SubscriptionRepository;

pub struct SubscriptionService<R: SubscriptionRepository> {
    repository: R,
}

/// Accept only absolute http(s) URLs, normalized by the parser.
pub fn validate_feed_url(raw: &str) -> BotResult<String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| BotError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(BotError::InvalidUrl(raw.to_string())),
    }
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Subscribe a channel to a feed
    pub fn subscribe(&self, channel_id: &str, url: &str) -> BotResult<Subscription> {
        if channel_id.trim().is_empty() {
            return Err(BotError::InvalidInput("Channel id must not be empty".to_string()));
        }

        let feed_url = validate_feed_url(url)?;

        let filter = SubscriptionFilter::by_channel(channel_id).with_feed_url(&feed_url);
        if !self.repository.find_by_model(&filter)?.is_empty() {
            return Err(BotError::SubscriptionExists(feed_url));
        }

        let subscription = Subscription::new(channel_id.to_string(), feed_url);
        let id = self.repository.create(&subscription)?;

        info!(id, channel_id, feed_url = %subscription.feed_url, "subscribed");

        Ok(Subscription {
            id: Some(id),
            ..subscription
        })
    }

    /// List subscriptions, optionally only those of one channel
    pub fn list(&self, channel_id: Option<&str>) -> BotResult<Vec<Subscription>> {
        match channel_id {
            Some(channel_id) => self
                .repository
                .find_by_model(&SubscriptionFilter::by_channel(channel_id)),
            None => self.repository.find_all(),
        }
    }

    /// Remove a subscription by id, optionally only if it belongs to `channel_id`
    pub fn unsubscribe(&self, id: i64, channel_id: Option<&str>) -> BotResult<()> {
        let filter = match channel_id {
            Some(channel_id) => SubscriptionFilter::by_channel(channel_id).with_id(id),
            None => SubscriptionFilter::default().with_id(id),
        };

        self.repository.delete(&filter)?;
        info!(id, "unsubscribed");
        Ok(())
    }
}
