use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A binding of a chat channel to a feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Option<i64>,
    pub channel_id: String,
    pub feed_url: String,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(channel_id: String, feed_url: String) -> Self {
        Self {
            id: None,
            channel_id,
            feed_url,
            created_at: Utc::now(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Criteria for looking up or deleting subscriptions. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub id: Option<i64>,
    pub channel_id: Option<String>,
    pub feed_url: Option<String>,
}

impl SubscriptionFilter {
    pub fn by_channel(channel_id: &str) -> Self {
        Self {
            channel_id: Some(channel_id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_feed_url(mut self, feed_url: &str) -> Self {
        self.feed_url = Some(feed_url.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.channel_id.is_none() && self.feed_url.is_none()
    }
}
