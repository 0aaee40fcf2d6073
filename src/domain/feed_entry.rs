use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item as returned by a feed fetcher, before it is tied to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl RawItem {
    pub fn new(title: String, link: String, published_at: DateTime<Utc>) -> Self {
        Self {
            title,
            link,
            published_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: Option<i64>,
    pub feed_url: String,
    pub entry_title: String,
    pub entry_link: String,
    pub published_at: DateTime<Utc>,
    /// Set by the store when the entry is persisted.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn from_item(feed_url: &str, item: RawItem) -> Self {
        Self {
            id: None,
            feed_url: feed_url.to_string(),
            entry_title: item.title,
            entry_link: item.link,
            published_at: item.published_at,
            recorded_at: None,
        }
    }

    /// Identity of an entry for deduplication: the link, scoped to its feed.
    pub fn identity(&self) -> (&str, &str) {
        (&self.feed_url, &self.entry_link)
    }
}
