use std::time::Duration;

use feed_rs::parser;
use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::RawItem;
use crate::errors::{BotError, BotResult};
use crate::sources::traits::FeedFetcher;

/// Fetches RSS, Atom and JSON feeds over HTTP.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> BotResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rss-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    fn fetch_and_parse(&self, url: &str) -> BotResult<feed_rs::model::Feed> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        Self::parse_bytes(&bytes)
    }

    fn parse_bytes(bytes: &[u8]) -> BotResult<feed_rs::model::Feed> {
        parser::parse(bytes).map_err(|e| BotError::FeedParse(e.to_string()))
    }

    fn items_from_feed(url: &str, feed: feed_rs::model::Feed) -> Vec<RawItem> {
        feed.entries
            .into_iter()
            .filter_map(|entry| {
                let Some(published_at) = entry.published.or(entry.updated) else {
                    debug!(feed_url = url, entry_id = %entry.id, "skipping entry without a date");
                    return None;
                };

                let title = entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled".to_string());

                let link = entry
                    .links
                    .into_iter()
                    .next()
                    .map(|l| l.href)
                    .unwrap_or(entry.id);

                Some(RawItem::new(title, link, published_at))
            })
            .collect()
    }

    /// Parse items from raw feed bytes (used for testing)
    #[cfg(test)]
    fn items_from_bytes(bytes: &[u8]) -> BotResult<Vec<RawItem>> {
        let feed = Self::parse_bytes(bytes)?;
        Ok(Self::items_from_feed("test", feed))
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, url: &str) -> BotResult<Vec<RawItem>> {
        let feed = self.fetch_and_parse(url)?;
        Ok(Self::items_from_feed(url, feed))
    }
}
