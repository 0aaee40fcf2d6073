use crate::domain::RawItem;
use crate::errors::BotResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Fetch a feed and return its items in source order.
    fn fetch(&self, url: &str) -> BotResult<Vec<RawItem>>;
}
