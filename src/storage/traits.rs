use crate::domain::{FeedEntry, Subscription, SubscriptionFilter};
use crate::errors::BotResult;

#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionRepository: Send + Sync {
    fn create(&self, subscription: &Subscription) -> BotResult<i64>;
    fn find_all(&self) -> BotResult<Vec<Subscription>>;
    fn find_by_model(&self, filter: &SubscriptionFilter) -> BotResult<Vec<Subscription>>;
    /// Fails with `SubscriptionNotFound` when nothing matches the filter.
    fn delete(&self, filter: &SubscriptionFilter) -> BotResult<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait EntryRepository: Send + Sync {
    /// Insert all entries in one transaction and return them as stored.
    fn create(&self, entries: &[FeedEntry]) -> BotResult<Vec<FeedEntry>>;
    /// Stored entries sharing (feed url, link) with any of the candidates.
    fn find_by_candidates(&self, candidates: &[FeedEntry]) -> BotResult<Vec<FeedEntry>>;
}
