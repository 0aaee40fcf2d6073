use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::domain::{FeedEntry, Subscription};
use crate::errors::BotResult;
use crate::sources::FeedFetcher;
use crate::storage::traits::EntryRepository;

/// Finds entries that have not been seen before and records them.
pub struct EntryDetector<F: FeedFetcher, E: EntryRepository> {
    fetcher: F,
    entry_repository: E,
}

impl<F: FeedFetcher, E: EntryRepository> EntryDetector<F, E> {
    pub fn new(fetcher: F, entry_repository: E) -> Self {
        Self {
            fetcher,
            entry_repository,
        }
    }

    /// Manual probe: the first item of the subscription's feed, as-is.
    ///
    /// Ignores the subscription date and never touches the store.
    pub fn check(&self, subscription: &Subscription) -> Option<FeedEntry> {
        if subscription.feed_url.is_empty() {
            return None;
        }

        let items = match self.fetcher.fetch(&subscription.feed_url) {
            Ok(items) => items,
            Err(e) => {
                warn!(feed_url = %subscription.feed_url, error = %e, "failed to fetch feed");
                return None;
            }
        };

        items
            .into_iter()
            .next()
            .map(|item| FeedEntry::from_item(&subscription.feed_url, item))
    }

    /// Fetch every subscription, keep entries not already stored, persist and return them.
    ///
    /// A failed fetch only skips that subscription. A failed lookup is returned as an
    /// error; a failed write is logged and yields no entries, so the next run retries them.
    pub fn check_new_entries(&self, subscriptions: &[Subscription]) -> BotResult<Vec<FeedEntry>> {
        if subscriptions.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.collect_candidates(subscriptions);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.entry_repository.find_by_candidates(&candidates)?;
        let new_entries = unique(difference(candidates, &existing));

        if new_entries.is_empty() {
            debug!("no new entries");
            return Ok(Vec::new());
        }

        match self.entry_repository.create(&new_entries) {
            Ok(stored) => {
                info!(count = stored.len(), "recorded new entries");
                Ok(stored)
            }
            Err(e) => {
                error!(error = %e, count = new_entries.len(), "failed to save entries");
                Ok(Vec::new())
            }
        }
    }

    fn collect_candidates(&self, subscriptions: &[Subscription]) -> Vec<FeedEntry> {
        let mut candidates = Vec::new();

        for subscription in subscriptions {
            let items = match self.fetcher.fetch(&subscription.feed_url) {
                Ok(items) => items,
                Err(e) => {
                    warn!(feed_url = %subscription.feed_url, error = %e, "failed to fetch feed");
                    continue;
                }
            };

            candidates.extend(
                items
                    .into_iter()
                    // items published before the subscription existed are backlog
                    .filter(|item| item.published_at >= subscription.created_at)
                    .map(|item| FeedEntry::from_item(&subscription.feed_url, item)),
            );
        }

        candidates
    }
}

/// Candidates whose (feed url, link) is not among `existing`, in candidate order.
pub fn difference(candidates: Vec<FeedEntry>, existing: &[FeedEntry]) -> Vec<FeedEntry> {
    let seen: HashSet<(&str, &str)> = existing.iter().map(FeedEntry::identity).collect();

    candidates
        .into_iter()
        .filter(|entry| !seen.contains(&entry.identity()))
        .collect()
}

/// Drop repeated (feed url, link) pairs, keeping the first occurrence.
pub fn unique(entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(entries.len());

    for entry in entries {
        let key = (entry.feed_url.clone(), entry.entry_link.clone());
        if seen.insert(key) {
            result.push(entry);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawItem;
    use crate::errors::BotError;
    use crate::sources::traits::MockFeedFetcher;
    use crate::storage::sqlite::{SqliteEntryRepository, SqliteStorage};
    use crate::storage::traits::MockEntryRepository;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    const FEED: &str = "https://example.com/index.xml";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn item(link: &str, published_at: DateTime<Utc>) -> RawItem {
        RawItem::new(format!("Title {}", link), link.to_string(), published_at)
    }

    fn entry(link: &str) -> FeedEntry {
        FeedEntry::from_item(FEED, item(link, t0()))
    }

    fn subscription(channel: &str, url: &str) -> Subscription {
        Subscription::new(channel.to_string(), url.to_string()).with_created_at(t0())
    }

    fn links(entries: &[FeedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.entry_link.as_str()).collect()
    }

    fn sqlite_detector(
        fetcher: MockFeedFetcher,
    ) -> (EntryDetector<MockFeedFetcher, SqliteEntryRepository>, SqliteEntryRepository) {
        let storage = SqliteStorage::in_memory().unwrap();
        let detector = EntryDetector::new(fetcher, SqliteEntryRepository::new(storage.clone()));
        (detector, SqliteEntryRepository::new(storage))
    }

    #[test]
    fn test_difference_uses_set_semantics() {
        let result = difference(vec![entry("a"), entry("a"), entry("b")], &[entry("a")]);
        assert_eq!(links(&result), vec!["b"]);
    }

    #[test]
    fn test_difference_is_idempotent() {
        let candidates = vec![entry("a"), entry("b"), entry("c")];
        let existing = vec![entry("b")];

        let first = difference(candidates.clone(), &existing);
        let second = difference(candidates, &existing);

        assert_eq!(first, second);
        assert_eq!(links(&first), vec!["a", "c"]);
    }

    #[test]
    fn test_difference_scopes_links_by_feed() {
        let other_feed = FeedEntry::from_item("https://other.example/feed", item("a", t0()));
        let result = difference(vec![entry("a")], &[other_feed]);

        assert_eq!(links(&result), vec!["a"]);
    }

    #[test]
    fn test_unique_keeps_first_occurrence() {
        let mut second = entry("L");
        second.entry_title = "second".to_string();

        let result = unique(vec![entry("L"), second, entry("M")]);

        assert_eq!(links(&result), vec!["L", "M"]);
        assert_eq!(result[0].entry_title, "Title L");
    }

    #[test]
    fn test_empty_input_short_circuits() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().never();
        let mut repo = MockEntryRepository::new();
        repo.expect_find_by_candidates().never();
        repo.expect_create().never();

        let detector = EntryDetector::new(fetcher, repo);

        assert!(detector.check_new_entries(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_backlog_suppressed_and_rerun_is_empty() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().times(2).returning(|_| {
            Ok(vec![
                item("https://example.com/new", t0() + Duration::seconds(1)),
                item("https://example.com/old", t0() - Duration::seconds(1)),
            ])
        });
        let (detector, store) = sqlite_detector(fetcher);
        let subs = vec![subscription("general", FEED)];

        let first = detector.check_new_entries(&subs).unwrap();
        assert_eq!(links(&first), vec!["https://example.com/new"]);
        assert!(first[0].id.is_some());
        assert!(first[0].recorded_at.is_some());

        let persisted = store.find_by_candidates(&first).unwrap();
        assert_eq!(persisted.len(), 1);

        let second = detector.check_new_entries(&subs).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_published_at_subscription_time_is_included() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(vec![item("https://example.com/boundary", t0())]));
        let (detector, _) = sqlite_detector(fetcher);

        let result = detector.check_new_entries(&[subscription("general", FEED)]).unwrap();

        assert_eq!(links(&result), vec!["https://example.com/boundary"]);
    }

    #[test]
    fn test_shared_feed_recorded_once() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(vec![item("https://example.com/post", t0())]));
        let (detector, store) = sqlite_detector(fetcher);
        let subs = vec![subscription("general", FEED), subscription("news", FEED)];

        let first = detector.check_new_entries(&subs).unwrap();
        assert_eq!(first.len(), 1);

        let second = detector.check_new_entries(&subs).unwrap();
        assert!(second.is_empty());

        let candidates = vec![entry("https://example.com/post")];
        assert_eq!(store.find_by_candidates(&candidates).unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_failure_skips_only_that_subscription() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().returning(|url| match url {
            "https://broken.example/feed" => Err(BotError::FeedParse("bad xml".to_string())),
            url => Ok(vec![item(&format!("{}/post", url), t0())]),
        });
        let (detector, _) = sqlite_detector(fetcher);
        let subs = vec![
            subscription("a", "https://one.example/feed"),
            subscription("b", "https://broken.example/feed"),
            subscription("c", "https://two.example/feed"),
        ];

        let result = detector.check_new_entries(&subs).unwrap();

        assert_eq!(
            links(&result),
            vec!["https://one.example/feed/post", "https://two.example/feed/post"]
        );
    }

    #[test]
    fn test_persist_failure_yields_nothing() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(vec![item("https://example.com/post", t0())]));
        let mut repo = MockEntryRepository::new();
        repo.expect_find_by_candidates().returning(|_| Ok(Vec::new()));
        repo.expect_create()
            .times(1)
            .returning(|_| Err(BotError::Database(rusqlite::Error::InvalidQuery)));

        let detector = EntryDetector::new(fetcher, repo);
        let result = detector.check_new_entries(&[subscription("general", FEED)]).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_lookup_failure_is_propagated() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(vec![item("https://example.com/post", t0())]));
        let mut repo = MockEntryRepository::new();
        repo.expect_find_by_candidates()
            .returning(|_| Err(BotError::Database(rusqlite::Error::InvalidQuery)));
        repo.expect_create().never();

        let detector = EntryDetector::new(fetcher, repo);
        let result = detector.check_new_entries(&[subscription("general", FEED)]);

        assert!(matches!(result, Err(BotError::Database(_))));
    }

    #[test]
    fn test_check_returns_first_item_without_recency_filter() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().returning(|_| {
            Ok(vec![
                item("https://example.com/ancient", t0() - Duration::days(365)),
                item("https://example.com/older", t0() - Duration::days(400)),
            ])
        });
        let mut repo = MockEntryRepository::new();
        repo.expect_find_by_candidates().never();
        repo.expect_create().never();

        let detector = EntryDetector::new(fetcher, repo);
        let found = detector.check(&subscription("general", FEED)).unwrap();

        assert_eq!(found.entry_link, "https://example.com/ancient");
        assert_eq!(found.feed_url, FEED);
        assert!(found.id.is_none());
    }

    #[test]
    fn test_check_empty_url_and_failures() {
        let mut fetcher = MockFeedFetcher::new();
        fetcher.expect_fetch().returning(|url| match url {
            "https://empty.example/feed" => Ok(Vec::new()),
            _ => Err(BotError::FeedParse("bad xml".to_string())),
        });
        let detector = EntryDetector::new(fetcher, MockEntryRepository::new());

        assert!(detector.check(&subscription("general", "")).is_none());
        assert!(detector
            .check(&subscription("general", "https://empty.example/feed"))
            .is_none());
        assert!(detector
            .check(&subscription("general", "https://broken.example/feed"))
            .is_none());
    }
}
