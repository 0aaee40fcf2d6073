pub mod traits;
pub mod rss_atom;

pub use traits::FeedFetcher;
pub use rss_atom::HttpFeedFetcher;
