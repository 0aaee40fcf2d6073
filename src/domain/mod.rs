pub mod feed_entry;
pub mod notification;
pub mod subscription;

pub use feed_entry::{FeedEntry, RawItem};
pub use notification::Notification;
pub use subscription::{Subscription, SubscriptionFilter};
