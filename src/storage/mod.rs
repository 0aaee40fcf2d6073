pub mod traits;
pub mod sqlite;

pub use traits::{EntryRepository, SubscriptionRepository};
pub use sqlite::{SqliteEntryRepository, SqliteStorage, SqliteSubscriptionRepository};
