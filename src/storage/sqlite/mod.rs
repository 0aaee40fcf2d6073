mod connection;
mod entry_repository;
mod subscription_repository;

pub use connection::SqliteStorage;
pub use entry_repository::SqliteEntryRepository;
pub use subscription_repository::SqliteSubscriptionRepository;
