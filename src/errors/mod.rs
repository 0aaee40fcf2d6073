use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Subscription errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Subscription already exists: {0}")]
    SubscriptionExists(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Notification errors
    #[error("Notification failed: {0}")]
    Notification(String),

    // Polling task errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type BotResult<T> = Result<T, BotError>;
