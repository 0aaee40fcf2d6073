use chrono::{DateTime, Utc};

use super::FeedEntry;

/// Maximum message length accepted by the chat platform
pub const MAX_CONTENT_CHARS: usize = 2000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_entry(channel_id: &str, entry: &FeedEntry) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            title: entry.entry_title.clone(),
            link: entry.entry_link.clone(),
            published_at: entry.published_at,
        }
    }

    /// Format: "**{title}**\n{link}\nPublished: {published_at}"
    ///
    /// The title is shortened first when the message would exceed the platform limit,
    /// so the link always survives.
    pub fn format(&self) -> String {
        let tail = format!(
            "**\n{}\nPublished: {}",
            self.link,
            self.published_at.format(TIMESTAMP_FORMAT)
        );

        let budget = MAX_CONTENT_CHARS.saturating_sub(tail.chars().count() + 2);
        let title = truncate_to_char_boundary(&self.title, budget);

        let message = format!("**{}{}", title, tail);
        truncate_to_char_boundary(&message, MAX_CONTENT_CHARS)
    }
}

/// Truncate string to at most `max_chars` characters, respecting char boundaries
fn truncate_to_char_boundary(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
