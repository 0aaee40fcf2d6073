use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::Config;
use crate::domain::Notification;
use crate::errors::{BotError, BotResult};

/// Delivers a notification to a chat channel. Best-effort: callers log failures.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn send(&self, notification: &Notification) -> BotResult<()>;
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    content: &'a str,
}

/// Posts messages through the chat platform's REST API.
pub struct ChatNotificationService {
    url: String,
    client: Client,
}

impl ChatNotificationService {
    pub fn new(config: &Config) -> BotResult<Self> {
        let token = config.require_bot_token()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bot {}", token))
                .map_err(|_| BotError::Config("CHAT_BOT_TOKEN is not a valid header value".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            url: config.chat_api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.url, channel_id)
    }
}

impl NotificationSink for ChatNotificationService {
    fn send(&self, notification: &Notification) -> BotResult<()> {
        let content = notification.format();
        let response = self
            .client
            .post(self.messages_url(&notification.channel_id))
            .json(&SendMessagePayload { content: &content })
            .send()?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(BotError::Notification(format!(
                "Channel not found: {}",
                notification.channel_id
            ))),
            status => Err(BotError::Notification(format!(
                "Chat API returned {} for channel {}",
                status, notification.channel_id
            ))),
        }
    }
}

/// Prints notifications to stdout instead of delivering them.
#[derive(Debug, Default)]
pub struct ConsoleNotificationService;

impl NotificationSink for ConsoleNotificationService {
    fn send(&self, notification: &Notification) -> BotResult<()> {
        println!("[DRY RUN] #{} {}", notification.channel_id, notification.format());
        Ok(())
    }
}
