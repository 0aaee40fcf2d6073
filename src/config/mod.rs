use std::time::Duration;

use crate::errors::{BotError, BotResult};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CHAT_API_URL: &str = "https://discord.com/api/v10";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub chat_api_url: String,
    pub chat_bot_token: Option<String>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> BotResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let db_path = std::env::var("RSS_BOT_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("rss_subscriptions.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./rss_subscriptions.db".to_string())
        });

        let poll_interval = Duration::from_secs(secs_from_env(
            "RSS_BOT_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let fetch_timeout = Duration::from_secs(secs_from_env(
            "RSS_BOT_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);

        let chat_api_url =
            std::env::var("CHAT_API_URL").unwrap_or_else(|_| DEFAULT_CHAT_API_URL.to_string());

        let chat_bot_token = std::env::var("CHAT_BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            db_path,
            poll_interval,
            fetch_timeout,
            chat_api_url,
            chat_bot_token,
        })
    }

    /// Token for the chat platform; only needed when actually delivering messages.
    pub fn require_bot_token(&self) -> BotResult<&str> {
        self.chat_bot_token
            .as_deref()
            .ok_or_else(|| BotError::MissingEnvVar("CHAT_BOT_TOKEN".to_string()))
    }
}

fn secs_from_env(name: &str, default: u64) -> BotResult<u64> {
    match std::env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_secs(name: &str, raw: &str) -> BotResult<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{} must be a number of seconds, got {:?}", name, raw)))?;

    if secs == 0 {
        return Err(BotError::Config(format!("{} must be greater than zero", name)));
    }

    Ok(secs)
}
