//! Base config: Telegram connection, webhook, HTTP server, relay pacing, logging. Loaded from env.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Result;
use thiserror::Error;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_LOG_FILE: &str = "logs/telegram-bot.log";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
const DEFAULT_THINKING_MESSAGE: &str = "Thinking...";

/// Settings whose absence is reported at startup but does not stop the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigMissing {
    #[error("TELEGRAM_BOT_TOKEN (or BOT_TOKEN) is not set")]
    BotToken,

    #[error("WEBHOOK_URL and WEBHOOK_SECRET must be set in production")]
    WebhookSettings,
}

#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// TELEGRAM_BOT_TOKEN or BOT_TOKEN; empty when unset.
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    /// Consecutive polling failures tolerated before giving up.
    pub max_connection_retries: u32,
    /// ENVIRONMENT: `development` or `production`.
    pub environment: String,
    pub log_file: String,
    /// BIND_ADDRESS for the HTTP gateway.
    pub bind_address: String,
    /// Min seconds between intermediate edits of a streamed reply; 0 disables time-based throttling.
    pub telegram_edit_interval_secs: u64,
    /// Intermediate edit every N accumulated characters.
    pub relay_publish_every_chars: usize,
    /// Placeholder sent before the first fragment arrives.
    pub thinking_message: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    non_empty_var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides TELEGRAM_BOT_TOKEN / BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = token
            .or_else(|| non_empty_var("TELEGRAM_BOT_TOKEN"))
            .or_else(|| non_empty_var("BOT_TOKEN"))
            .unwrap_or_default();
        let telegram_api_url =
            non_empty_var("TELEGRAM_API_URL").or_else(|| non_empty_var("TELOXIDE_API_URL"));

        Ok(Self {
            bot_token,
            telegram_api_url,
            webhook_url: non_empty_var("WEBHOOK_URL"),
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            http_proxy: non_empty_var("HTTP_PROXY"),
            https_proxy: non_empty_var("HTTPS_PROXY"),
            max_connection_retries: parse_var("MAX_CONNECTION_RETRIES", 5),
            environment: non_empty_var("ENVIRONMENT")
                .map(|e| e.to_lowercase())
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            log_file: non_empty_var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            bind_address: non_empty_var("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            telegram_edit_interval_secs: parse_var("TELEGRAM_EDIT_INTERVAL_SECS", 0),
            relay_publish_every_chars: parse_var("RELAY_PUBLISH_EVERY_CHARS", 20).max(1),
            thinking_message: non_empty_var("THINKING_MESSAGE")
                .unwrap_or_else(|| DEFAULT_THINKING_MESSAGE.to_string()),
        })
    }

    /// Rejects malformed URLs and bind addresses. Missing values are not errors; see [`Self::missing`].
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("TELEGRAM_API_URL", &self.telegram_api_url),
            ("WEBHOOK_URL", &self.webhook_url),
            ("HTTP_PROXY", &self.http_proxy),
            ("HTTPS_PROXY", &self.https_proxy),
        ];
        for (key, value) in urls {
            if let Some(url_str) = value {
                if reqwest::Url::parse(url_str).is_err() {
                    anyhow::bail!("{} is set but not a valid URL: {}", key, url_str);
                }
            }
        }
        if SocketAddr::from_str(&self.bind_address).is_err() {
            anyhow::bail!("BIND_ADDRESS is not a valid socket address: {}", self.bind_address);
        }
        Ok(())
    }

    /// Settings that are absent but would be needed for normal operation.
    pub fn missing(&self) -> Vec<ConfigMissing> {
        let mut missing = Vec::new();
        if self.bot_token.trim().is_empty() {
            missing.push(ConfigMissing::BotToken);
        }
        if self.is_production() && (self.webhook_url.is_none() || self.webhook_secret.is_none()) {
            missing.push(ConfigMissing::WebhookSettings);
        }
        missing
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn using_proxy(&self) -> bool {
        self.http_proxy.is_some() || self.https_proxy.is_some()
    }
}
