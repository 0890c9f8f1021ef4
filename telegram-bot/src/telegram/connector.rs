//! Platform seams: the management surface of a connected client and the factory that connects one.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::bot_adapter::{build_http_client, classify_request_error, TelegramBotAdapter};
use super::session::Session;
use crate::core::{Bot, DownstreamError, Message, SendResult};
use teloxide::prelude::Requester;

/// Receives inbound messages from the polling receiver.
pub type UpdateSink = Arc<dyn Fn(Message) + Send + Sync>;

/// A connected platform client: send/edit plus webhook and receiver management.
#[async_trait]
pub trait PlatformClient: Bot {
    /// Registers `url` for update delivery; pending updates are dropped.
    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> SendResult<()>;

    async fn delete_webhook(&self) -> SendResult<()>;

    /// Platform-reported webhook state as JSON.
    async fn webhook_info(&self) -> SendResult<serde_json::Value>;

    /// Starts a background receiver that feeds `sink`. No-op when already running.
    async fn start_polling(&self, sink: UpdateSink) -> SendResult<()>;

    /// Stops the background receiver, if any.
    async fn stop_receiver(&self) -> SendResult<()>;
}

/// Opens a fresh platform session. Called by the session manager on setup and restart.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> SendResult<Session>;
}

/// Connects to the Telegram Bot API with teloxide.
#[derive(Debug, Clone, Default)]
pub struct TeloxideConnector {
    token: String,
    api_url: Option<String>,
    http_proxy: Option<String>,
    https_proxy: Option<String>,
    max_polling_retries: u32,
}

impl TeloxideConnector {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            max_polling_retries: super::polling::DEFAULT_MAX_RETRIES,
            ..Self::default()
        }
    }

    /// Custom Bot API server (e.g. a local bot-api instance or a test server).
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        self.api_url = url;
        self
    }

    pub fn with_proxies(mut self, http: Option<String>, https: Option<String>) -> Self {
        self.http_proxy = http;
        self.https_proxy = https;
        self
    }

    pub fn with_max_polling_retries(mut self, retries: u32) -> Self {
        self.max_polling_retries = retries;
        self
    }
}

#[async_trait]
impl Connector for TeloxideConnector {
    async fn connect(&self) -> SendResult<Session> {
        if self.token.trim().is_empty() {
            return Err(DownstreamError::Fatal("Bot token is empty".to_string()));
        }
        let client = build_http_client(self.http_proxy.as_deref(), self.https_proxy.as_deref())?;
        let mut bot = teloxide::Bot::with_client(&self.token, client);
        if let Some(url) = &self.api_url {
            let url = reqwest::Url::parse(url)
                .map_err(|e| DownstreamError::Fatal(format!("Invalid TELEGRAM_API_URL: {}", e)))?;
            bot = bot.set_api_url(url);
        }

        let me = bot.get_me().await.map_err(classify_request_error)?;
        let username = me.user.username.clone();
        info!(username = ?username, "Connected to Telegram");

        let adapter =
            TelegramBotAdapter::new(bot).with_max_polling_retries(self.max_polling_retries);
        Ok(Session::new(Arc::new(adapter), username))
    }
}
