//! Wraps teloxide::Bot and implements [`crate::core::Bot`] and [`PlatformClient`].
//!
//! Every teloxide failure is classified into a [`DownstreamError`] so callers can tell rate
//! limits and network blips apart from permanent rejections.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use teloxide::{ApiError, RequestError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use super::connector::{PlatformClient, UpdateSink};
use super::polling::run_polling;
use crate::core::{parse_message_id, Bot as CoreBot, Chat, DownstreamError, SendResult};

/// Maps a teloxide error onto the three recoverable kinds.
pub fn classify_request_error(error: RequestError) -> DownstreamError {
    match error {
        RequestError::RetryAfter(wait) => DownstreamError::RateLimited(wait.duration()),
        RequestError::Network(e) => DownstreamError::Transient(e.to_string()),
        RequestError::Io(e) => DownstreamError::Transient(e.to_string()),
        other => DownstreamError::Fatal(other.to_string()),
    }
}

pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
    max_polling_retries: u32,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self {
            bot,
            max_polling_retries: super::polling::DEFAULT_MAX_RETRIES,
            receiver: Mutex::new(None),
        }
    }

    /// Consecutive polling failures tolerated before the receiver gives up.
    pub fn with_max_polling_retries(mut self, retries: u32) -> Self {
        self.max_polling_retries = retries;
        self
    }

    /// Underlying teloxide::Bot for direct API use.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> SendResult<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(classify_request_error)?;
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> SendResult<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(classify_request_error)?;
        Ok(sent.id.0.to_string())
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> SendResult<()> {
        let id = parse_message_id(message_id)?;
        match self
            .bot
            .edit_message_text(ChatId(chat.id), MessageId(id), text.to_string())
            .await
        {
            Ok(_) => Ok(()),
            // The message already shows this text.
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!(chat_id = chat.id, message_id = id, "Edit skipped: message not modified");
                Ok(())
            }
            Err(e) => Err(classify_request_error(e)),
        }
    }
}

#[async_trait]
impl PlatformClient for TelegramBotAdapter {
    #[instrument(skip(self, secret))]
    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> SendResult<()> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| DownstreamError::Fatal(format!("Invalid webhook URL {}: {}", url, e)))?;
        let mut request = self.bot.set_webhook(url).drop_pending_updates(true);
        if let Some(secret) = secret {
            request = request.secret_token(secret.to_string());
        }
        request.await.map_err(classify_request_error)?;
        info!("Webhook registered");
        Ok(())
    }

    async fn delete_webhook(&self) -> SendResult<()> {
        self.bot
            .delete_webhook()
            .await
            .map_err(classify_request_error)?;
        info!("Webhook removed");
        Ok(())
    }

    async fn webhook_info(&self) -> SendResult<serde_json::Value> {
        let info = self
            .bot
            .get_webhook_info()
            .await
            .map_err(classify_request_error)?;
        serde_json::to_value(&info).map_err(|e| DownstreamError::Fatal(e.to_string()))
    }

    async fn start_polling(&self, sink: UpdateSink) -> SendResult<()> {
        let mut receiver = self.receiver.lock().await;
        if receiver.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("Polling receiver already running");
            return Ok(());
        }
        // getUpdates is rejected while a webhook is set.
        self.bot
            .delete_webhook()
            .drop_pending_updates(true)
            .await
            .map_err(classify_request_error)?;
        let handle = tokio::spawn(run_polling(
            self.bot.clone(),
            sink,
            self.max_polling_retries,
        ));
        *receiver = Some(handle);
        info!("Polling receiver started");
        Ok(())
    }

    async fn stop_receiver(&self) -> SendResult<()> {
        if let Some(handle) = self.receiver.lock().await.take() {
            handle.abort();
            info!("Polling receiver stopped");
        }
        Ok(())
    }
}

/// Builds the HTTP client used for Bot API calls: pooled connections, bounded timeouts, optional proxies.
pub(crate) fn build_http_client(
    http_proxy: Option<&str>,
    https_proxy: Option<&str>,
) -> SendResult<reqwest::Client> {
    // Proxies come from config only, not from the process environment.
    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(8)
        .connect_timeout(Duration::from_secs(15))
        // Long polls hold the request open for the poll timeout; leave headroom on top of it.
        .timeout(Duration::from_secs(super::polling::POLL_TIMEOUT_SECS as u64 + 15))
        .tcp_nodelay(true);
    if let Some(proxy) = http_proxy {
        let proxy = reqwest::Proxy::http(proxy)
            .map_err(|e| DownstreamError::Fatal(format!("Invalid HTTP proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    if let Some(proxy) = https_proxy {
        let proxy = reqwest::Proxy::https(proxy)
            .map_err(|e| DownstreamError::Fatal(format!("Invalid HTTPS proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| DownstreamError::Fatal(format!("Failed to build HTTP client: {}", e)))
}
