//! BotConfig: BaseConfig plus getters and factories for the Telegram layer.
//!
//! LLM settings live in the llm-client crate (`EnvLlmConfig`).

use anyhow::Result;
use tracing::warn;

use super::BaseConfig;
use crate::telegram::{TeloxideConnector, WebhookSettings};

pub struct BotConfig {
    pub base: BaseConfig,
}

impl BotConfig {
    /// Load from environment variables. If `token` is provided it overrides the token env vars.
    /// Call validate() after load to check config before init.
    pub fn load(token: Option<String>) -> Result<Self> {
        Ok(Self {
            base: BaseConfig::load(token)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()
    }

    /// Logs a warning for each missing setting. The process keeps running.
    pub fn warn_missing(&self) {
        for missing in self.base.missing() {
            warn!(setting = %missing, "Configuration incomplete");
        }
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn bind_address(&self) -> &str {
        &self.base.bind_address
    }
    pub fn environment(&self) -> &str {
        &self.base.environment
    }
    pub fn is_production(&self) -> bool {
        self.base.is_production()
    }
    pub fn telegram_edit_interval_secs(&self) -> u64 {
        self.base.telegram_edit_interval_secs
    }
    pub fn relay_publish_every_chars(&self) -> usize {
        self.base.relay_publish_every_chars
    }
    pub fn thinking_message(&self) -> &str {
        &self.base.thinking_message
    }

    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            url: self.base.webhook_url.clone(),
            secret: self.base.webhook_secret.clone(),
        }
    }

    /// Teloxide connector configured with token, API URL, proxies and polling retry budget.
    pub fn connector(&self) -> TeloxideConnector {
        TeloxideConnector::new(self.base.bot_token.clone())
            .with_api_url(self.base.telegram_api_url.clone())
            .with_proxies(self.base.http_proxy.clone(), self.base.https_proxy.clone())
            .with_max_polling_retries(self.base.max_connection_retries)
    }
}
