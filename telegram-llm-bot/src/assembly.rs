//! Assembly: builds the LLM client, handler chain, dispatcher and gateway state from config.
//! Used by the [facade](crate::facade).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use llm_client::{provider_http_client, EnvLlmConfig, LlmClient, LlmConfig, OpenAILlmClient};
use telegram_bot::{Bot, BotConfig, Connector, HandlerChain, SessionBot, SessionManager};
use tracing::info;

use crate::dispatcher::UserDispatcher;
use crate::gateway::{AppState, GatewaySettings};
use crate::handlers::{CommandHandler, StreamingReplyHandler};
use crate::relay::{PublishThrottle, RelaySettings};

/// OpenAI client whose HTTP traffic uses the configured proxies, the same ones the Telegram
/// connector gets.
pub(crate) fn build_llm_client(
    llm_cfg: &EnvLlmConfig,
    config: &BotConfig,
) -> Result<Arc<dyn LlmClient>> {
    let http_client = provider_http_client(
        config.base.http_proxy.as_deref(),
        config.base.https_proxy.as_deref(),
    )
    .context("Failed to build LLM HTTP client")?;
    let client = match llm_cfg.base_url() {
        Some(base_url) => {
            OpenAILlmClient::with_base_url(llm_cfg.api_key().to_string(), base_url.to_string())
        }
        None => OpenAILlmClient::new(llm_cfg.api_key().to_string()),
    }
    .with_http_client(http_client);
    info!(
        model = %llm_cfg.model(),
        base_url = ?llm_cfg.base_url(),
        timeout_secs = llm_cfg.request_timeout().as_secs(),
        proxied = config.base.using_proxy(),
        "LLM client configured"
    );
    Ok(Arc::new(client))
}

pub(crate) fn relay_settings(config: &BotConfig) -> RelaySettings {
    RelaySettings {
        throttle: PublishThrottle::new(
            config.relay_publish_every_chars(),
            Duration::from_secs(config.telegram_edit_interval_secs()),
        ),
        ..RelaySettings::default()
    }
}

/// Commands first, then the streaming reply.
pub(crate) fn build_chain(
    config: &BotConfig,
    bot: Arc<dyn Bot>,
    llm_client: Arc<dyn LlmClient>,
    llm_config: Arc<dyn LlmConfig>,
) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(CommandHandler::new(bot.clone())))
        .add_handler(Arc::new(StreamingReplyHandler::new(
            bot,
            llm_client,
            llm_config,
            relay_settings(config),
            config.thinking_message(),
        )))
}

pub(crate) fn build_state(
    config: &BotConfig,
    connector: Arc<dyn Connector>,
    llm_client: Arc<dyn LlmClient>,
    llm_config: Arc<dyn LlmConfig>,
) -> AppState {
    let sessions = Arc::new(SessionManager::new(connector, config.webhook_settings()));
    let bot: Arc<dyn Bot> = Arc::new(SessionBot::new(sessions.clone()));
    let chain = build_chain(config, bot, llm_client, llm_config);
    AppState {
        sessions,
        dispatcher: UserDispatcher::new(chain),
        settings: Arc::new(GatewaySettings {
            environment: config.environment().to_string(),
            production: config.is_production(),
            webhook_secret: config.webhook_settings().secret,
        }),
    }
}
