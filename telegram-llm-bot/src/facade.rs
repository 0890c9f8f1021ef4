//! **Public API of this crate.** Entry points for the webhook gateway and polling mode, plus
//! [`assemble`] for driving the full pipeline with substitute connectors and LLM clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use llm_client::{EnvLlmConfig, LlmClient, LlmConfig};
use telegram_bot::{BotConfig, Connector, UpdateSink};
use tracing::{error, info, warn};

use crate::assembly;
use crate::gateway::{self, AppState};

/// Wires sessions, handler chain, dispatcher and gateway settings without connecting anything.
pub fn assemble(
    config: &BotConfig,
    connector: Arc<dyn Connector>,
    llm_client: Arc<dyn LlmClient>,
    llm_config: Arc<dyn LlmConfig>,
) -> AppState {
    assembly::build_state(config, connector, llm_client, llm_config)
}

fn assemble_from_env(config: &BotConfig) -> Result<AppState> {
    let llm_config = EnvLlmConfig::from_env()?;
    let llm_client = assembly::build_llm_client(&llm_config, config)?;
    Ok(assemble(
        config,
        Arc::new(config.connector()),
        llm_client,
        Arc::new(llm_config),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

/// Serves the webhook gateway on the configured bind address until Ctrl-C.
///
/// A failed connect or webhook registration at startup is logged, not fatal: the gateway still
/// serves `/status`, and `/restart` or `/set-webhook` can recover later.
pub async fn run_bot_with_llm(config: BotConfig) -> Result<()> {
    let state = assemble_from_env(&config)?;
    let sessions = state.sessions.clone();

    match sessions.register_webhook().await {
        Ok(()) => info!(environment = %config.environment(), "Bot ready for webhook mode"),
        Err(e) => warn!(error = %e, "Bot started without a registered webhook"),
    }

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "HTTP gateway listening");

    axum::serve(listener, gateway::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    sessions.shutdown().await;
    Ok(())
}

/// Receives updates by long polling instead of a webhook, until Ctrl-C.
pub async fn run_bot_with_polling(config: BotConfig) -> Result<()> {
    let state = assemble_from_env(&config)?;
    let dispatcher = state.dispatcher.clone();
    let sink: UpdateSink = Arc::new(move |message| dispatcher.dispatch(message));

    state
        .sessions
        .start_polling(sink)
        .await
        .context("Failed to start polling")?;
    info!("Bot ready for polling mode");

    shutdown_signal().await;
    state.sessions.shutdown().await;
    Ok(())
}
