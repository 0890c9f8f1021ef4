//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;

#[derive(Parser, Debug)]
#[command(name = "telegram-llm-bot")]
#[command(about = "Telegram gateway that streams LLM replies", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the webhook gateway (config from env; flags override it).
    Run {
        /// Overrides TELEGRAM_BOT_TOKEN / BOT_TOKEN.
        #[arg(short, long)]
        token: Option<String>,

        /// Overrides BIND_ADDRESS.
        #[arg(short, long)]
        bind: Option<String>,

        /// Receive updates by long polling instead of the webhook.
        #[arg(long)]
        polling: bool,
    },
}

/// Loads and validates BotConfig from the environment, applying CLI overrides.
pub fn load_config(token: Option<String>, bind: Option<String>) -> Result<BotConfig> {
    let mut config = BotConfig::load(token)?;
    if let Some(bind) = bind {
        config.base.bind_address = bind;
    }
    config.validate()?;
    Ok(config)
}
