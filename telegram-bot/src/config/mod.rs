//! Bot configuration: BaseConfig (Telegram, webhook, server, relay, logging) loaded from env,
//! wrapped by BotConfig with getters and factories for the session layer.

mod base;
mod bot_config;


pub use base::{BaseConfig, ConfigMissing};
pub use bot_config::BotConfig;
