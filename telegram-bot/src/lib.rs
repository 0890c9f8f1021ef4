//! # Telegram bot framework
//!
//! Transport-agnostic core (Handler, Bot, Message, edit channel, errors, logging), the handler
//! chain, env-based configuration and CLI, and the Telegram layer: teloxide adapter, update
//! receiver, and the session lifecycle manager that owns the platform connection.

pub mod chain;
pub mod cli;
pub mod config;
pub mod core;
pub mod telegram;

pub use cli::{load_config, Cli, Commands};

pub use core::{
    init_tracing, parse_message_id, Bot, Chat, DbotError, DownstreamError, EditChannel,
    EditTarget, Handler, HandlerResponse, Message, MessageDirection, Result, SendResult,
    SessionError, ToCoreMessage, ToCoreUser, User,
};

pub use chain::HandlerChain;

pub use telegram::{
    classify_request_error, message_from_update, parse_update, polling_backoff, Connector,
    LifecycleState, PlatformClient, Session, SessionBot, SessionManager, SessionStatus,
    TelegramBotAdapter, TelegramMessageWrapper, TelegramUserWrapper, TeloxideConnector,
    UpdateSink, WebhookSettings,
};

pub use config::{BaseConfig, BotConfig, ConfigMissing};
