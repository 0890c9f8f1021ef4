//! Telegram layer: teloxide adapter, update conversion, polling receiver, and session lifecycle.

mod adapters;
mod bot_adapter;
mod connector;
mod polling;
mod session;

pub use adapters::{
    message_from_update, parse_update, TelegramMessageWrapper, TelegramUserWrapper,
};
pub use bot_adapter::{classify_request_error, TelegramBotAdapter};
pub use connector::{Connector, PlatformClient, TeloxideConnector, UpdateSink};
pub use polling::polling_backoff;
pub use session::{
    LifecycleState, Session, SessionBot, SessionManager, SessionStatus, WebhookSettings,
};
