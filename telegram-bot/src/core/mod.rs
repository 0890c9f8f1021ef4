//! Core types and traits: Handler, Bot, Message, HandlerResponse, edit channel, error, logger.
//! Transport-agnostic.

pub mod bot;
pub mod channel;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{parse_message_id, Bot, SendResult};
pub use channel::{EditChannel, EditTarget};
pub use error::{DbotError, DownstreamError, Result, SessionError};
pub use logger::init_tracing;
pub use types::{
    Chat, Handler, HandlerResponse, Message, MessageDirection, ToCoreMessage, ToCoreUser, User,
};
