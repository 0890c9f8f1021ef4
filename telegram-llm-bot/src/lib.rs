//! # telegram_llm_bot
//!
//! Relays Telegram messages to a streaming LLM completion and edits the reply into the chat as
//! it grows. **Public API:** see [facade]: `run_bot_with_llm`, `run_bot_with_polling`, `assemble`.

mod assembly;
pub mod dispatcher;
mod facade;
pub mod gateway;
pub mod handlers;
pub mod relay;

pub use dispatcher::UserDispatcher;
pub use facade::*;
pub use gateway::{router, AppState, GatewayError, GatewaySettings};
pub use handlers::{CommandHandler, StreamingReplyHandler};
pub use relay::{Delivery, PublishThrottle, RelayOutcome, RelayPublisher, RelaySettings};
