//! Chain handlers: bot commands, then the streaming LLM reply.

mod commands;
mod streaming_reply;

pub use commands::{CommandHandler, MSG_HELP, MSG_START};
pub use streaming_reply::StreamingReplyHandler;
