//! Bot trait: the send/edit surface of the chat platform, with classified failures.

use async_trait::async_trait;

use super::error::DownstreamError;
use super::types::{Chat, Message};

/// Result of a platform call.
pub type SendResult<T> = std::result::Result<T, DownstreamError>;

/// Sends and edits chat messages. Production code uses the teloxide adapter; tests substitute mocks.
#[async_trait]
pub trait Bot: Send + Sync {
    async fn send_message(&self, chat: &Chat, text: &str) -> SendResult<()>;

    /// Sends a message and returns its platform id, for later edits.
    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> SendResult<String>;

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> SendResult<()>;

    async fn reply_to(&self, message: &Message, text: &str) -> SendResult<()> {
        self.send_message(&message.chat, text).await
    }
}

/// Parses a message id produced by [`Bot::send_message_and_return_id`].
pub fn parse_message_id(message_id: &str) -> SendResult<i32> {
    message_id
        .parse()
        .map_err(|_| DownstreamError::Fatal(format!("Invalid message_id for edit: {}", message_id)))
}
