//! Streaming reply: placeholder message, upstream fragment stream, relay into the placeholder.

use std::sync::Arc;

use async_trait::async_trait;
use llm_client::{stream_completion, CompletionRequest, LlmClient, LlmConfig};
use telegram_bot::{Bot, EditChannel, Handler, HandlerResponse, Message, Result};
use tracing::{info, instrument, warn};

use crate::relay::{RelayPublisher, RelaySettings};

/// Answers every text message with a streamed LLM completion, edited into one chat message.
pub struct StreamingReplyHandler {
    bot: Arc<dyn Bot>,
    llm_client: Arc<dyn LlmClient>,
    llm_config: Arc<dyn LlmConfig>,
    relay: RelaySettings,
    thinking_message: String,
}

impl StreamingReplyHandler {
    pub fn new(
        bot: Arc<dyn Bot>,
        llm_client: Arc<dyn LlmClient>,
        llm_config: Arc<dyn LlmConfig>,
        relay: RelaySettings,
        thinking_message: impl Into<String>,
    ) -> Self {
        Self {
            bot,
            llm_client,
            llm_config,
            relay,
            thinking_message: thinking_message.into(),
        }
    }

    fn request_for(&self, message: &Message) -> CompletionRequest {
        CompletionRequest::new(message.content.clone(), self.llm_config.model())
            .with_system_prompt(self.llm_config.system_prompt())
            .with_timeout(self.llm_config.request_timeout())
    }
}

#[async_trait]
impl Handler for StreamingReplyHandler {
    /// Non-text messages (stickers, photos) end the chain here.
    async fn before(&self, message: &Message) -> Result<bool> {
        Ok(message.has_text())
    }

    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        info!(len = message.content.len(), "Processing message");

        let mut channel = EditChannel::new(self.bot.clone(), message.chat.clone());
        // Without a placeholder the first publish sends a new message instead.
        if let Err(e) = channel.send_or_edit(&self.thinking_message).await {
            warn!(error = %e, "Failed to send placeholder");
        }

        let fragments = stream_completion(
            self.llm_client.clone(),
            self.request_for(message),
            self.llm_config.retry_policy(),
        );
        let outcome = RelayPublisher::new(channel, self.relay.clone())
            .run(fragments)
            .await;

        Ok(HandlerResponse::Reply(outcome.text))
    }
}
