//! `/start` and `/help`. Other commands are swallowed so they never reach the LLM.

use std::sync::Arc;

use async_trait::async_trait;
use telegram_bot::{Bot, Handler, HandlerResponse, Message, Result};
use tracing::{debug, info};

pub const MSG_START: &str =
    "Hi! I'm your AI assistant. Send me a message and I'll respond with AI-generated content!";
pub const MSG_HELP: &str = "Just send me any text and I'll generate a response for you using AI.";

pub struct CommandHandler {
    bot: Arc<dyn Bot>,
}

impl CommandHandler {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Handler for CommandHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(command) = message.command() else {
            return Ok(HandlerResponse::Continue);
        };
        let reply = match command {
            "start" => MSG_START,
            "help" => MSG_HELP,
            other => {
                debug!(user_id = message.user.id, command = %other, "Ignoring unknown command");
                return Ok(HandlerResponse::Stop);
            }
        };
        info!(user_id = message.user.id, command = %command, "Command received");
        self.bot.reply_to(message, reply).await?;
        Ok(HandlerResponse::Reply(reply.to_string()))
    }
}
