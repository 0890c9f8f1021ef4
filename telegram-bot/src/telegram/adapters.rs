//! Conversions from teloxide types to core types.

use teloxide::types::{Update, UpdateKind};

use crate::core::{Chat, Message, MessageDirection, ToCoreMessage, ToCoreUser, User};

pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl ToCoreUser for TelegramUserWrapper<'_> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl TelegramMessageWrapper<'_> {
    fn chat_type(&self) -> &'static str {
        let chat = &self.0.chat;
        if chat.is_private() {
            "private"
        } else if chat.is_supergroup() {
            "supergroup"
        } else if chat.is_group() {
            "group"
        } else {
            "channel"
        }
    }

    fn message_type(&self) -> &'static str {
        if self.0.text().is_some() {
            "text"
        } else {
            "other"
        }
    }
}

impl ToCoreMessage for TelegramMessageWrapper<'_> {
    fn to_core(&self) -> Message {
        let msg = self.0;
        // Channel posts have no sender; fall back to the chat id so per-user ordering still holds.
        let user = msg
            .from
            .as_ref()
            .map(|u| TelegramUserWrapper(u).to_core())
            .unwrap_or_else(|| User {
                id: msg.chat.id.0,
                username: None,
                first_name: None,
                last_name: None,
            });
        Message {
            id: msg.id.0.to_string(),
            user,
            chat: Chat {
                id: msg.chat.id.0,
                chat_type: self.chat_type().to_string(),
            },
            content: msg.text().unwrap_or("").to_string(),
            message_type: self.message_type().to_string(),
            direction: MessageDirection::Incoming,
            created_at: msg.date,
            reply_to_message_id: msg.reply_to_message().map(|m| m.id.0.to_string()),
        }
    }
}

/// Extracts the core message from an update. Edits, callbacks and other kinds yield `None`.
pub fn message_from_update(update: &Update) -> Option<Message> {
    match &update.kind {
        UpdateKind::Message(msg) => Some(TelegramMessageWrapper(msg).to_core()),
        _ => None,
    }
}

/// Parses a webhook body as a Telegram update and extracts its message, if any.
/// Fails when the JSON is not an update (e.g. no `update_id`).
pub fn parse_update(payload: serde_json::Value) -> Result<Option<Message>, serde_json::Error> {
    let update: Update = serde_json::from_value(payload)?;
    Ok(message_from_update(&update))
}
