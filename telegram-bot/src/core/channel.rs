//! Edit channel: one outbound chat message that is created on first publish and edited afterwards.

use std::sync::Arc;

use tracing::debug;

use super::bot::{Bot, SendResult};
use super::types::Chat;

/// Which message successive publishes go to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditTarget {
    /// Nothing sent yet; the next publish creates the message.
    #[default]
    Unbound,
    /// Publishes edit this platform message id.
    Bound(String),
}

impl EditTarget {
    pub fn message_id(&self) -> Option<&str> {
        match self {
            EditTarget::Unbound => None,
            EditTarget::Bound(id) => Some(id),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, EditTarget::Bound(_))
    }
}

/// Binds a [`Bot`] to one chat and at most one editable message.
///
/// The target only moves from `Unbound` to `Bound`; a failed send leaves it `Unbound`.
pub struct EditChannel {
    bot: Arc<dyn Bot>,
    chat: Chat,
    target: EditTarget,
}

impl EditChannel {
    pub fn new(bot: Arc<dyn Bot>, chat: Chat) -> Self {
        Self {
            bot,
            chat,
            target: EditTarget::Unbound,
        }
    }

    /// Channel whose first publish edits an existing message (e.g. a "Thinking..." placeholder).
    pub fn bound(bot: Arc<dyn Bot>, chat: Chat, message_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat,
            target: EditTarget::Bound(message_id.into()),
        }
    }

    pub fn target(&self) -> &EditTarget {
        &self.target
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Sends `text` as a new message when unbound (binding the target), otherwise edits the bound
    /// message. Returns the message id that now shows `text`.
    pub async fn send_or_edit(&mut self, text: &str) -> SendResult<String> {
        if let EditTarget::Bound(id) = &self.target {
            self.bot.edit_message(&self.chat, id, text).await?;
            return Ok(id.clone());
        }
        let id = self
            .bot
            .send_message_and_return_id(&self.chat, text)
            .await?;
        debug!(chat_id = self.chat.id, message_id = %id, "Edit channel bound");
        self.target = EditTarget::Bound(id.clone());
        Ok(id)
    }

    /// Sends `text` as an independent message; the target is unchanged.
    pub async fn send_new(&self, text: &str) -> SendResult<()> {
        self.bot.send_message(&self.chat, text).await
    }
}
