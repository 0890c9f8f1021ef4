//! Relay publisher: owns the state of one reply while it streams in.
//!
//! Fragments are appended in arrival order. Intermediate publishes go out when the
//! [`PublishThrottle`] allows; their failures never abort the relay. Once the stream ends the
//! full text is flushed with one final edit, falling back to a new message if that edit fails.

use std::time::Duration;

use futures::{Stream, StreamExt};
use llm_client::StreamFragment;
use telegram_bot::{DownstreamError, EditChannel, SendResult};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::PublishThrottle;

/// Sent when the stream produced no text at all.
pub const MSG_EMPTY_REPLY: &str = "I couldn't generate a response. Please try again.";

/// Rate-limit waits absorbed per publish before that publish is given up.
const MAX_RATE_LIMIT_WAITS: u32 = 5;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Pause after each intermediate publish attempt.
    pub pacing: Duration,
    /// Pause after a transient failure of an intermediate publish.
    pub transient_cooldown: Duration,
    pub empty_reply: String,
    pub throttle: PublishThrottle,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(500),
            transient_cooldown: Duration::from_secs(1),
            empty_reply: MSG_EMPTY_REPLY.to_string(),
            throttle: PublishThrottle::default(),
        }
    }
}

/// How the final text reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Shown through the edit channel: an edit of the bound message, or its first send.
    Edited,
    /// The final edit failed and the text was sent as a separate message.
    SentNew,
    /// Neither worked; the user sees the last partial publish, if any.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub text: String,
    pub delivery: Delivery,
}

/// Relays one fragment stream into one chat message. Not shared between replies.
pub struct RelayPublisher {
    channel: EditChannel,
    settings: RelaySettings,
    accumulated: String,
    accumulated_chars: usize,
    /// Character count at the last intermediate publish attempt.
    checkpoint: usize,
    last_publish: Option<Instant>,
    /// Byte length of the text the bound message is known to show.
    shown_len: Option<usize>,
}

impl RelayPublisher {
    pub fn new(channel: EditChannel, settings: RelaySettings) -> Self {
        Self {
            channel,
            settings,
            accumulated: String::new(),
            accumulated_chars: 0,
            checkpoint: 0,
            last_publish: None,
            shown_len: None,
        }
    }

    /// Consumes `fragments` to the end, then flushes the final text.
    pub async fn run<S>(mut self, mut fragments: S) -> RelayOutcome
    where
        S: Stream<Item = StreamFragment> + Unpin,
    {
        let chat_id = self.channel.chat().id;
        while let Some(fragment) = fragments.next().await {
            debug!(chat_id, kind = ?fragment.kind, len = fragment.text.len(), "Fragment received");
            self.accumulated.push_str(&fragment.text);
            self.accumulated_chars += fragment.text.chars().count();

            if self.settings.throttle.should_publish(
                self.accumulated_chars,
                self.checkpoint,
                self.last_publish,
            ) {
                self.publish_partial().await;
            }
        }
        self.finish().await
    }

    async fn publish_partial(&mut self) {
        self.checkpoint = self.accumulated_chars;
        let text = self.accumulated.clone();
        let result = self.send_absorbing_rate_limits(&text).await;
        self.last_publish = Some(Instant::now());
        match result {
            Ok(()) => {
                self.shown_len = Some(text.len());
                sleep(self.settings.pacing).await;
            }
            Err(DownstreamError::Transient(reason)) => {
                warn!(reason = %reason, "Partial publish failed; continuing");
                sleep(self.settings.transient_cooldown).await;
            }
            Err(e) => {
                error!(error = %e, "Partial publish failed; continuing");
                sleep(self.settings.pacing).await;
            }
        }
    }

    /// `send_or_edit`, sleeping out rate limits and retrying the same text.
    async fn send_absorbing_rate_limits(&mut self, text: &str) -> SendResult<()> {
        let mut waits = 0;
        loop {
            match self.channel.send_or_edit(text).await {
                Ok(_) => return Ok(()),
                Err(DownstreamError::RateLimited(wait)) if waits < MAX_RATE_LIMIT_WAITS => {
                    waits += 1;
                    warn!(wait_secs = wait.as_secs_f64(), waits, "Rate limited; waiting before retry");
                    sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_new_absorbing_rate_limits(&self, text: &str) -> SendResult<()> {
        let mut waits = 0;
        loop {
            match self.channel.send_new(text).await {
                Ok(()) => return Ok(()),
                Err(DownstreamError::RateLimited(wait)) if waits < MAX_RATE_LIMIT_WAITS => {
                    waits += 1;
                    warn!(wait_secs = wait.as_secs_f64(), waits, "Rate limited; waiting before retry");
                    sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn finish(mut self) -> RelayOutcome {
        let chat_id = self.channel.chat().id;
        let text = if self.accumulated.is_empty() {
            info!(chat_id, "Stream produced no text");
            self.settings.empty_reply.clone()
        } else {
            std::mem::take(&mut self.accumulated)
        };

        if self.shown_len == Some(text.len()) && self.channel.target().is_bound() {
            debug!(chat_id, "Final text already published");
            return RelayOutcome {
                text,
                delivery: Delivery::Edited,
            };
        }

        let delivery = match self.send_absorbing_rate_limits(&text).await {
            Ok(()) => Delivery::Edited,
            Err(e) => {
                warn!(chat_id, error = %e, "Final edit failed; sending as new message");
                match self.send_new_absorbing_rate_limits(&text).await {
                    Ok(()) => Delivery::SentNew,
                    Err(e) => {
                        error!(chat_id, error = %e, "Failed to deliver final reply");
                        Delivery::Failed
                    }
                }
            }
        };
        info!(chat_id, len = text.len(), delivery = ?delivery, "Relay finished");
        RelayOutcome { text, delivery }
    }
}
