//! Test doubles for the relay, handlers, dispatcher and gateway: a recording chat platform, a
//! connector handing it out, and a scripted LLM client.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{stream, StreamExt};
use llm_client::{
    CompletionRequest, DeltaStream, LlmClient, LlmConfig, RetryPolicy, UpstreamError,
};
use telegram_bot::{
    Bot, BotConfig, Chat, Connector, DownstreamError, Message, MessageDirection, PlatformClient,
    SendResult, Session, UpdateSink, User,
};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { chat_id: i64, text: String },
    Edit { chat_id: i64, message_id: String, text: String },
    SetWebhook(String),
    DeleteWebhook,
    StopReceiver,
}

impl Call {
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Chat platform double: records every call with the (tokio) time it happened; each call pops
/// the next scripted outcome.
#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<(Instant, Call)>>,
    outcomes: Mutex<VecDeque<Option<DownstreamError>>>,
    next_id: AtomicUsize,
    /// Artificial latency per send/edit.
    pub latency: Mutex<Duration>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(1),
            ..Self::default()
        })
    }

    /// `None` succeeds, `Some(e)` fails with `e`; consumed one per call.
    pub fn script(&self, outcomes: Vec<Option<DownstreamError>>) {
        self.outcomes.lock().unwrap().extend(outcomes);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts_for_chat(&self, chat_id: i64) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| match c {
                Call::Send { chat_id: id, .. } | Call::Edit { chat_id: id, .. } => *id == chat_id,
                _ => false,
            })
            .collect()
    }

    async fn record(&self, call: Call) -> SendResult<()> {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.calls.lock().unwrap().push((Instant::now(), call));
        match self.outcomes.lock().unwrap().pop_front().flatten() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Bot for MockPlatform {
    async fn send_message(&self, chat: &Chat, text: &str) -> SendResult<()> {
        self.record(Call::Send {
            chat_id: chat.id,
            text: text.to_string(),
        })
        .await
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> SendResult<String> {
        self.send_message(chat, text).await?;
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> SendResult<()> {
        self.record(Call::Edit {
            chat_id: chat.id,
            message_id: message_id.to_string(),
            text: text.to_string(),
        })
        .await
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn set_webhook(&self, url: &str, _secret: Option<&str>) -> SendResult<()> {
        self.record(Call::SetWebhook(url.to_string())).await
    }

    async fn delete_webhook(&self) -> SendResult<()> {
        self.record(Call::DeleteWebhook).await
    }

    async fn webhook_info(&self) -> SendResult<serde_json::Value> {
        Ok(serde_json::json!({
            "url": "https://example.com/webhook",
            "has_custom_certificate": false,
            "pending_update_count": 0
        }))
    }

    async fn start_polling(&self, _sink: UpdateSink) -> SendResult<()> {
        Ok(())
    }

    async fn stop_receiver(&self) -> SendResult<()> {
        self.record(Call::StopReceiver).await
    }
}

/// Always hands out the same platform double.
pub struct MockConnector {
    pub platform: Arc<MockPlatform>,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(platform: Arc<MockPlatform>) -> Arc<Self> {
        Arc::new(Self {
            platform,
            connects: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> SendResult<Session> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Session::new(self.platform.clone(), Some("testbot".to_string())))
    }
}

/// LLM double: answers each prompt with the configured deltas; records prompts.
#[derive(Default)]
pub struct ScriptedLlm {
    deltas: Vec<String>,
    /// Pause before each delta.
    delay: Duration,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(deltas: &[&str]) -> Arc<Self> {
        Self::with_delay(deltas, Duration::ZERO)
    }

    pub fn with_delay(deltas: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, UpstreamError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let delay = self.delay;
        let deltas = self.deltas.clone();
        Ok(Box::pin(stream::iter(deltas).then(move |d| async move {
            tokio::time::sleep(delay).await;
            Ok::<String, UpstreamError>(d)
        })))
    }
}

/// Fixed LLM settings for tests.
pub struct StaticLlmConfig;

impl LlmConfig for StaticLlmConfig {
    fn api_key(&self) -> &str {
        "test-key"
    }
    fn base_url(&self) -> Option<&str> {
        None
    }
    fn model(&self) -> &str {
        "gpt-4o-mini"
    }
    fn system_prompt(&self) -> &str {
        "You are a helpful assistant."
    }
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

/// Config as `BotConfig::load` would build it, without touching the environment.
pub fn test_config(production: bool) -> BotConfig {
    BotConfig {
        base: telegram_bot::BaseConfig {
            bot_token: "test_token".to_string(),
            telegram_api_url: None,
            webhook_url: Some("https://example.com/webhook".to_string()),
            webhook_secret: Some("s3cret".to_string()),
            http_proxy: None,
            https_proxy: None,
            max_connection_retries: 5,
            environment: if production { "production" } else { "development" }.to_string(),
            log_file: "logs/test.log".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            telegram_edit_interval_secs: 0,
            relay_publish_every_chars: 20,
            thinking_message: "Thinking...".to_string(),
        },
    }
}

pub fn chat(id: i64) -> Chat {
    Chat {
        id,
        chat_type: "private".to_string(),
    }
}

pub fn message_from(user_id: i64, content: &str) -> Message {
    Message {
        id: format!("{}-{}", user_id, content.len()),
        user: User {
            id: user_id,
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: chat(user_id),
        content: content.to_string(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
        reply_to_message_id: None,
    }
}
