//! Shared test doubles: a recording [`Bot`] and [`PlatformClient`], and a counting [`Connector`].

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use telegram_bot::{
    Bot, Chat, Connector, DownstreamError, Message, MessageDirection, PlatformClient, SendResult,
    Session, UpdateSink, User,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(String),
    Edit { message_id: String, text: String },
    SetWebhook { url: String, secret: Option<String> },
    DeleteWebhook,
    StartPolling,
    StopReceiver,
}

/// Records every call; each call pops the next scripted failure, if any.
#[derive(Default)]
pub struct RecordingClient {
    pub calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<Option<DownstreamError>>>,
    next_id: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(100),
            ..Self::default()
        })
    }

    /// Queues outcomes for the next calls: `None` succeeds, `Some(e)` fails with `e`.
    pub fn script(&self, outcomes: Vec<Option<DownstreamError>>) {
        self.failures.lock().unwrap().extend(outcomes);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> SendResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().pop_front().flatten() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Bot for RecordingClient {
    async fn send_message(&self, _chat: &Chat, text: &str) -> SendResult<()> {
        self.record(Call::Send(text.to_string()))
    }

    async fn send_message_and_return_id(&self, _chat: &Chat, text: &str) -> SendResult<String> {
        self.record(Call::Send(text.to_string()))?;
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn edit_message(&self, _chat: &Chat, message_id: &str, text: &str) -> SendResult<()> {
        self.record(Call::Edit {
            message_id: message_id.to_string(),
            text: text.to_string(),
        })
    }
}

#[async_trait]
impl PlatformClient for RecordingClient {
    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> SendResult<()> {
        self.record(Call::SetWebhook {
            url: url.to_string(),
            secret: secret.map(str::to_string),
        })
    }

    async fn delete_webhook(&self) -> SendResult<()> {
        self.record(Call::DeleteWebhook)
    }

    async fn webhook_info(&self) -> SendResult<serde_json::Value> {
        Ok(serde_json::json!({ "url": "https://example.com/webhook", "pending_update_count": 0 }))
    }

    async fn start_polling(&self, _sink: UpdateSink) -> SendResult<()> {
        self.record(Call::StartPolling)
    }

    async fn stop_receiver(&self) -> SendResult<()> {
        self.record(Call::StopReceiver)
    }
}

/// Hands out a fresh [`RecordingClient`] per connect and keeps every one it created.
#[derive(Default)]
pub struct CountingConnector {
    pub connects: AtomicUsize,
    pub clients: Mutex<Vec<Arc<RecordingClient>>>,
    /// When set, connect fails with this error.
    pub fail_with: Mutex<Option<DownstreamError>>,
    /// Outcomes scripted onto each new client.
    pub script: Mutex<Vec<Option<DownstreamError>>>,
}

impl CountingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last_client(&self) -> Arc<RecordingClient> {
        self.clients.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self) -> SendResult<Session> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.fail_with.lock().unwrap().clone() {
            return Err(e);
        }
        let client = RecordingClient::new();
        client.script(self.script.lock().unwrap().clone());
        self.clients.lock().unwrap().push(client.clone());
        Ok(Session::new(client, Some("testbot".to_string())))
    }
}

pub fn test_chat() -> Chat {
    Chat {
        id: 456,
        chat_type: "private".to_string(),
    }
}

pub fn test_message(content: &str) -> Message {
    Message {
        id: "test_message_id".to_string(),
        content: content.to_string(),
        user: User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: test_chat(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
        reply_to_message_id: None,
    }
}
