//! Session lifecycle: owns at most one live platform session and serializes every transition.
//!
//! `setup`, `shutdown`, `restart`, `register_webhook` and `start_polling` hold the lifecycle lock
//! for their whole duration. `status` and `current` only read a snapshot and never wait on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, instrument, warn};

use super::connector::{Connector, PlatformClient, UpdateSink};
use crate::core::{Bot, Chat, DownstreamError, Message, SendResult, SessionError};

/// A live connection to the platform.
pub struct Session {
    bot: Arc<dyn Bot>,
    client: Arc<dyn PlatformClient>,
    username: Option<String>,
    running: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new<C: PlatformClient + 'static>(client: Arc<C>, username: Option<String>) -> Self {
        Self {
            bot: client.clone(),
            client,
            username,
            running: AtomicBool::new(true),
        }
    }

    /// Send/edit handle for handlers.
    pub fn bot(&self) -> Arc<dyn Bot> {
        self.bot.clone()
    }

    pub fn client(&self) -> &Arc<dyn PlatformClient> {
        &self.client
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: LifecycleState,
    /// A session exists and update delivery (webhook or polling) is registered.
    pub connected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Default)]
struct Snapshot {
    state: LifecycleState,
    session: Option<Arc<Session>>,
    connected: bool,
}

type LifecycleGuard<'a> = MutexGuard<'a, ()>;

/// Armed while a connect is in flight. If the connecting future is dropped (e.g. the HTTP
/// request driving `/restart` went away) the snapshot goes back to `Uninitialized` instead of
/// staying `Initializing` with no session.
struct PendingConnect<'a> {
    snapshot: &'a RwLock<Snapshot>,
    armed: bool,
}

impl<'a> PendingConnect<'a> {
    fn new(snapshot: &'a RwLock<Snapshot>) -> Self {
        Self {
            snapshot,
            armed: true,
        }
    }

    /// The connect finished; the caller records the outcome.
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingConnect<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Session setup interrupted; reverting to uninitialized");
        // Readers only hold the lock briefly; if one is active the next setup or shutdown resets.
        if let Ok(mut snapshot) = self.snapshot.try_write() {
            if snapshot.session.is_none() {
                *snapshot = Snapshot::default();
            }
        }
    }
}

pub struct SessionManager {
    connector: Arc<dyn Connector>,
    webhook: WebhookSettings,
    lifecycle: Mutex<()>,
    snapshot: RwLock<Snapshot>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>, webhook: WebhookSettings) -> Self {
        Self {
            connector,
            webhook,
            lifecycle: Mutex::new(()),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn webhook_settings(&self) -> &WebhookSettings {
        &self.webhook
    }

    pub async fn status(&self) -> SessionStatus {
        let snapshot = self.snapshot.read().await;
        SessionStatus {
            state: snapshot.state,
            connected: snapshot.connected && snapshot.session.is_some(),
        }
    }

    /// The live session, if one exists.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.snapshot.read().await.session.clone()
    }

    /// Connects if no session exists; otherwise returns the existing one.
    pub async fn setup(&self) -> Result<Arc<Session>, SessionError> {
        let guard = self.lifecycle.lock().await;
        self.setup_locked(&guard).await
    }

    /// Stops the receiver and drops the session. Always ends Uninitialized, even if stopping fails.
    pub async fn shutdown(&self) {
        let guard = self.lifecycle.lock().await;
        self.shutdown_locked(&guard).await;
    }

    /// Shutdown, fresh session, webhook registration; one critical section.
    #[instrument(skip(self))]
    pub async fn restart(&self) -> Result<(), SessionError> {
        let guard = self.lifecycle.lock().await;
        info!("Restarting bot session");
        self.shutdown_locked(&guard).await;
        self.register_webhook_locked(&guard).await
    }

    /// Ensures a session and registers the configured webhook URL with the platform.
    pub async fn register_webhook(&self) -> Result<(), SessionError> {
        let guard = self.lifecycle.lock().await;
        self.register_webhook_locked(&guard).await
    }

    /// Ensures a session and starts the polling receiver feeding `sink`.
    pub async fn start_polling(&self, sink: UpdateSink) -> Result<(), SessionError> {
        let guard = self.lifecycle.lock().await;
        let session = self.setup_locked(&guard).await?;
        session.client().start_polling(sink).await?;
        self.snapshot.write().await.connected = true;
        Ok(())
    }

    pub async fn remove_webhook(&self) -> Result<(), SessionError> {
        let session = self.current().await.ok_or(SessionError::NotInitialized)?;
        session.client().delete_webhook().await?;
        self.snapshot.write().await.connected = false;
        Ok(())
    }

    pub async fn webhook_info(&self) -> Result<serde_json::Value, SessionError> {
        let session = self.current().await.ok_or(SessionError::NotInitialized)?;
        Ok(session.client().webhook_info().await?)
    }

    async fn setup_locked(&self, _guard: &LifecycleGuard<'_>) -> Result<Arc<Session>, SessionError> {
        if let Some(session) = self.current().await {
            debug!("Session already exists, reusing it");
            return Ok(session);
        }
        self.snapshot.write().await.state = LifecycleState::Initializing;
        info!("Creating new bot session");

        let pending = PendingConnect::new(&self.snapshot);
        let connected = self.connector.connect().await;
        pending.settle();
        match connected {
            Ok(session) => {
                let session = Arc::new(session);
                let mut snapshot = self.snapshot.write().await;
                snapshot.session = Some(session.clone());
                snapshot.state = LifecycleState::Ready;
                info!(username = ?session.username(), "Bot session ready");
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, "Failed to create bot session");
                *self.snapshot.write().await = Snapshot::default();
                Err(SessionError::Connect(e.to_string()))
            }
        }
    }

    async fn shutdown_locked(&self, guard: &LifecycleGuard<'_>) {
        let Some(session) = self.current().await else {
            debug!("No bot session to shut down");
            self.reset(guard).await;
            return;
        };
        self.snapshot.write().await.state = LifecycleState::ShuttingDown;
        info!("Shutting down bot session");

        if session.running.swap(false, Ordering::SeqCst) {
            if let Err(e) = session.client().stop_receiver().await {
                error!(error = %e, "Error stopping update receiver");
            }
        }
        self.reset(guard).await;
        info!("Bot session shutdown completed");
    }

    /// Clears every field back to the initial state in one write.
    async fn reset(&self, _guard: &LifecycleGuard<'_>) {
        *self.snapshot.write().await = Snapshot::default();
    }

    async fn register_webhook_locked(&self, guard: &LifecycleGuard<'_>) -> Result<(), SessionError> {
        let session = self.setup_locked(guard).await?;
        let Some(url) = self.webhook.url.as_deref() else {
            warn!("Webhook URL not configured");
            self.snapshot.write().await.connected = false;
            return Err(SessionError::WebhookUrlMissing);
        };

        info!(url = %url, "Setting webhook");
        match session
            .client()
            .set_webhook(url, self.webhook.secret.as_deref())
            .await
        {
            Ok(()) => {
                self.snapshot.write().await.connected = true;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to set webhook");
                self.snapshot.write().await.connected = false;
                Err(e.into())
            }
        }
    }
}

/// [`Bot`] that resolves the current session on every call, so handlers built once keep
/// working across restarts. Fails with `Fatal` while no session exists.
#[derive(Clone)]
pub struct SessionBot {
    sessions: Arc<SessionManager>,
}

impl SessionBot {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    async fn bot(&self) -> SendResult<Arc<dyn Bot>> {
        self.sessions
            .current()
            .await
            .map(|s| s.bot())
            .ok_or_else(|| DownstreamError::Fatal(SessionError::NotInitialized.to_string()))
    }
}

#[async_trait]
impl Bot for SessionBot {
    async fn send_message(&self, chat: &Chat, text: &str) -> SendResult<()> {
        self.bot().await?.send_message(chat, text).await
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> SendResult<String> {
        self.bot().await?.send_message_and_return_id(chat, text).await
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> SendResult<()> {
        self.bot().await?.edit_message(chat, message_id, text).await
    }

    async fn reply_to(&self, message: &Message, text: &str) -> SendResult<()> {
        self.bot().await?.reply_to(message, text).await
    }
}
