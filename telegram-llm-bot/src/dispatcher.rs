//! Per-user dispatch: messages from one user run through the chain one at a time, in arrival
//! order; different users run concurrently.
//!
//! Each active user has an unbounded queue drained by one task. A queue that stays idle is
//! removed; removal happens under the map's shard lock and only when the queue is empty, so a
//! concurrent dispatch either lands in the old queue before removal or creates a new one after.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use telegram_bot::{HandlerChain, Message};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

type QueueSender = mpsc::UnboundedSender<Message>;

#[derive(Clone)]
pub struct UserDispatcher {
    chain: HandlerChain,
    queues: Arc<DashMap<i64, QueueSender>>,
    idle_timeout: Duration,
}

impl UserDispatcher {
    pub fn new(chain: HandlerChain) -> Self {
        Self {
            chain,
            queues: Arc::new(DashMap::new()),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// How long a user's queue task waits for the next message before exiting.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Users with a live queue.
    pub fn active_users(&self) -> usize {
        self.queues.len()
    }

    /// Enqueues `message` behind earlier messages from the same user. Must run inside a tokio runtime.
    pub fn dispatch(&self, message: Message) {
        let user_id = message.user.id;
        let mut queue = self
            .queues
            .entry(user_id)
            .or_insert_with(|| self.spawn_queue(user_id));
        if let Err(mpsc::error::SendError(message)) = queue.send(message) {
            // Only reachable if the queue task died without deregistering.
            warn!(user_id, "User queue closed unexpectedly; starting a new one");
            *queue = self.spawn_queue(user_id);
            if queue.send(message).is_err() {
                error!(user_id, "Failed to enqueue message");
            }
        }
    }

    fn spawn_queue(&self, user_id: i64) -> QueueSender {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(user_id, "Starting user queue");
        tokio::spawn(drain_queue(
            self.chain.clone(),
            self.queues.clone(),
            user_id,
            rx,
            self.idle_timeout,
        ));
        tx
    }
}

async fn drain_queue(
    chain: HandlerChain,
    queues: Arc<DashMap<i64, QueueSender>>,
    user_id: i64,
    mut rx: mpsc::UnboundedReceiver<Message>,
    idle_timeout: Duration,
) {
    loop {
        let message = match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => {
                let mut pending = None;
                queues.remove_if(&user_id, |_, _| match rx.try_recv() {
                    Ok(message) => {
                        pending = Some(message);
                        false
                    }
                    Err(_) => true,
                });
                match pending {
                    Some(message) => message,
                    None => break,
                }
            }
        };

        info!(user_id, chat_id = message.chat.id, message_id = %message.id, "Processing queued message");
        if let Err(e) = chain.handle(&message).await {
            error!(error = %e, user_id, "Handler chain failed");
        }
    }
    debug!(user_id, "User queue closed");
}
