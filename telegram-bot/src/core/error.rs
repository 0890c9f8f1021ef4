//! Error types for the bot core.
//!
//! [`DbotError`] is the top-level error; [`DownstreamError`] classifies chat-platform failures
//! into the three kinds callers recover from differently; [`SessionError`] covers lifecycle
//! operations on the platform session.

use std::time::Duration;

use thiserror::Error;

/// Failure of a send/edit/management call against the chat platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    /// The platform asked us to wait before the next call.
    #[error("Rate limited: retry after {}s", .0.as_secs())]
    RateLimited(Duration),

    /// Network-level failure; the same call may succeed later.
    #[error("Network error: {0}")]
    Transient(String),

    /// Anything else (API rejection, bad payload).
    #[error("Bot error: {0}")]
    Fatal(String),
}

/// Errors from session lifecycle and webhook management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Bot not initialized")]
    NotInitialized,

    #[error("Webhook URL not configured")]
    WebhookUrlMissing,

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error(transparent)]
    Platform(#[from] DownstreamError),
}

/// Top-level error for handlers and the framework.
#[derive(Error, Debug)]
pub enum DbotError {
    #[error(transparent)]
    Bot(#[from] DownstreamError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result type for core operations; uses [`DbotError`].
pub type Result<T> = std::result::Result<T, DbotError>;
