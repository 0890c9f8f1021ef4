//! Request and fragment types for one streamed completion.

use std::time::Duration;

/// Default per-request timeout (opening the stream, and each wait for the next delta).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default system instruction sent ahead of the user's prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// One completion request, built per user message and dropped once its stream ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub system_prompt: String,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Where a fragment came from. The relay appends every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Model output.
    Delta,
    /// User-visible notice emitted before a retry sleep.
    RetryNotice,
    /// Final user-visible failure description; always the last fragment of its stream.
    Failure,
}

/// A piece of text to append to the reply, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFragment {
    pub text: String,
    pub kind: FragmentKind,
}

impl StreamFragment {
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::Delta,
        }
    }

    pub fn retry_notice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::RetryNotice,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::Failure,
        }
    }
}
