//! Retry policy: maps an upstream error kind and the retry count onto what the stream does next.

use std::time::Duration;

use openai_client::UpstreamError;

/// Shown before retrying after a timeout.
pub const MSG_TIMEOUT_NOTICE: &str = "\n[Connection timeout. Retrying...]\n";
/// Shown before retrying after a connectivity failure.
pub const MSG_CONNECTION_NOTICE: &str = "\n[Connection issue. Retrying...]\n";
/// Shown once retriable failures exceed the retry ceiling.
pub const MSG_RETRIES_EXHAUSTED: &str =
    "\nSorry, I'm having trouble connecting to my AI services right now. Please try again in a moment.";

/// What to do after an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Emit `notice`, sleep `delay`, then reopen the request.
    Retry { delay: Duration, notice: String },
    /// Emit `message` and end the stream.
    Terminate { message: String },
}

/// Exponential backoff for retriable failures: `base_delay * 2^n` before retry `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retries_done + 1`.
    pub fn backoff(&self, retries_done: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retries_done))
    }

    /// Decides the next step given the error and how many retries already happened.
    pub fn decide(&self, error: &UpstreamError, retries_done: u32) -> RetryDecision {
        match error {
            UpstreamError::Timeout | UpstreamError::Connection(_) if retries_done < self.max_retries => {
                let notice = if matches!(error, UpstreamError::Timeout) {
                    MSG_TIMEOUT_NOTICE
                } else {
                    MSG_CONNECTION_NOTICE
                };
                RetryDecision::Retry {
                    delay: self.backoff(retries_done),
                    notice: notice.to_string(),
                }
            }
            UpstreamError::Timeout | UpstreamError::Connection(_) => RetryDecision::Terminate {
                message: MSG_RETRIES_EXHAUSTED.to_string(),
            },
            UpstreamError::Provider(e) => RetryDecision::Terminate {
                message: format!("\nSorry, there was an error with the AI service: {}", e),
            },
            UpstreamError::Unexpected(e) => RetryDecision::Terminate {
                message: format!("\nSorry, an unexpected error occurred: {}", e),
            },
        }
    }
}
