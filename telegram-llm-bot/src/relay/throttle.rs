//! Publish throttle: decides when an intermediate edit is worth sending.

use std::time::Duration;

use tokio::time::Instant;

/// Gate for intermediate publishes: the reply must have grown across a multiple of
/// `every_chars` since the last publish, and at least `min_interval` must have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishThrottle {
    every_chars: usize,
    min_interval: Duration,
}

impl Default for PublishThrottle {
    fn default() -> Self {
        Self::new(20, Duration::ZERO)
    }
}

impl PublishThrottle {
    /// `every_chars` is clamped to at least 1.
    pub fn new(every_chars: usize, min_interval: Duration) -> Self {
        Self {
            every_chars: every_chars.max(1),
            min_interval,
        }
    }

    pub fn every_chars(&self) -> usize {
        self.every_chars
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// `len` and `checkpoint` are character counts; `checkpoint` is the length at the last publish attempt.
    pub fn should_publish(&self, len: usize, checkpoint: usize, last_publish: Option<Instant>) -> bool {
        let crossed = len / self.every_chars > checkpoint / self.every_chars;
        let interval_ok = last_publish.map_or(true, |at| at.elapsed() >= self.min_interval);
        crossed && interval_ok
    }
}
