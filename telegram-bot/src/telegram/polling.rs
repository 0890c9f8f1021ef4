//! Long-polling update receiver, used when no public webhook URL is available.

use std::time::Duration;

use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use super::adapters::message_from_update;
use super::bot_adapter::classify_request_error;
use super::connector::UpdateSink;
use crate::core::DownstreamError;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub(crate) const POLL_TIMEOUT_SECS: u32 = 10;

const BASE_BACKOFF: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Delay before the next poll after `failures` consecutive failures (1-based): 5s doubling, capped at 300s.
pub fn polling_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    BASE_BACKOFF
        .saturating_mul(1u32 << exponent)
        .min(MAX_BACKOFF)
}

/// Polls getUpdates until aborted, a fatal error, or more than `max_retries` consecutive failures.
pub(crate) async fn run_polling(bot: teloxide::Bot, sink: UpdateSink, max_retries: u32) {
    let mut offset: i32 = 0;
    let mut failures: u32 = 0;
    info!(max_retries, "Polling for updates");

    loop {
        let result = bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .await;
        match result {
            Ok(updates) => {
                failures = 0;
                for update in updates {
                    offset = update.id.as_offset();
                    match message_from_update(&update) {
                        Some(message) => sink(message),
                        None => debug!(update_id = offset, "Skipping non-message update"),
                    }
                }
            }
            Err(e) => match classify_request_error(e) {
                DownstreamError::RateLimited(wait) => {
                    warn!(wait_secs = wait.as_secs(), "Polling rate limited");
                    tokio::time::sleep(wait).await;
                }
                DownstreamError::Transient(reason) => {
                    failures += 1;
                    if failures > max_retries {
                        error!(failures, reason = %reason, "Polling gave up after repeated failures");
                        return;
                    }
                    let delay = polling_backoff(failures);
                    warn!(failures, delay_secs = delay.as_secs(), reason = %reason, "Polling failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                DownstreamError::Fatal(reason) => {
                    error!(reason = %reason, "Polling stopped");
                    return;
                }
            },
        }
    }
}
