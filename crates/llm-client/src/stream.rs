//! Fragment stream: opens the upstream completion, relays deltas, and applies the retry policy.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};

use crate::{CompletionRequest, LlmClient, RetryDecision, RetryPolicy, StreamFragment, UpstreamError};

/// Finite, non-restartable sequence of fragments for one request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = StreamFragment> + Send>>;

/// Streams the completion for `request`.
///
/// Opening the stream and every wait for the next delta are bounded by `request.timeout`.
/// Timeouts and connectivity failures are retried per `policy`, with a notice fragment before
/// each backoff sleep. Any terminal failure becomes one final fragment; the stream itself never
/// errors.
pub fn stream_completion(
    client: Arc<dyn LlmClient>,
    request: CompletionRequest,
    policy: RetryPolicy,
) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut retries_done: u32 = 0;
        loop {
            debug!(model = %request.model, attempt = retries_done + 1, "Opening completion stream");
            let mut failure: Option<UpstreamError> = None;
            match timeout(request.timeout, client.open_stream(&request)).await {
                Err(_) => failure = Some(UpstreamError::Timeout),
                Ok(Err(e)) => failure = Some(e),
                Ok(Ok(mut deltas)) => loop {
                    match timeout(request.timeout, deltas.next()).await {
                        Err(_) => {
                            failure = Some(UpstreamError::Timeout);
                            break;
                        }
                        Ok(None) => break,
                        Ok(Some(Err(e))) => {
                            failure = Some(e);
                            break;
                        }
                        Ok(Some(Ok(text))) => yield StreamFragment::delta(text),
                    }
                },
            }

            let Some(error) = failure else {
                debug!(model = %request.model, "Completion stream finished");
                break;
            };

            match policy.decide(&error, retries_done) {
                RetryDecision::Retry { delay, notice } => {
                    retries_done += 1;
                    warn!(
                        error = %error,
                        retry = retries_done,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream request failed; retrying"
                    );
                    yield StreamFragment::retry_notice(notice);
                    sleep(delay).await;
                }
                RetryDecision::Terminate { message } => {
                    error!(error = %error, retries = retries_done, "Upstream request failed; giving up");
                    yield StreamFragment::failure(message);
                    break;
                }
            }
        }
    })
}
