//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for streaming chat completions.
//! Every failure is classified into an [`UpstreamError`] so callers can pick a retry policy
//! without inspecting provider-specific error types.

use async_openai::error::OpenAIError;
use async_openai::{types::CreateChatCompletionRequestArgs, Client};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

pub use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
};

/// Text deltas of one streamed completion, in arrival order. Empty deltas are never yielded.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// Upstream failure kinds. Timeout and Connection are retriable; Provider and Unexpected are not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Unexpected(String),
}

impl UpstreamError {
    /// True for timeout and connectivity failures.
    pub fn is_retriable(&self) -> bool {
        matches!(self, UpstreamError::Timeout | UpstreamError::Connection(_))
    }
}

/// Status line prefix reqwest-eventsource uses when the provider answers a stream with a non-2xx status.
const INVALID_STATUS_MARKER: &str = "Invalid status code";

/// Maps an async-openai error onto the upstream taxonomy.
pub fn classify_error(error: OpenAIError) -> UpstreamError {
    match error {
        OpenAIError::Reqwest(e) if e.is_timeout() => UpstreamError::Timeout,
        OpenAIError::Reqwest(e) if e.is_connect() || e.is_request() || e.is_body() => {
            UpstreamError::Connection(e.to_string())
        }
        OpenAIError::Reqwest(e) => UpstreamError::Unexpected(e.to_string()),
        OpenAIError::ApiError(e) => UpstreamError::Provider(e.to_string()),
        OpenAIError::InvalidArgument(msg) => UpstreamError::Provider(msg),
        OpenAIError::StreamError(msg) => classify_stream_error(msg),
        other => UpstreamError::Unexpected(other.to_string()),
    }
}

/// Stream errors arrive as strings. A bad HTTP status (auth failure, malformed request) is a
/// provider error; everything else is the event source losing its transport.
fn classify_stream_error(msg: String) -> UpstreamError {
    if msg.contains(INVALID_STATUS_MARKER) {
        UpstreamError::Provider(msg)
    } else if msg.to_ascii_lowercase().contains("timed out") {
        UpstreamError::Timeout
    } else {
        UpstreamError::Connection(msg)
    }
}

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 {
        "***".to_string()
    } else {
        let head_len = 7.min(len);
        let tail_len = 4.min(len.saturating_sub(head_len));
        let head = &token[..head_len];
        let tail = if tail_len > 0 {
            &token[len - tail_len..]
        } else {
            ""
        };
        format!("{}***{}", head, tail)
    }
}

/// OpenAI chat client. Wraps async-openai client and keeps the API key for masked logging.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// API key stored only for logging (masked).
    api_key_for_logging: String,
}

impl OpenAIClient {
    /// Builds a client using the given API key and default API base URL.
    pub fn new(api_key: String) -> Self {
        let api_key_for_logging = api_key.clone();
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging,
        }
    }

    /// Builds a client with a custom base URL (e.g. for proxies or compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let api_key_for_logging = api_key.clone();
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging,
        }
    }

    /// Replaces the HTTP client, e.g. one configured with an outbound proxy.
    pub fn with_http_client(self, http_client: reqwest::Client) -> Self {
        let client = Arc::unwrap_or_clone(self.client).with_http_client(http_client);
        Self {
            client: Arc::new(client),
            api_key_for_logging: self.api_key_for_logging,
        }
    }

    fn masked_key(&self) -> String {
        mask_token(&self.api_key_for_logging)
    }

    /// Opens a streaming chat completion and returns its text deltas.
    ///
    /// Opening the stream may already fail (bad arguments, connection refused); failures during
    /// the stream are yielded as `Err` items and end the useful part of the stream.
    pub async fn chat_completion_stream(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<DeltaStream, UpstreamError> {
        tracing::debug!(
            model = %model,
            message_count = messages.len(),
            api_key = %self.masked_key(),
            "OpenAI chat_completion_stream request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .stream(true)
            .build()
            .map_err(classify_error)?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::trace!(request_json = %json, "OpenAI stream request JSON");
        }

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(classify_error)?;

        let deltas = stream.filter_map(|item| async move {
            match item {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|content| !content.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(classify_error(e))),
            }
        });
        Ok(Box::pin(deltas))
    }
}
