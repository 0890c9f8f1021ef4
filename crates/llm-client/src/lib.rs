//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait, an OpenAI implementation, and [`stream_completion`], which
//! turns one [`CompletionRequest`] into a finite stream of [`StreamFragment`]s with timeout
//! handling and exponential-backoff retries applied. Transport-agnostic; used by telegram-llm-bot.

use async_trait::async_trait;

mod config;
mod openai_llm;
mod request;
mod retry;
mod stream;

pub use config::{EnvLlmConfig, LlmConfig};
pub use openai_client::{DeltaStream, UpstreamError};
pub use openai_llm::{provider_http_client, OpenAILlmClient};
pub use request::{
    CompletionRequest, FragmentKind, StreamFragment, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SYSTEM_PROMPT,
};
pub use retry::{
    RetryDecision, RetryPolicy, MSG_CONNECTION_NOTICE, MSG_RETRIES_EXHAUSTED, MSG_TIMEOUT_NOTICE,
};
pub use stream::{stream_completion, FragmentStream};

/// LLM client interface: opens one streamed completion for a request.
///
/// Implementations only open the stream and classify failures; timeouts and retries are applied
/// by [`stream_completion`] so every implementation gets the same policy.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, UpstreamError>;
}
