//! OpenAI implementation of [`LlmClient`]: wraps openai-client and prepends the system message.

use std::time::Duration;

use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, DeltaStream, OpenAIClient, UpstreamError,
};
use tracing::instrument;

use crate::{CompletionRequest, LlmClient};

/// HTTP client for provider traffic. Proxies come only from the arguments; the process
/// environment is ignored. No overall request timeout: streams are bounded per chunk instead.
pub fn provider_http_client(
    http_proxy: Option<&str>,
    https_proxy: Option<&str>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .connect_timeout(Duration::from_secs(15));
    if let Some(proxy) = http_proxy {
        builder = builder.proxy(reqwest::Proxy::http(proxy)?);
    }
    if let Some(proxy) = https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    builder.build()
}

/// LlmClient backed by the OpenAI chat completions API (or any compatible base URL).
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: OpenAIClient,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: OpenAIClient::new(api_key),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: OpenAIClient::with_base_url(api_key, base_url),
        }
    }

    /// Routes provider traffic through the given HTTP client (proxy, custom TLS).
    pub fn with_http_client(self, http_client: reqwest::Client) -> Self {
        Self {
            client: self.client.with_http_client(http_client),
        }
    }

    fn build_messages(
        request: &CompletionRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, UpstreamError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.clone())
            .build()
            .map_err(openai_client::classify_error)?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.clone())
            .build()
            .map_err(openai_client::classify_error)?;
        Ok(vec![system.into(), user.into()])
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn open_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, UpstreamError> {
        let messages = Self::build_messages(request)?;
        self.client
            .chat_completion_stream(&request.model, messages)
            .await
    }
}
