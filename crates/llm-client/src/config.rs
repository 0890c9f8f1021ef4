//! LLM configuration: trait and env-based implementation.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::{RetryPolicy, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYSTEM_PROMPT};

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn system_prompt(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_policy(&self) -> RetryPolicy;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub llm_model: String,
    pub llm_system_prompt: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.openai_api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.openai_base_url.as_deref()
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn system_prompt(&self) -> &str {
        &self.llm_system_prompt
    }
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.llm_max_retries,
            ..RetryPolicy::default()
        }
    }
}

impl EnvLlmConfig {
    /// Load from environment variables. A missing API key is logged, not rejected: requests
    /// then fail at the provider and the user sees the provider's error.
    pub fn from_env() -> anyhow::Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.is_empty() {
            warn!("OPENAI_API_KEY is not set!");
        }
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let llm_model = env::var("OPENAI_MODEL")
            .or_else(|_| env::var("MODEL"))
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let llm_system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .or_else(|_| env::var("SYSTEM_PROMPT"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let llm_timeout_secs = parse_env("LLM_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT.as_secs());
        let llm_max_retries =
            parse_env("LLM_MAX_RETRIES")?.unwrap_or(RetryPolicy::default().max_retries);
        Ok(Self {
            openai_api_key,
            openai_base_url,
            llm_model,
            llm_system_prompt,
            llm_timeout_secs,
            llm_max_retries,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}
