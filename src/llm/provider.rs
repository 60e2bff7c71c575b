//! Provider trait and factory for LLM providers

use async_trait::async_trait;
use crate::llm::{
    types::{ChatRequest, ProviderResponse, ProviderConfig},
    errors::{LlmError, LlmResult},
    openai::OpenAIProvider,
    ollama::OllamaProvider,
};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and get a response
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;

    /// Validate the configuration
    fn validate_config(&self) -> LlmResult<()>;
}

/// Factory for creating LLM providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a new provider from configuration
    pub fn create_provider(config: ProviderConfig) -> LlmResult<Box<dyn LlmProvider>> {
        match config.provider_type.as_str() {
            "openai" => {
                let provider = OpenAIProvider::new(config)?;
                Ok(Box::new(provider))
            }
            "ollama" => {
                let provider = OllamaProvider::new(config)?;
                Ok(Box::new(provider))
            }
            _ => Err(LlmError::ConfigError(format!(
                "Unsupported provider type: {}",
                config.provider_type
            ))),
        }
    }

    /// Get available provider types
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "ollama"]
    }
}

/// Provider client options for flexible configuration
#[derive(Debug, Clone)]
pub struct ProviderClientOptions {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ProviderClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
            user_agent: format!("ragchat/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProviderClientOptions {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout_seconds: config.timeout_seconds,
            ..Default::default()
        }
    }
}

/// Utility functions for provider implementations
pub mod utils {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;
    use rand::Rng;

    /// Delay before retry `attempt`, exponential with jitter and capped at 30 seconds
    pub fn backoff_delay(attempt: u32, base_delay_ms: u64) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        let delay_ms = (base_delay_ms as f64 * 2.0_f64.powi(attempt as i32) * (1.0 + jitter)) as u64;
        Duration::from_millis(delay_ms.min(30_000))
    }

    /// Exponential backoff with jitter
    pub async fn exponential_backoff_with_jitter(attempt: u32, base_delay_ms: u64) {
        sleep(backoff_delay(attempt, base_delay_ms)).await;
    }

    /// Check if an error is retryable
    pub fn is_retryable_error(error: &LlmError) -> bool {
        match error {
            LlmError::RateLimitError(_) => true,
            LlmError::TimeoutError(_) => true,
            LlmError::ServerError(_) => true,
            LlmError::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map_or(false, |status| {
                        status.is_server_error() || status == 429 || status == 408
                    })
            }
            _ => false,
        }
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// `options.max_retries` retries are used up.
    pub async fn with_retries<T, F, Fut>(options: &ProviderClientOptions, mut attempt: F) -> LlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = LlmResult<T>>,
    {
        let mut retry = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if retry < options.max_retries && is_retryable_error(&error) => {
                    retry += 1;
                    tracing::warn!("Provider request failed ({}), retry {}/{}", error, retry, options.max_retries);
                    exponential_backoff_with_jitter(retry, options.retry_delay_ms).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Map a non-success HTTP status and its message onto an error variant
    pub fn classify_status(status: u16, error_msg: String) -> LlmError {
        match status {
            429 => LlmError::RateLimitError(error_msg),
            401 | 403 => LlmError::AuthError(error_msg),
            408 | 504 => LlmError::TimeoutError(error_msg),
            400 if error_msg.contains("context_length_exceeded") => {
                LlmError::ContextLimitError(error_msg)
            }
            500..=599 => LlmError::ServerError(error_msg),
            _ => LlmError::ApiError(error_msg),
        }
    }

    /// Sanitize content for safe display
    pub fn sanitize_content(content: &str) -> String {
        content
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    }

    /// Extract error message from HTTP response
    pub async fn extract_error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(text) => {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                    if let Some(message) = json
                        .get("error")
                        .and_then(|error| error.get("message").or(Some(error)))
                        .and_then(|message| message.as_str())
                    {
                        return format!("{}: {}", status, message);
                    }
                }
                format!("{}: {}", status, text)
            }
            Err(_) => format!("{}: Failed to read error response", status),
        }
    }
}
