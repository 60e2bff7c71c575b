//! OpenAI provider implementation
//!
//! Talks to any OpenAI-compatible `/v1/chat/completions` endpoint.

use async_trait::async_trait;
use std::time::Duration;
use reqwest::{Client, header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE}};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::llm::{
    provider::{LlmProvider, ProviderClientOptions, utils},
    types::{ChatRequest, ProviderResponse, ProviderConfig, Message, TokenUsage, FinishReason},
    errors::{LlmError, LlmResult},
};

/// OpenAI API provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
    options: ProviderClientOptions,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = &config.api_key {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::ConfigError(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, auth_value);
        } else {
            return Err(LlmError::ConfigError("API key is required".to_string()));
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (key, value) in &config.extra_headers {
            let header_name: reqwest::header::HeaderName = key.parse()
                .map_err(|e| LlmError::ConfigError(format!("Invalid header name '{}': {}", key, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| LlmError::ConfigError(format!("Invalid header value for '{}': {}", key, e)))?;
            headers.insert(header_name, header_value);
        }

        let options = ProviderClientOptions::from_config(&config);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            options,
        })
    }

    /// Convert messages to OpenAI format
    fn convert_messages(messages: &[Message]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }

    /// Get the API endpoint URL
    fn get_endpoint(&self) -> String {
        let base_url = self.config.base_url.as_deref().unwrap_or("https://api.openai.com");
        format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
    }

    /// Build the JSON request body, request values taking precedence over config
    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut request_body = json!({
            "model": self.config.model,
            "messages": Self::convert_messages(&request.full_messages()),
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens.or(self.config.max_tokens) {
            request_body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = request.temperature.or(self.config.temperature) {
            request_body["temperature"] = json!(temperature);
        }

        if let Some(top_p) = request.top_p.or(self.config.top_p) {
            request_body["top_p"] = json!(top_p);
        }

        for (key, value) in &self.config.extra_body {
            request_body[key] = value.clone();
        }

        request_body
    }

    /// Send a single request without retries
    async fn send_once(&self, request_body: &serde_json::Value) -> LlmResult<OpenAIResponse> {
        let resp = self.client
            .post(self.get_endpoint())
            .json(request_body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json::<OpenAIResponse>().await?)
        } else {
            let status = resp.status().as_u16();
            let error_msg = utils::extract_error_message(resp).await;
            Err(utils::classify_status(status, error_msg))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
        let request_body = self.build_body(&request);
        debug!("Sending OpenAI chat request with {} messages", request.messages.len());

        let body = &request_body;
        let response = utils::with_retries(&self.options, move || self.send_once(body)).await?;

        let choice = response.choices.into_iter().next()
            .ok_or_else(|| LlmError::ApiError("No choices in response".to_string()))?;

        let usage = response.usage.map(|usage| TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }).unwrap_or_default();

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn validate_config(&self) -> LlmResult<()> {
        if self.config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(LlmError::ConfigError("API key is required".to_string()));
        }

        if self.config.model.is_empty() {
            return Err(LlmError::ConfigError("Model is required".to_string()));
        }

        Ok(())
    }
}

// OpenAI API types
#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
