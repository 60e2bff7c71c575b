use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    provider::{LlmProvider, ProviderClientOptions, utils},
    types::{ChatRequest, ProviderResponse, ProviderConfig, Message, TokenUsage, FinishReason},
    errors::{LlmError, LlmResult},
};

/// Ollama API configuration
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
    /// Sampling defaults from configuration, overridden per request
    defaults: OllamaOptions,
    options: ProviderClientOptions,
}

/// Ollama chat request format
#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Sampling options, nested under `options` in the request
#[derive(Debug, Clone, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Ollama chat completion request
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Ollama response format for chat
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let options = ProviderClientOptions::from_config(&config);
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = config
            .base_url
            .unwrap_or_else(|| "http://localhost:11434".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            default_model: config.model,
            defaults: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
                top_p: config.top_p,
            },
            options,
        })
    }

    /// Convert our Message format to Ollama's format
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }

    fn build_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.default_model.clone(),
            messages: Self::convert_messages(&request.full_messages()),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature.or(self.defaults.temperature),
                num_predict: request.max_tokens.or(self.defaults.num_predict),
                top_p: request.top_p.or(self.defaults.top_p),
            },
        }
    }

    async fn send_once(&self, url: &str, body: &OllamaChatRequest) -> LlmResult<OllamaChatResponse> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_msg = utils::extract_error_message(response).await;
            return Err(utils::classify_status(status, format!("Ollama API error {}", error_msg)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
        let url = format!("{}/api/chat", self.base_url);

        debug!("Sending Ollama chat request to: {}", url);

        let body = self.build_request(&request);
        let (url_ref, body_ref) = (url.as_str(), &body);
        let ollama_response =
            utils::with_retries(&self.options, move || self.send_once(url_ref, body_ref)).await?;

        let input_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let output_tokens = ollama_response.eval_count.unwrap_or(0);

        Ok(ProviderResponse {
            content: ollama_response.message.content,
            usage: TokenUsage {
                input_tokens,
                output_tokens,
                total_tokens: input_tokens + output_tokens,
            },
            finish_reason: if ollama_response.done { Some(FinishReason::Stop) } else { None },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn validate_config(&self) -> LlmResult<()> {
        if self.default_model.is_empty() {
            return Err(LlmError::ConfigError("Model is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_messages() {
        let messages = vec![
            Message::new_user("Hello"),
            Message::new_assistant("Hi there!"),
        ];

        let ollama_messages = OllamaProvider::convert_messages(&messages);

        assert_eq!(ollama_messages.len(), 2);
        assert_eq!(ollama_messages[0].role, "user");
        assert_eq!(ollama_messages[0].content, "Hello");
        assert_eq!(ollama_messages[1].role, "assistant");
        assert_eq!(ollama_messages[1].content, "Hi there!");
    }

    #[test]
    fn test_ollama_provider_creation() {
        let config = ProviderConfig {
            provider_type: "ollama".to_string(),
            model: "llama2".to_string(),
            base_url: None,
            ..Default::default()
        };
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.default_model, "llama2");
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama2");
    }

    #[test]
    fn test_ollama_provider_custom_url() {
        let config = ProviderConfig {
            provider_type: "ollama".to_string(),
            model: "mistral".to_string(),
            base_url: Some("http://custom-ollama:8080/".to_string()),
            ..Default::default()
        };
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.base_url, "http://custom-ollama:8080");
        assert_eq!(provider.default_model, "mistral");
    }

    #[test]
    fn test_request_nests_sampling_options() {
        let provider = OllamaProvider::new(ProviderConfig {
            model: "llama3".to_string(),
            temperature: None,
            ..Default::default()
        })
        .unwrap();
        let request = ChatRequest::new(vec![Message::new_user("title me")]).with_max_tokens(16);

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["options"]["num_predict"], 16);
        assert!(body["options"].get("temperature").is_none());
        assert!(body["options"].get("top_p").is_none());

        let request = ChatRequest::new(vec![Message::new_user("answer me")]);
        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["options"]["num_predict"], 1024);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_parse_chat_response() {
        let raw = r#"{"model":"llama3","message":{"role":"assistant","content":"Hello"},"done":true,"eval_count":4}"#;
        let response: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.message.content, "Hello");
        assert!(response.done);
        assert_eq!(response.eval_count, Some(4));
        assert_eq!(response.prompt_eval_count, None);
    }
}
