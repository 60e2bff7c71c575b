use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::{Path, PathBuf}};
use tracing::debug;

use crate::chatbot::DEFAULT_MAX_HISTORY;
use crate::llm::{ProviderConfig, ProviderFactory};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI provider type
    pub provider: String,

    /// API key
    pub api_key: Option<String>,

    /// Base URL for the API
    pub base_url: Option<String>,

    /// Model used to answer questions
    pub model: String,

    /// Model used for chat titles, defaults to `model`
    pub title_model: Option<String>,

    /// Maximum tokens for responses
    pub max_tokens: Option<u32>,

    /// Temperature for sampling
    pub temperature: Option<f32>,

    /// Top-p for nucleus sampling
    pub top_p: Option<f32>,

    /// Retries for transient provider failures
    pub max_retries: u32,

    /// HTTP request timeout
    pub timeout_seconds: u64,

    /// Extra headers for API requests
    pub extra_headers: HashMap<String, String>,

    /// Extra body parameters for API requests
    pub extra_body: HashMap<String, serde_json::Value>,

    /// System message for the answering service
    pub system_message: Option<String>,

    /// Earlier messages per session replayed to the answering model
    pub history_messages: usize,
}

/// Contents of a configuration file. Only the keys present in the file
/// override the environment.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub title_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_retries: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub history_messages: Option<usize>,
    pub extra_headers: Option<HashMap<String, String>>,
    pub extra_body: Option<HashMap<String, serde_json::Value>>,
    pub system_message: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            title_model: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
            top_p: None,
            max_retries: 3,
            timeout_seconds: 120,
            extra_headers: HashMap::new(),
            extra_body: HashMap::new(),
            system_message: None,
            history_messages: DEFAULT_MAX_HISTORY,
        }
    }
}

impl Config {
    /// Initialize configuration from defaults, the environment, and the
    /// first configuration file found (or `explicit_path` when given).
    pub async fn init(explicit_path: Option<&Path>) -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        config.load_from_env();

        match explicit_path {
            Some(path) => {
                let file_config = Self::load_from_path(path).await?;
                config.merge_with(file_config);
            }
            None => {
                if let Some(file_config) = Self::load_from_file().await? {
                    config.merge_with(file_config);
                }
            }
        }

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) {
        if let Ok(provider) = std::env::var("RAGCHAT_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if self.provider == "openai" && self.api_key.is_none() {
                self.api_key = Some(key);
            }
        }

        if self.provider == "ollama" {
            if let Ok(url) = std::env::var("OLLAMA_HOST") {
                self.base_url = Some(url);
            }
        }

        // Generic API key
        if let Ok(key) = std::env::var("RAGCHAT_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("RAGCHAT_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Ok(model) = std::env::var("RAGCHAT_MODEL") {
            self.model = model;
        }

        if let Ok(model) = std::env::var("RAGCHAT_TITLE_MODEL") {
            self.title_model = Some(model);
        }

        if let Ok(max_tokens_str) = std::env::var("RAGCHAT_MAX_TOKENS") {
            if let Ok(max_tokens) = max_tokens_str.parse() {
                self.max_tokens = Some(max_tokens);
            }
        }

        if let Ok(temp_str) = std::env::var("RAGCHAT_TEMPERATURE") {
            if let Ok(temperature) = temp_str.parse() {
                self.temperature = Some(temperature);
            }
        }

        if let Ok(retries_str) = std::env::var("RAGCHAT_MAX_RETRIES") {
            if let Ok(retries) = retries_str.parse() {
                self.max_retries = retries;
            }
        }

        if let Ok(timeout_str) = std::env::var("RAGCHAT_TIMEOUT") {
            if let Ok(timeout) = timeout_str.parse() {
                self.timeout_seconds = timeout;
            }
        }

        if let Ok(history_str) = std::env::var("RAGCHAT_MAX_HISTORY") {
            if let Ok(history_messages) = history_str.parse() {
                self.history_messages = history_messages;
            }
        }

        if let Ok(system_message) = std::env::var("RAGCHAT_SYSTEM_MESSAGE") {
            self.system_message = Some(system_message);
        }
    }

    /// Candidate configuration files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut config_paths = vec![
            PathBuf::from("./.ragchat.json"),
            PathBuf::from("./ragchat.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("ragchat").join("ragchat.json"));
        }

        config_paths
    }

    /// Load the first configuration file that exists, if any
    pub async fn load_from_file() -> Result<Option<FileConfig>> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific JSON file
    pub async fn load_from_path(path: &Path) -> Result<FileConfig> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply every value the file sets, even one equal to the default
    pub fn merge_with(&mut self, file: FileConfig) {
        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if file.base_url.is_some() {
            self.base_url = file.base_url;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if file.title_model.is_some() {
            self.title_model = file.title_model;
        }
        if file.max_tokens.is_some() {
            self.max_tokens = file.max_tokens;
        }
        if file.temperature.is_some() {
            self.temperature = file.temperature;
        }
        if file.top_p.is_some() {
            self.top_p = file.top_p;
        }
        if let Some(max_retries) = file.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(timeout_seconds) = file.timeout_seconds {
            self.timeout_seconds = timeout_seconds;
        }
        if let Some(history_messages) = file.history_messages {
            self.history_messages = history_messages;
        }
        if let Some(extra_headers) = file.extra_headers {
            self.extra_headers.extend(extra_headers);
        }
        if let Some(extra_body) = file.extra_body {
            self.extra_body.extend(extra_body);
        }
        if file.system_message.is_some() {
            self.system_message = file.system_message;
        }
    }

    /// Check if the configuration has a valid API key
    pub fn has_api_key(&self) -> bool {
        // Ollama doesn't require API keys
        if self.provider == "ollama" {
            return true;
        }
        self.api_key.as_deref().map_or(false, |key| !key.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !ProviderFactory::available_providers().contains(&self.provider.as_str()) {
            return Err(anyhow::anyhow!(
                "Unsupported provider '{}'. Available: {}",
                self.provider,
                ProviderFactory::available_providers().join(", ")
            ));
        }

        if !self.has_api_key() {
            return Err(anyhow::anyhow!(
                "No API key configured. Set OPENAI_API_KEY or RAGCHAT_API_KEY. For Ollama, no API key is required."
            ));
        }

        if self.model.is_empty() {
            return Err(anyhow::anyhow!("Model is required"));
        }

        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 {
                return Err(anyhow::anyhow!("max_tokens must be greater than 0"));
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow::anyhow!("temperature must be between 0.0 and 2.0"));
            }
        }

        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(anyhow::anyhow!("top_p must be between 0.0 and 1.0"));
            }
        }

        Ok(())
    }

    /// Provider settings for answering questions
    pub fn answer_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider_type: self.provider.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            max_retries: self.max_retries,
            timeout_seconds: self.timeout_seconds,
            extra_headers: self.extra_headers.clone(),
            extra_body: self.extra_body.clone(),
        }
    }

    /// Provider settings for title generation
    pub fn title_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            model: self.title_model.clone().unwrap_or_else(|| self.model.clone()),
            ..self.answer_provider_config()
        }
    }
}
