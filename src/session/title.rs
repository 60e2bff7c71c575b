//! Chat title generation

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    llm::{ChatRequest, LlmError, LlmProvider, LlmResult, Message, utils::sanitize_content},
    utils::text::{string, template::SimpleTemplate},
};

pub const TITLE_PROMPT_TEMPLATE: &str =
    "Generate a short (max 6 words) title summarizing this user query:\n\n{{query}}";

/// Word budget asked of the model, reused for the local fallback
pub const TITLE_MAX_WORDS: usize = 6;

/// Character cap applied to fallback titles
pub const FALLBACK_MAX_CHARS: usize = 48;

const FALLBACK_EMPTY_TITLE: &str = "Untitled chat";

/// A title together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTitle {
    pub text: String,
    /// `true` when the model call failed and the query prefix was used
    pub fallback: bool,
}

/// Labels a conversation from its opening query with a single model call
pub struct TitleGenerator {
    provider: Arc<dyn LlmProvider>,
    template: String,
    max_tokens: u32,
    temperature: f32,
}

impl TitleGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            template: TITLE_PROMPT_TEMPLATE.to_string(),
            max_tokens: 32,
            temperature: 0.2,
        }
    }

    pub fn build_prompt(&self, query: &str) -> String {
        let mut template = SimpleTemplate::new();
        template.set("query", query);
        template.render(&self.template)
    }

    /// Ask the model for a title. The model is trusted to roughly respect
    /// the word budget; longer titles are accepted as-is.
    pub async fn try_generate_title(&self, query: &str) -> LlmResult<String> {
        let request = ChatRequest::new(vec![Message::new_user(self.build_prompt(query))])
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.provider.chat_completion(request).await?;
        clean_title(&response.content).ok_or(LlmError::EmptyResponse)
    }

    /// Title for `query`, falling back to a prefix of the query when the
    /// model call fails. Never fails.
    pub async fn generate_title(&self, query: &str) -> GeneratedTitle {
        match self.try_generate_title(query).await {
            Ok(text) => {
                debug!("Generated title: {}", text);
                GeneratedTitle { text, fallback: false }
            }
            Err(e) => {
                warn!("Title generation failed, using query prefix: {}", e);
                GeneratedTitle {
                    text: fallback_title(query),
                    fallback: true,
                }
            }
        }
    }
}

/// First non-empty line of the model output, trimmed and unquoted
fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let title = string::strip_quotes(line);
    let title = title.strip_prefix("Title:").map(str::trim).unwrap_or(title);

    (!title.is_empty()).then(|| title.to_string())
}

/// Sanitized prefix of the query: control characters dropped, whitespace
/// collapsed, at most six words and 48 characters.
pub fn fallback_title(query: &str) -> String {
    let cleaned = string::normalize_whitespace(&sanitize_content(query));
    let words = string::first_words(&cleaned, TITLE_MAX_WORDS);

    if words.is_empty() {
        FALLBACK_EMPTY_TITLE.to_string()
    } else {
        string::truncate(&words, FALLBACK_MAX_CHARS)
    }
}
