//! LLM-backed answering service

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::{
    chatbot::{Chatbot, ChatbotError, ChatbotResult},
    llm::{ChatRequest, LlmProvider, Message, MessageRole},
};

pub const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a helpful assistant. Answer the user's questions clearly and concisely.";

/// Default number of history messages replayed to the model per session
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Answers queries with a chat completion, replaying the session's earlier
/// exchanges as context.
pub struct LlmChatbot {
    provider: Arc<dyn LlmProvider>,
    system_message: Option<String>,
    max_history_messages: usize,
    histories: RwLock<HashMap<String, Vec<Message>>>,
}

impl LlmChatbot {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            system_message: Some(DEFAULT_SYSTEM_MESSAGE.to_string()),
            max_history_messages: DEFAULT_MAX_HISTORY,
            histories: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_system_message(mut self, system_message: Option<String>) -> Self {
        self.system_message = system_message;
        self
    }

    pub fn with_max_history(mut self, max_history_messages: usize) -> Self {
        self.max_history_messages = max_history_messages;
        self
    }

    /// Get the provider name
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        self.provider.model()
    }

    /// Context kept for a session (empty for unknown sessions)
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.histories.read().await.get(session_id).cloned().unwrap_or_default()
    }

    /// Keep the newest `max` messages, never starting on an assistant reply.
    fn trim_history(messages: &mut Vec<Message>, max: usize) {
        if messages.len() > max {
            let excess = messages.len() - max;
            messages.drain(..excess);
        }
        while messages.first().map_or(false, |m| m.role == MessageRole::Assistant) {
            messages.remove(0);
        }
    }
}

#[async_trait]
impl Chatbot for LlmChatbot {
    async fn ask(&self, query: &str, session_id: &str) -> ChatbotResult<String> {
        let mut messages = self.history(session_id).await;
        messages.push(Message::new_user(query));

        debug!(
            "Asking {} ({}) with {} messages for session {}",
            self.provider.name(),
            self.provider.model(),
            messages.len(),
            session_id
        );

        let request = ChatRequest::new(messages.clone()).with_system_message(self.system_message.clone());

        let response = match self.provider.chat_completion(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Answer request failed for session {}: {}", session_id, e);
                return Err(e.into());
            }
        };

        let answer = response.content.trim().to_string();
        if answer.is_empty() {
            return Err(ChatbotError::EmptyAnswer);
        }

        info!(
            "Session {} answered. Tokens: {}",
            session_id, response.usage.total_tokens
        );

        messages.push(Message::new_assistant(answer.clone()));
        Self::trim_history(&mut messages, self.max_history_messages);
        self.histories.write().await.insert(session_id.to_string(), messages);

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::test_support::ScriptedProvider;

    #[tokio::test]
    async fn test_ask_returns_trimmed_answer() {
        let provider = Arc::new(ScriptedProvider::new().reply("  Paris.  \n"));
        let chatbot = LlmChatbot::new(provider.clone());

        let answer = chatbot.ask("Capital of France?", "s1").await.unwrap();
        assert_eq!(answer, "Paris.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_message.as_deref(), Some(DEFAULT_SYSTEM_MESSAGE));
        assert_eq!(requests[0].messages, vec![Message::new_user("Capital of France?")]);
    }

    #[tokio::test]
    async fn test_history_is_kept_per_session() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two").reply("three"));
        let chatbot = LlmChatbot::new(provider.clone());

        chatbot.ask("first", "a").await.unwrap();
        chatbot.ask("other", "b").await.unwrap();
        chatbot.ask("second", "a").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 1);
        assert_eq!(
            requests[2].messages,
            vec![
                Message::new_user("first"),
                Message::new_assistant("one"),
                Message::new_user("second"),
            ]
        );
        assert_eq!(chatbot.history("a").await.len(), 4);
        assert_eq!(chatbot.history("b").await.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_history_untouched() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail(LlmError::AuthError("bad key".to_string()))
                .reply("ok"),
        );
        let chatbot = LlmChatbot::new(provider);

        let result = chatbot.ask("hello", "s").await;
        assert!(matches!(result, Err(ChatbotError::Llm(LlmError::AuthError(_)))));
        assert!(chatbot.history("s").await.is_empty());

        chatbot.ask("hello again", "s").await.unwrap();
        assert_eq!(chatbot.history("s").await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new().reply("   "));
        let chatbot = LlmChatbot::new(provider);

        assert!(matches!(chatbot.ask("?", "s").await, Err(ChatbotError::EmptyAnswer)));
    }

    #[tokio::test]
    async fn test_max_history_bounds_replayed_context() {
        let provider = Arc::new(ScriptedProvider::new());
        let chatbot = LlmChatbot::new(provider.clone())
            .with_system_message(None)
            .with_max_history(2);

        chatbot.ask("q1", "s").await.unwrap();
        chatbot.ask("q2", "s").await.unwrap();
        chatbot.ask("q3", "s").await.unwrap();

        let requests = provider.requests();
        assert!(requests[2].system_message.is_none());
        assert_eq!(
            requests[2].messages,
            vec![
                Message::new_user("q2"),
                Message::new_assistant("ok"),
                Message::new_user("q3"),
            ]
        );
        assert_eq!(chatbot.history("s").await.len(), 2);
    }

    #[test]
    fn test_trim_history_drops_oldest_and_leading_assistant() {
        let mut messages = vec![
            Message::new_user("q1"),
            Message::new_assistant("a1"),
            Message::new_user("q2"),
            Message::new_assistant("a2"),
            Message::new_user("q3"),
            Message::new_assistant("a3"),
        ];

        LlmChatbot::trim_history(&mut messages, 3);
        assert_eq!(messages, vec![Message::new_user("q3"), Message::new_assistant("a3")]);
    }
}
