//! Scripted collaborators for unit tests

use async_trait::async_trait;
use std::{collections::VecDeque, sync::Mutex};

use crate::{
    chatbot::{Chatbot, ChatbotError, ChatbotResult},
    llm::{ChatRequest, LlmError, LlmProvider, LlmResult, ProviderResponse},
};

/// Provider that replays queued replies and records every request.
/// Answers `"ok"` once the queue is empty.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: LlmError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the last user message of each request
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|request| request.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("ok".to_string())).map(ProviderResponse::text)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn validate_config(&self) -> LlmResult<()> {
        Ok(())
    }
}

/// Answering service that records `(query, session_id)` calls. Answers
/// `"answer: <query>"` unless a failure is queued.
pub struct ScriptedChatbot {
    failures: Mutex<VecDeque<ChatbotError>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedChatbot {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(self, error: ChatbotError) -> Self {
        self.failures.lock().unwrap().push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Chatbot for ScriptedChatbot {
    async fn ask(&self, query: &str, session_id: &str) -> ChatbotResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), session_id.to_string()));
        // Give other tasks a chance to run mid-answer
        tokio::task::yield_now().await;
        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(format!("answer: {}", query)),
        }
    }
}
