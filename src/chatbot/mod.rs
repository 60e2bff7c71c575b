//! Answering service abstraction
//!
//! The conversation controller hands every user query to a [`Chatbot`]
//! together with the session id, and appends whatever text comes back.
//! Implementations may keep their own per-session state.

mod agent;

pub use agent::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("The model returned an empty answer")]
    EmptyAnswer,
}

pub type ChatbotResult<T> = Result<T, ChatbotError>;

/// External collaborator that answers a query within a session
#[async_trait]
pub trait Chatbot: Send + Sync {
    async fn ask(&self, query: &str, session_id: &str) -> ChatbotResult<String>;
}
