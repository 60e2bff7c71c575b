//! Error types for session handling

use thiserror::Error;

use crate::chatbot::ChatbotError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session reference: {0}")]
    InvalidSessionReference(String),

    #[error("Session reference '{reference}' is ambiguous ({matches} sessions match)")]
    AmbiguousSessionReference { reference: String, matches: usize },

    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Answer generation failed: {0}")]
    AnswerGeneration(#[from] ChatbotError),
}

pub type SessionResult<T> = Result<T, SessionError>;
