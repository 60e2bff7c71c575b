//! Application events emitted while handling user actions

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Events that can occur in the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A new session was created
    SessionCreated {
        session_id: String,
    },

    /// The active session changed
    SessionActivated {
        session_id: String,
    },

    /// A message was appended to a conversation
    MessageAppended {
        session_id: String,
        role: Role,
    },

    /// A conversation received its title
    TitleGenerated {
        session_id: String,
        title: String,
        fallback: bool,
    },

    /// The answering service failed for a user turn
    AnswerFailed {
        session_id: String,
        error: String,
    },
}

impl AppEvent {
    /// Get the session ID associated with this event
    pub fn session_id(&self) -> &str {
        match self {
            AppEvent::SessionCreated { session_id }
            | AppEvent::SessionActivated { session_id }
            | AppEvent::MessageAppended { session_id, .. }
            | AppEvent::TitleGenerated { session_id, .. }
            | AppEvent::AnswerFailed { session_id, .. } => session_id,
        }
    }

    /// Check if this event is an error
    pub fn is_error(&self) -> bool {
        matches!(self, AppEvent::AnswerFailed { .. })
    }
}
