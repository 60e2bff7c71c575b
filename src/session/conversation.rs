//! Conversation records and chat messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title shown for a conversation until one has been generated.
pub const SENTINEL_TITLE: &str = "New Chat";

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in a conversation. Fields are private so a message cannot be
/// edited once it has been appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A single chat thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    /// `None` until the title generator has run once.
    title: Option<String>,
    messages: Vec<ChatMessage>,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh random id
    pub fn new() -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            title: None,
            messages: Vec::new(),
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title, the sentinel until one has been generated
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(SENTINEL_TITLE)
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the first message, which is always the opening user query.
    pub fn first_user_query(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|message| message.role() == Role::User)
            .map(ChatMessage::content)
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.updated_at = message.timestamp();
        self.messages.push(message);
    }

    /// Store the generated title. Returns `false` and leaves the conversation
    /// untouched if a title was already set or no user message exists yet.
    pub(crate) fn set_title(&mut self, title: String) -> bool {
        if self.title.is_some() || self.first_user_query().is_none() {
            return false;
        }
        self.title = Some(title);
        self.updated_at = Utc::now();
        true
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title().to_string(),
            message_count: self.messages.len(),
            updated_at: self.updated_at,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Sidebar entry for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}
