//! In-memory session registry
//!
//! Holds every conversation created during the process lifetime plus the
//! pointer to the active one. Sessions are never removed, so the active
//! index always resolves.

use std::collections::HashMap;
use tracing::debug;

use crate::session::{
    conversation::{Conversation, SessionSummary},
    errors::{SessionError, SessionResult},
};

pub struct SessionRegistry {
    /// Conversations in creation order
    conversations: Vec<Conversation>,
    index: HashMap<String, usize>,
    active: usize,
}

impl SessionRegistry {
    /// Create a registry holding one empty default session, which is active.
    pub fn init() -> Self {
        let mut registry = Self {
            conversations: Vec::new(),
            index: HashMap::new(),
            active: 0,
        };
        let id = registry.create_session();
        debug!("Registry initialised with default session {}", id);
        registry
    }

    /// Insert a fresh empty conversation. The active session is unchanged.
    pub fn create_session(&mut self) -> String {
        let conversation = Conversation::new();
        let id = conversation.id().to_string();

        self.index.insert(id.clone(), self.conversations.len());
        self.conversations.push(conversation);
        debug!("Created session {}", id);

        id
    }

    pub fn create_and_activate(&mut self) -> String {
        let id = self.create_session();
        self.active = self.conversations.len() - 1;
        id
    }

    /// Point the active session at `id`. Unknown ids leave it unchanged.
    pub fn set_active(&mut self, id: &str) -> SessionResult<()> {
        let position = self.position(id)?;
        self.active = position;
        debug!("Active session is now {}", id);
        Ok(())
    }

    pub fn active_id(&self) -> &str {
        self.conversations[self.active].id()
    }

    pub fn get_active(&self) -> &Conversation {
        &self.conversations[self.active]
    }

    pub fn get(&self, id: &str) -> SessionResult<&Conversation> {
        let position = self.position(id)?;
        Ok(&self.conversations[position])
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> SessionResult<&mut Conversation> {
        let position = self.position(id)?;
        Ok(&mut self.conversations[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Sidebar listing in creation order
    pub fn list(&self) -> Vec<SessionSummary> {
        self.conversations.iter().map(Conversation::summary).collect()
    }

    /// Resolve a user-typed reference: a 1-based position in [`list`](Self::list),
    /// a full id, or an unambiguous id prefix.
    pub fn resolve(&self, reference: &str) -> SessionResult<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(SessionError::InvalidSessionReference(reference.to_string()));
        }

        if let Ok(number) = reference.parse::<usize>() {
            if let Some(conversation) = number.checked_sub(1).and_then(|i| self.conversations.get(i)) {
                return Ok(conversation.id().to_string());
            }
        }

        if self.contains(reference) {
            return Ok(reference.to_string());
        }

        let matches: Vec<&Conversation> = self
            .conversations
            .iter()
            .filter(|conversation| conversation.id().starts_with(reference))
            .collect();

        match matches.as_slice() {
            [single] => Ok(single.id().to_string()),
            [] => Err(SessionError::InvalidSessionReference(reference.to_string())),
            many => Err(SessionError::AmbiguousSessionReference {
                reference: reference.to_string(),
                matches: many.len(),
            }),
        }
    }

    fn position(&self, id: &str) -> SessionResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| SessionError::InvalidSessionReference(id.to_string()))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::init()
    }
}
