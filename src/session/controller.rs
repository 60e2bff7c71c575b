//! Conversation controller
//!
//! Owns the session registry and runs one user turn at a time: record the
//! query, ask the answering service, record the answer, then title the
//! conversation if this was its first completed exchange.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    app::AppEvent,
    chatbot::Chatbot,
    session::{
        conversation::{ChatMessage, Conversation, Role, SessionSummary},
        errors::{SessionError, SessionResult},
        registry::SessionRegistry,
        title::TitleGenerator,
    },
};

pub struct ConversationController {
    registry: SessionRegistry,
    chatbot: Arc<dyn Chatbot>,
    titles: TitleGenerator,
    events: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl ConversationController {
    pub fn new(registry: SessionRegistry, chatbot: Arc<dyn Chatbot>, titles: TitleGenerator) -> Self {
        Self {
            registry,
            chatbot,
            titles,
            events: None,
        }
    }

    /// Report state changes on `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.registry.list()
    }

    pub fn get_active_conversation(&self) -> &Conversation {
        self.registry.get_active()
    }

    pub fn create_and_activate_session(&mut self) -> String {
        let id = self.registry.create_and_activate();
        info!("Started new session {}", id);

        self.emit(AppEvent::SessionCreated { session_id: id.clone() });
        self.emit(AppEvent::SessionActivated { session_id: id.clone() });
        id
    }

    pub fn activate_session(&mut self, session_id: &str) -> SessionResult<()> {
        self.registry.set_active(session_id)?;
        self.emit(AppEvent::SessionActivated {
            session_id: session_id.to_string(),
        });
        Ok(())
    }

    /// Run a user turn against the active session
    pub async fn submit_user_query(&mut self, query: &str) -> SessionResult<Conversation> {
        let session_id = self.registry.active_id().to_string();
        self.handle_user_turn(&session_id, query).await
    }

    /// Append the query, ask for an answer, append it, and title the
    /// conversation from its first message if it has no title yet.
    ///
    /// When the answering service fails the user message stays in place, no
    /// assistant message is added, the title is left for a later turn, and
    /// the failure is returned.
    pub async fn handle_user_turn(&mut self, session_id: &str, query: &str) -> SessionResult<Conversation> {
        if query.trim().is_empty() {
            return Err(SessionError::EmptyQuery);
        }

        self.registry.get_mut(session_id)?.push(ChatMessage::user(query));
        self.emit_appended(session_id, Role::User);

        let answer = match self.chatbot.ask(query, session_id).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Answer generation failed for session {}: {}", session_id, e);
                self.emit(AppEvent::AnswerFailed {
                    session_id: session_id.to_string(),
                    error: e.to_string(),
                });
                return Err(SessionError::AnswerGeneration(e));
            }
        };

        self.registry.get_mut(session_id)?.push(ChatMessage::assistant(answer));
        self.emit_appended(session_id, Role::Assistant);

        let untitled_query = {
            let conversation = self.registry.get(session_id)?;
            if conversation.has_title() {
                None
            } else {
                conversation.first_user_query().map(str::to_string)
            }
        };

        if let Some(first_query) = untitled_query {
            let title = self.titles.generate_title(&first_query).await;
            if self.registry.get_mut(session_id)?.set_title(title.text.clone()) {
                info!("Session {} titled \"{}\"", session_id, title.text);
                self.emit(AppEvent::TitleGenerated {
                    session_id: session_id.to_string(),
                    title: title.text,
                    fallback: title.fallback,
                });
            }
        }

        let conversation = self.registry.get(session_id)?;
        debug!(
            "Turn complete for session {} ({} messages)",
            session_id,
            conversation.messages().len()
        );
        Ok(conversation.clone())
    }

    fn emit_appended(&self, session_id: &str, role: Role) {
        self.emit(AppEvent::MessageAppended {
            session_id: session_id.to_string(),
            role,
        });
    }

    fn emit(&self, event: AppEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chatbot::ChatbotError,
        llm::LlmError,
        session::conversation::SENTINEL_TITLE,
        test_support::{ScriptedChatbot, ScriptedProvider},
    };

    struct Harness {
        controller: ConversationController,
        chatbot: Arc<ScriptedChatbot>,
        titles: Arc<ScriptedProvider>,
    }

    fn harness(chatbot: ScriptedChatbot, titles: ScriptedProvider) -> Harness {
        let chatbot = Arc::new(chatbot);
        let titles = Arc::new(titles);
        let controller = ConversationController::new(
            SessionRegistry::init(),
            chatbot.clone(),
            TitleGenerator::new(titles.clone()),
        );
        Harness { controller, chatbot, titles }
    }

    #[tokio::test]
    async fn test_first_turn_appends_two_messages_and_titles_once() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new().reply("Friendly Greeting"));
        let session_id = h.controller.registry().active_id().to_string();

        let conversation = h.controller.submit_user_query("Hello").await.unwrap();

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), Role::User);
        assert_eq!(messages[0].content(), "Hello");
        assert_eq!(messages[1].role(), Role::Assistant);
        assert_eq!(messages[1].content(), "answer: Hello");
        assert_eq!(conversation.title(), "Friendly Greeting");

        assert_eq!(h.chatbot.calls(), vec![("Hello".to_string(), session_id)]);
        assert_eq!(h.titles.requests().len(), 1);
        assert!(h.titles.prompts()[0].ends_with("\n\nHello"));
    }

    #[tokio::test]
    async fn test_second_turn_does_not_retitle() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new().reply("Greeting"));

        h.controller.submit_user_query("Hello").await.unwrap();
        let conversation = h.controller.submit_user_query("And another thing").await.unwrap();

        assert_eq!(conversation.messages().len(), 4);
        assert_eq!(conversation.messages()[2].content(), "And another thing");
        assert_eq!(conversation.title(), "Greeting");
        assert_eq!(h.titles.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_title_is_sentinel_until_first_turn() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new().reply("Topic"));
        assert_eq!(h.controller.get_active_conversation().title(), SENTINEL_TITLE);

        h.controller.submit_user_query("q").await.unwrap();
        assert_ne!(h.controller.get_active_conversation().title(), SENTINEL_TITLE);
    }

    #[tokio::test]
    async fn test_new_session_scenario() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new().reply("Pricing Question"));
        let a = h.controller.registry().active_id().to_string();

        let b = h.controller.create_and_activate_session();
        assert_eq!(h.controller.registry().active_id(), b);

        let session_a = h.controller.registry().get(&a).unwrap();
        assert!(session_a.is_empty());
        assert_eq!(session_a.title(), SENTINEL_TITLE);

        let conversation = h.controller.submit_user_query("price?").await.unwrap();
        assert_eq!(conversation.id(), b);
        assert_eq!(conversation.title(), "Pricing Question");
        assert!(h.titles.prompts()[0].ends_with("\n\nprice?"));
        assert_eq!(h.controller.registry().get(&a).unwrap().title(), SENTINEL_TITLE);
    }

    #[tokio::test]
    async fn test_activate_unknown_session_fails_and_keeps_active() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new());
        let before = h.controller.registry().active_id().to_string();

        let result = h.controller.activate_session("never-created");
        assert!(matches!(result, Err(SessionError::InvalidSessionReference(_))));
        assert_eq!(h.controller.registry().active_id(), before);
    }

    #[tokio::test]
    async fn test_unknown_session_turn_touches_nothing() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new());

        let result = h.controller.handle_user_turn("missing", "hi").await;
        assert!(matches!(result, Err(SessionError::InvalidSessionReference(_))));
        assert!(h.chatbot.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new());

        assert!(matches!(h.controller.submit_user_query("  \n").await, Err(SessionError::EmptyQuery)));
        assert!(h.controller.get_active_conversation().is_empty());
        assert!(h.chatbot.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_failure_keeps_user_message_and_defers_title() {
        let chatbot = ScriptedChatbot::new()
            .fail_next(ChatbotError::Llm(LlmError::ServerError("index offline".to_string())));
        let mut h = harness(chatbot, ScriptedProvider::new().reply("Refund Policy"));

        let result = h.controller.submit_user_query("refunds?").await;
        assert!(matches!(result, Err(SessionError::AnswerGeneration(_))));

        let conversation = h.controller.get_active_conversation();
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].role(), Role::User);
        assert_eq!(conversation.title(), SENTINEL_TITLE);
        assert!(h.titles.requests().is_empty());

        // The next successful turn titles from the first message, not the retry
        let conversation = h.controller.submit_user_query("what about returns?").await.unwrap();
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(conversation.title(), "Refund Policy");
        assert!(h.titles.prompts()[0].ends_with("\n\nrefunds?"));
    }

    #[tokio::test]
    async fn test_title_failure_falls_back_without_failing_turn() {
        let titles = ScriptedProvider::new().fail(LlmError::TimeoutError("slow".to_string()));
        let mut h = harness(ScriptedChatbot::new(), titles);

        let conversation = h.controller.submit_user_query("How do I reset my password").await.unwrap();
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.title(), "How do I reset my password");
    }

    #[tokio::test]
    async fn test_events_are_emitted_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut h = harness(ScriptedChatbot::new(), ScriptedProvider::new().reply("Hi"));
        h.controller = h.controller.with_events(tx);

        let id = h.controller.create_and_activate_session();
        h.controller.submit_user_query("hello").await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                AppEvent::SessionCreated { session_id: id.clone() },
                AppEvent::SessionActivated { session_id: id.clone() },
                AppEvent::MessageAppended { session_id: id.clone(), role: Role::User },
                AppEvent::MessageAppended { session_id: id.clone(), role: Role::Assistant },
                AppEvent::TitleGenerated { session_id: id, title: "Hi".to_string(), fallback: false },
            ]
        );
    }
}
