//! Core application logic and orchestration
//!
//! This module wires the configured providers into the conversation
//! controller and exposes the operations the presentation layer uses.

mod events;

pub use events::*;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::{
    chatbot::{Chatbot, LlmChatbot, DEFAULT_SYSTEM_MESSAGE},
    config::Config,
    llm::{LlmProvider, ProviderFactory},
    session::{
        Conversation, ConversationController, SessionRegistry, SessionResult, SessionSummary,
        TitleGenerator,
    },
    ui,
};

/// Main application structure
pub struct App {
    /// Serializes user actions; a turn holds the lock until it completes.
    controller: Mutex<ConversationController>,
    event_rx: Mutex<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    /// Create a new application instance backed by the configured providers
    pub fn new(config: Config) -> Result<Self> {
        debug!("Creating new App instance");

        let answer_provider: Arc<dyn LlmProvider> =
            Arc::from(ProviderFactory::create_provider(config.answer_provider_config())?);
        answer_provider.validate_config()?;

        let title_provider: Arc<dyn LlmProvider> =
            Arc::from(ProviderFactory::create_provider(config.title_provider_config())?);
        title_provider.validate_config()?;

        let system_message = config
            .system_message
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        let chatbot = LlmChatbot::new(answer_provider)
            .with_system_message(Some(system_message))
            .with_max_history(config.history_messages);

        info!(
            "Using {} with model {} (titles: {})",
            chatbot.provider_name(),
            chatbot.model_name(),
            title_provider.model()
        );

        Ok(Self::with_collaborators(Arc::new(chatbot), title_provider))
    }

    /// Create an application around explicit collaborators
    pub fn with_collaborators(
        chatbot: Arc<dyn Chatbot>,
        title_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = ConversationController::new(
            SessionRegistry::init(),
            chatbot,
            TitleGenerator::new(title_provider),
        )
        .with_events(event_tx);

        Self {
            controller: Mutex::new(controller),
            event_rx: Mutex::new(event_rx),
        }
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.controller.lock().await.list_sessions()
    }

    pub async fn active_session_id(&self) -> String {
        self.controller.lock().await.registry().active_id().to_string()
    }

    pub async fn create_and_activate_session(&self) -> String {
        self.controller.lock().await.create_and_activate_session()
    }

    pub async fn activate_session(&self, session_id: &str) -> SessionResult<()> {
        self.controller.lock().await.activate_session(session_id)
    }

    /// Resolve a list position, id, or id prefix typed by the user
    pub async fn resolve_session(&self, reference: &str) -> SessionResult<String> {
        self.controller.lock().await.registry().resolve(reference)
    }

    pub async fn get_active_conversation(&self) -> Conversation {
        self.controller.lock().await.get_active_conversation().clone()
    }

    pub async fn submit_user_query(&self, query: &str) -> SessionResult<Conversation> {
        self.controller.lock().await.submit_user_query(query).await
    }

    /// Take every event emitted since the last call
    pub async fn drain_events(&self) -> Vec<AppEvent> {
        let mut event_rx = self.event_rx.lock().await;
        let mut events = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            debug!("Event: {:?}", event);
            events.push(event);
        }
        events
    }

    /// Run the application in interactive mode
    pub async fn run_interactive(&self) -> Result<()> {
        info!("Starting interactive mode");

        let input = tokio::io::BufReader::new(tokio::io::stdin());
        ui::repl::run(self, input, std::io::stdout()).await?;

        info!("Interactive session finished");
        Ok(())
    }

    /// Ask a single question in the active session
    pub async fn run_non_interactive(&self, prompt: &str) -> Result<Conversation> {
        info!("Running non-interactive prompt");
        debug!("Prompt: {}", prompt);

        Ok(self.submit_user_query(prompt).await?)
    }
}
