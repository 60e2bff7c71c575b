use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::ask::AskCommand;
use crate::app::App;
use crate::config::Config;

/// ragchat - chat with a knowledge-base assistant from your terminal
#[derive(Parser, Debug)]
#[command(
    name = "ragchat",
    version,
    about = "Chat with a knowledge-base assistant from your terminal",
    long_about = r#"ragchat keeps several independent conversations in one session, titles each
one from its opening question, and lets you switch between them.

Examples:
  ragchat                              # Start interactive mode
  ragchat ask "what is the refund policy?"
  echo "summarize the handbook" | ragchat ask --title"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Model used to answer questions
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Provider to use (openai, ollama)
    #[arg(short = 'p', long = "provider", global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive chat (the default)
    Chat,
    /// Ask a single question non-interactively
    Ask(AskCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let config = self.load_config().await?;
        debug!("Configuration initialized");

        match &self.command {
            Some(Commands::Ask(ask)) => ask.execute(&config).await,
            Some(Commands::Chat) | None => self.start_interactive_mode(&config).await,
        }
    }

    /// Configuration from the environment and files, with command-line
    /// overrides applied last
    pub async fn load_config(&self) -> Result<Config> {
        let mut config = Config::init(self.config.as_deref()).await?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
    }

    async fn start_interactive_mode(&self, config: &Config) -> Result<()> {
        info!("Starting interactive mode");

        config.validate()?;
        let app = App::new(config.clone())?;

        tokio::select! {
            result = app.run_interactive() => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
        }

        info!("Application finished");
        Ok(())
    }
}
