use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Read};
use tracing::{debug, info};

use crate::app::App;
use crate::config::Config;
use crate::utils::text::string;

/// Ask a single question non-interactively
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question. If not provided, it is read from stdin
    pub prompt: Vec<String>,

    /// Also print the generated chat title
    #[arg(short = 't', long = "title")]
    pub title: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing ask command");

        let prompt = self.get_prompt()?;
        if prompt.trim().is_empty() {
            return Err(anyhow!("No question provided. Use arguments or pipe input via stdin."));
        }

        info!("Asking: {}", string::truncate(&prompt, 50));

        config.validate()?;
        let app = App::new(config.clone())?;

        let conversation = app.run_non_interactive(&prompt).await?;

        if self.title {
            println!("Title: {}", conversation.title());
        }
        if let Some(answer) = conversation.messages().last() {
            println!("{}", answer.content());
        }

        Ok(())
    }

    fn get_prompt(&self) -> Result<String> {
        if !self.prompt.is_empty() {
            Ok(self.prompt.join(" "))
        } else {
            debug!("Reading question from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
            Ok(buffer)
        }
    }
}
