//! Line-oriented chat loop

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::{
    app::{App, AppEvent},
    session::SessionError,
    ui::{
        commands::{ReplCommand, HELP_TEXT},
        render::{self, DEFAULT_WIDTH},
    },
    version,
};

const PROMPT: &str = "> ";

/// Read lines from `input` until end of input or `/quit`, writing
/// everything the user sees to `output`.
pub async fn run<R, W>(app: &App, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "{} - type /help for commands", version::full_version())?;
    write!(output, "{}", render::render_conversation(&app.get_active_conversation().await, DEFAULT_WIDTH))?;

    let mut lines = input.lines();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(output, "{}", HELP_TEXT)?,
            ReplCommand::Ask(query) => ask(app, &query, &mut output).await?,
            ReplCommand::New => {
                app.create_and_activate_session().await;
                writeln!(output, "Started a new chat.")?;
            }
            ReplCommand::List => {
                let sessions = app.list_sessions().await;
                let active = app.active_session_id().await;
                write!(output, "{}", render::render_sidebar(&sessions, &active))?;
            }
            ReplCommand::Switch(reference) => switch(app, &reference, &mut output).await?,
            ReplCommand::History => {
                let conversation = app.get_active_conversation().await;
                write!(output, "{}", render::render_conversation(&conversation, DEFAULT_WIDTH))?;
            }
            ReplCommand::Invalid(usage) => writeln!(output, "{}", usage)?,
            ReplCommand::Unknown(name) => {
                writeln!(output, "Unknown command {}. Type /help for commands.", name)?
            }
        }

        report_events(app, &mut output).await?;
    }

    info!("Leaving chat loop");
    Ok(())
}

async fn ask<W: Write>(app: &App, query: &str, output: &mut W) -> Result<()> {
    match app.submit_user_query(query).await {
        Ok(conversation) => {
            if let Some(answer) = conversation.messages().last() {
                writeln!(output, "{}", render::render_message(answer, DEFAULT_WIDTH))?;
            }
        }
        Err(SessionError::AnswerGeneration(e)) => {
            writeln!(output, "{}", render::render_answer_error(&e, DEFAULT_WIDTH))?;
        }
        Err(e) => writeln!(output, "Error: {}", e)?,
    }
    Ok(())
}

async fn switch<W: Write>(app: &App, reference: &str, output: &mut W) -> Result<()> {
    let activated = match app.resolve_session(reference).await {
        Ok(id) => app.activate_session(&id).await,
        Err(e) => Err(e),
    };

    match activated {
        Ok(()) => {
            let conversation = app.get_active_conversation().await;
            write!(output, "{}", render::render_conversation(&conversation, DEFAULT_WIDTH))?;
        }
        Err(e) => writeln!(output, "Error: {}", e)?,
    }
    Ok(())
}

async fn report_events<W: Write>(app: &App, output: &mut W) -> Result<()> {
    for event in app.drain_events().await {
        match event {
            AppEvent::TitleGenerated { title, fallback, .. } => {
                debug!("Title from fallback: {}", fallback);
                writeln!(output, "Chat titled: {}", title)?;
            }
            other if other.is_error() => debug!("Reported failure for session {}", other.session_id()),
            _ => {}
        }
    }
    Ok(())
}
