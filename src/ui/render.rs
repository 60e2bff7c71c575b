//! Plain-text rendering of conversations and the session list

use crate::session::{ChatMessage, Conversation, Role, SessionSummary};

pub const DEFAULT_WIDTH: usize = 80;

const MIN_BODY_WIDTH: usize = 20;

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// Prefix the first line with `label`, wrap the rest under it
fn wrap_labelled(label: &str, content: &str, width: usize) -> String {
    let prefix = format!("{}: ", label);
    let indent = " ".repeat(prefix.chars().count());
    let body_width = width.saturating_sub(prefix.len()).max(MIN_BODY_WIDTH);

    let mut lines: Vec<String> = Vec::new();
    for source_line in content.lines() {
        if source_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(
            textwrap::wrap(source_line, body_width)
                .into_iter()
                .map(|line| line.into_owned()),
        );
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let lead = if i == 0 { prefix.as_str() } else { indent.as_str() };
            if line.is_empty() {
                lead.trim_end().to_string()
            } else {
                format!("{}{}", lead, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_message(message: &ChatMessage, width: usize) -> String {
    wrap_labelled(role_label(message.role()), message.content(), width)
}

/// Header line with the title, then every message in order
pub fn render_conversation(conversation: &Conversation, width: usize) -> String {
    let mut out = format!("== {} ==\n", conversation.title());

    if conversation.is_empty() {
        out.push_str("(no messages yet)\n");
        return out;
    }

    let rendered: Vec<String> = conversation
        .messages()
        .iter()
        .map(|message| render_message(message, width))
        .collect();
    out.push_str(&rendered.join("\n\n"));
    out.push('\n');
    out
}

/// Numbered session list, creation order, active session starred
pub fn render_sidebar(sessions: &[SessionSummary], active_id: &str) -> String {
    let mut out = String::from("Conversations:\n");
    for (i, session) in sessions.iter().enumerate() {
        let marker = if session.id == active_id { '*' } else { ' ' };
        let noun = if session.message_count == 1 { "message" } else { "messages" };
        out.push_str(&format!(
            "{} {}. {} ({} {}) [{}] {}\n",
            marker,
            i + 1,
            session.title,
            session.message_count,
            noun,
            short_id(&session.id),
            last_active(session)
        ));
    }
    out
}

/// How a failed answer is shown in place of the assistant reply
pub fn render_answer_error(error: &impl std::fmt::Display, width: usize) -> String {
    wrap_labelled(
        role_label(Role::Assistant),
        &format!("An error occurred: {}", error),
        width,
    )
}

/// Local wall-clock time of the last change to a session
fn last_active(session: &SessionSummary) -> String {
    session
        .updated_at
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string()
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(id: &str, title: &str, message_count: usize) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            title: title.to_string(),
            message_count,
            updated_at: chrono::Utc.with_ymd_and_hms(2026, 1, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_message_wraps_under_label() {
        let message = ChatMessage::assistant("one two three four five six seven eight nine ten");
        let rendered = render_message(&message, 32);
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("Assistant: one"));
        assert!(lines[1].starts_with("           "));
        assert!(lines.iter().all(|line| line.chars().count() <= 32));
    }

    #[test]
    fn test_render_message_keeps_paragraphs() {
        let rendered = render_message(&ChatMessage::user("first\n\nsecond"), DEFAULT_WIDTH);
        assert_eq!(rendered, "You: first\n\n     second");
    }

    #[test]
    fn test_render_empty_conversation() {
        let conversation = Conversation::new();
        let rendered = render_conversation(&conversation, DEFAULT_WIDTH);
        assert_eq!(rendered, "== New Chat ==\n(no messages yet)\n");
    }

    #[test]
    fn test_render_sidebar_marks_active() {
        let sessions = vec![
            summary("aaaaaaaa-1111", "Pricing Question", 2),
            summary("bbbbbbbb-2222", "New Chat", 0),
        ];
        let rendered = render_sidebar(&sessions, "bbbbbbbb-2222");

        let time = last_active(&sessions[0]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Conversations:");
        assert_eq!(lines[1], format!("  1. Pricing Question (2 messages) [aaaaaaaa] {}", time));
        assert_eq!(lines[2], format!("* 2. New Chat (0 messages) [bbbbbbbb] {}", time));
        assert_eq!(time.len(), 5);
    }

    #[test]
    fn test_render_answer_error() {
        let rendered = render_answer_error(&"service unavailable", DEFAULT_WIDTH);
        assert_eq!(rendered, "Assistant: An error occurred: service unavailable");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
