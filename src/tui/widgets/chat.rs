// ABOUTME: Chat widget — renders conversation messages into styled ratatui Lines.
// ABOUTME: User and bot messages get distinct labels and colours; order is arrival order.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::api::{ChatMessage, Role};

/// Label shown before a message of the given role.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You: ",
        Role::Bot => "Bot: ",
    }
}

fn role_style(role: Role) -> Style {
    let color = match role {
        Role::User => Color::Blue,
        Role::Bot => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Render messages into Lines, one blank line between messages.
pub fn render_chat_lines(messages: &[ChatMessage]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (idx, msg) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }

        // First line gets the label, continuation lines are indented under it.
        let indent = " ".repeat(role_label(msg.role).len());
        for (i, text) in msg.message.split('\n').enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(role_label(msg.role), role_style(msg.role)),
                    Span::raw(text.to_string()),
                ]));
            } else {
                lines.push(Line::from(Span::raw(format!("{}{}", indent, text))));
            }
        }
    }

    lines
}

/// Placeholder shown before any message exists.
pub fn empty_chat_line() -> Line<'static> {
    Line::from(Span::styled(
        "No messages yet. Say hello!",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    ))
}
