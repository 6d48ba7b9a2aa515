// ABOUTME: Screen rendering — lays out the launcher and conversation screens.
// ABOUTME: Splits the terminal frame into vertical chunks and delegates to widgets.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListState, Paragraph, Wrap};

use crate::tui::conversation::ConversationScreen;
use crate::tui::launcher::LauncherScreen;
use crate::tui::widgets::chat::{empty_chat_line, render_chat_lines};
use crate::tui::widgets::sessions::{id_preview, session_items};
use crate::tui::widgets::status::{StatusBarParams, launcher_status_line, status_line};

const SEND_LABEL: &str = " [Send ⏎] ";

fn title_span(text: &str) -> Span<'static> {
    Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
}

/// Render the session launcher.
pub fn render_launcher(frame: &mut Frame, launcher: &LauncherScreen, notice: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // New chat control
            Constraint::Min(3),    // Previous sessions
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ✦ ", Style::default().fg(Color::Magenta)),
            title_span("Chat Session Selector"),
        ])),
        chunks[0],
    );

    let button_text = if launcher.creating {
        Span::styled(" starting... ", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            " + Start New Chat (n) ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
    };
    frame.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(vec![Span::raw(" "), button_text])]),
        chunks[1],
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Previous Sessions ", Style::default().fg(Color::White)));

    if launcher.sessions.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No active sessions found.",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block),
            chunks[2],
        );
    } else {
        let list = List::new(session_items(&launcher.sessions))
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(launcher.selected));
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    frame.render_widget(
        Paragraph::new(launcher_status_line(launcher.sessions.len(), notice)),
        chunks[3],
    );
}

/// Render a conversation. Takes `&mut` to clamp the scroll offset to the content.
pub fn render_conversation(
    frame: &mut Frame,
    conversation: &mut ConversationScreen,
    notice: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    // 1. Header
    let dim = Style::default().fg(Color::DarkGray);
    let reset_style = if conversation.resetting {
        dim
    } else {
        Style::default().fg(Color::Red)
    };
    let header = Line::from(vec![
        Span::styled(" ✦ ", Style::default().fg(Color::Magenta)),
        title_span("Chat with Bot"),
        Span::styled(format!("  {}", id_preview(&conversation.session_id)), dim),
        Span::raw("  "),
        Span::styled("Ctrl+R reset", reset_style),
        Span::styled(" · ", dim),
        Span::styled("Esc exit", Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    // 2. Chat area
    let chat_block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(dim);
    let chat_chunk = chat_block.inner(chunks[1]);
    frame.render_widget(chat_block, chunks[1]);

    let lines = if conversation.messages.is_empty() {
        vec![empty_chat_line()]
    } else {
        render_chat_lines(&conversation.messages)
    };
    let chat_paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Count wrapped lines the way ratatui renders them so the bottom stays reachable.
    let total_lines = u16::try_from(chat_paragraph.line_count(chat_chunk.width)).unwrap_or(u16::MAX);
    let max_scroll = total_lines.saturating_sub(chat_chunk.height);
    if conversation.scroll_offset > max_scroll {
        conversation.scroll_offset = max_scroll;
    }
    // scroll_offset is lines scrolled up from the bottom (0 = at bottom)
    let scroll = max_scroll.saturating_sub(conversation.scroll_offset);
    frame.render_widget(chat_paragraph.scroll((scroll, 0)), chat_chunk);

    // 3. Input area with the send control on the right.
    let input_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(SEND_LABEL.chars().count() as u16),
        ])
        .split(chunks[2]);

    let input_block = Block::default().borders(Borders::ALL).border_style(dim);
    let input_inner = input_block.inner(input_chunks[0]);
    let input_text = if conversation.input.value().is_empty() {
        Span::styled("Type your message...", dim)
    } else {
        Span::raw(conversation.input.value().to_string())
    };

    // Keep the cursor visible on long input by scrolling the line horizontally.
    let cursor_col = conversation.input.cursor_display_width() as u16;
    let h_scroll = cursor_col.saturating_sub(input_inner.width.saturating_sub(1));
    frame.render_widget(
        Paragraph::new(input_text)
            .block(input_block)
            .scroll((0, h_scroll)),
        input_chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            SEND_LABEL,
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::TOP | Borders::BOTTOM).border_style(dim)),
        input_chunks[1],
    );

    if input_inner.width > 0 && input_inner.height > 0 {
        let x = input_inner.x.saturating_add(cursor_col - h_scroll);
        frame.set_cursor_position(Position::new(x, input_inner.y));
    }

    // 4. Status bar
    let status = status_line(&StatusBarParams {
        channel_state: conversation.channel_state,
        message_count: conversation.messages.len(),
        pending_answers: conversation.pending_answers,
        notice,
    });
    frame.render_widget(Paragraph::new(status), chunks[3]);
}
