// ABOUTME: Status bar widget — channel state, transport, message count, and notices.
// ABOUTME: Displayed at the bottom of each screen as a single-line summary.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::channel::ChannelState;

/// Inputs for the conversation status line.
pub struct StatusBarParams<'a> {
    pub channel_state: ChannelState,
    pub message_count: usize,
    pub pending_answers: usize,
    pub notice: Option<&'a str>,
}

/// Which path a send will take in the given channel state.
pub fn transport_label(state: ChannelState) -> &'static str {
    match state {
        ChannelState::Open => "socket",
        ChannelState::Connecting | ChannelState::Closed => "http fallback",
    }
}

fn state_color(state: ChannelState) -> Color {
    match state {
        ChannelState::Connecting => Color::Yellow,
        ChannelState::Open => Color::Green,
        ChannelState::Closed => Color::Red,
    }
}

/// Render the conversation status line.
pub fn status_line(params: &StatusBarParams) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled("● ", Style::default().fg(state_color(params.channel_state))),
        Span::styled(
            format!("{} ", params.channel_state.label()),
            Style::default().fg(Color::White),
        ),
        Span::styled("| ", dim),
        Span::styled(
            format!("{} ", transport_label(params.channel_state)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled("| ", dim),
        Span::styled(
            format!("{} messages ", params.message_count),
            Style::default().fg(Color::White),
        ),
    ];

    if params.pending_answers > 0 {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            "waiting for reply... ",
            Style::default().fg(Color::Yellow),
        ));
    }

    push_notice(&mut spans, params.notice);
    Line::from(spans)
}

/// Render the launcher status line with its key hints.
pub fn launcher_status_line(session_count: usize, notice: Option<&str>) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(
            format!(" {} sessions ", session_count),
            Style::default().fg(Color::White),
        ),
        Span::styled("| n new · ⏎ open · r reload · q quit ", dim),
    ];
    push_notice(&mut spans, notice);
    Line::from(spans)
}

fn push_notice(spans: &mut Vec<Span<'static>>, notice: Option<&str>) {
    if let Some(notice) = notice {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }
}
