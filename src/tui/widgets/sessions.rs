// ABOUTME: Session list widget — one launcher row per stored session.
// ABOUTME: Shows the first message, a truncated id preview, and a local timestamp.

use chrono::{Local, TimeZone};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;

use crate::store::SessionRecord;

const ID_PREVIEW_CHARS: usize = 8;

/// First eight characters of the id followed by an ellipsis.
pub fn id_preview(session_id: &str) -> String {
    let head: String = session_id.chars().take(ID_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Format epoch milliseconds as local date and time.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Build a two-line list item for one session.
pub fn session_item(record: &SessionRecord) -> ListItem<'static> {
    let title = Line::from(vec![
        Span::styled(
            record.first_message.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format_timestamp(record.timestamp),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let detail = Line::from(Span::styled(
        format!("Session ID: {}", id_preview(&record.session_id)),
        Style::default().fg(Color::DarkGray),
    ));
    ListItem::new(vec![title, detail])
}

pub fn session_items(records: &[SessionRecord]) -> Vec<ListItem<'static>> {
    records.iter().map(session_item).collect()
}
