// ABOUTME: Session launcher screen — lists fresh stored sessions and starts new ones.
// ABOUTME: Holds selection state; navigation and session creation are requested from ChatApp.

use crossterm::event::{KeyCode, KeyEvent};

use crate::store::SessionRecord;

/// What a launcher key press asks the app to do.
#[derive(Debug, PartialEq, Eq)]
pub enum LauncherAction {
    None,
    StartNewChat,
    Open(String),
    Reload,
    Quit,
}

/// State of the launcher screen.
#[derive(Debug, Default)]
pub struct LauncherScreen {
    pub sessions: Vec<SessionRecord>,
    pub selected: usize,
    /// A session-creation request is in flight.
    pub creating: bool,
}

impl LauncherScreen {
    pub fn new(sessions: Vec<SessionRecord>) -> Self {
        Self {
            sessions,
            selected: 0,
            creating: false,
        }
    }

    pub fn selected_session(&self) -> Option<&SessionRecord> {
        self.sessions.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.sessions.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> LauncherAction {
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('N') => LauncherAction::StartNewChat,
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                LauncherAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                LauncherAction::None
            }
            KeyCode::Enter => match self.selected_session() {
                Some(record) => LauncherAction::Open(record.session_id.clone()),
                None => LauncherAction::None,
            },
            KeyCode::Char('r') => LauncherAction::Reload,
            KeyCode::Char('q') | KeyCode::Esc => LauncherAction::Quit,
            _ => LauncherAction::None,
        }
    }
}
