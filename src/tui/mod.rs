// ABOUTME: TUI module — ratatui full-screen interface for sessionchat.
// ABOUTME: Launcher and conversation screens, input handling, widgets, and the ChatApp model.

pub mod conversation;
pub mod input;
pub mod launcher;
pub mod model;
pub mod state;
pub mod ui;
pub mod widgets;

pub use state::*;
