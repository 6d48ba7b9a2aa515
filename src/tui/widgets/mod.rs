// ABOUTME: TUI widget sub-modules for chat messages, the session list, and the status bar.
// ABOUTME: Each widget is a pure rendering function over screen state.

pub mod chat;
pub mod sessions;
pub mod status;
