// ABOUTME: TUI message and command types — what drives ChatApp::update and what it asks the runtime to do.
// ABOUTME: Msg flows into the model; Command flows out to app::App, which runs it and reports back.

use crossterm::event::KeyEvent;

use crate::api::{ApiResult, ChatMessage};
use crate::channel::{ChannelEvent, ChannelHandle, MountId};

/// Inputs to the model's update cycle.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Paste(String),
    /// The runtime created the channel for a mount; events follow.
    ChannelReady {
        mount: MountId,
        handle: ChannelHandle,
    },
    Channel {
        mount: MountId,
        event: ChannelEvent,
    },
    SessionCreated(ApiResult<String>),
    HistoryFetched {
        mount: MountId,
        result: ApiResult<Vec<ChatMessage>>,
    },
    AnswerReceived {
        mount: MountId,
        result: ApiResult<String>,
    },
    SessionDeleted {
        session_id: String,
        result: ApiResult<()>,
    },
}

/// Side effects requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateSession,
    Connect {
        mount: MountId,
        url: String,
    },
    FetchHistory {
        mount: MountId,
        session_id: String,
    },
    Ask {
        mount: MountId,
        session_id: String,
        query: String,
    },
    DeleteSession {
        session_id: String,
    },
    Quit,
}
