// ABOUTME: Conversation screen — message list, input, and the channel lifecycle for one session.
// ABOUTME: Applies inbound frames, sends over the socket or the HTTP fallback, and owns the channel handle.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::{ApiResult, ChatMessage, Frame, OutboundFormat, parse_frame};
use crate::channel::{ChannelEvent, ChannelHandle, ChannelState, MountId};
use crate::store::SessionStore;
use crate::tui::input::InputLine;
use crate::tui::state::Command;

const PAGE_SCROLL: u16 = 10;

/// What a conversation key press asks the app to do.
#[derive(Debug, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Send,
    Reset,
    Exit,
}

/// State of one mounted conversation screen.
#[derive(Debug)]
pub struct ConversationScreen {
    pub session_id: String,
    pub mount: MountId,
    pub messages: Vec<ChatMessage>,
    pub input: InputLine,
    pub channel_state: ChannelState,
    /// Lines scrolled up from the bottom (0 = pinned to the newest message).
    pub scroll_offset: u16,
    /// Fallback requests sent but not yet answered.
    pub pending_answers: usize,
    /// A reset was requested; waiting for the delete call to finish.
    pub resetting: bool,
    channel: Option<ChannelHandle>,
}

impl ConversationScreen {
    pub fn new(session_id: impl Into<String>, mount: MountId) -> Self {
        Self {
            session_id: session_id.into(),
            mount,
            messages: Vec::new(),
            input: InputLine::new(),
            channel_state: ChannelState::Connecting,
            scroll_offset: 0,
            pending_answers: 0,
            resetting: false,
            channel: None,
        }
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_state == ChannelState::Open
            && self.channel.as_ref().is_some_and(ChannelHandle::is_alive)
    }

    fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.scroll_offset = 0;
    }

    fn replace_messages(&mut self, history: Vec<ChatMessage>) {
        self.messages = history;
        self.scroll_offset = 0;
    }

    /// Take ownership of the channel created for this mount.
    pub fn attach_channel(&mut self, handle: ChannelHandle) {
        if self.channel_state == ChannelState::Closed {
            return;
        }
        self.channel = Some(handle);
    }

    /// React to a socket event. A close triggers a history refetch.
    pub fn on_channel_event(&mut self, event: ChannelEvent) -> Vec<Command> {
        match event {
            ChannelEvent::Opened => {
                if self.channel_state == ChannelState::Connecting {
                    self.channel_state = ChannelState::Open;
                }
                vec![]
            }
            ChannelEvent::Frame(text) => {
                self.apply_frame(&text);
                vec![]
            }
            ChannelEvent::Closed => {
                if self.channel_state == ChannelState::Closed {
                    return vec![];
                }
                self.channel_state = ChannelState::Closed;
                self.channel = None;
                if self.resetting {
                    return vec![];
                }
                tracing::info!(session_id = %self.session_id, "channel closed, fetching history over http");
                vec![Command::FetchHistory {
                    mount: self.mount,
                    session_id: self.session_id.clone(),
                }]
            }
        }
    }

    /// Apply one inbound frame: history replaces the list, a message is appended.
    /// Malformed frames are logged and ignored.
    pub fn apply_frame(&mut self, text: &str) {
        if self.channel_state == ChannelState::Closed {
            return;
        }
        match parse_frame(text) {
            Ok(Frame::History { history }) => self.replace_messages(history),
            Ok(Frame::Message(message)) => self.push_message(message),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, frame = %text, "ignoring malformed frame");
            }
        }
    }

    /// Result of the history refetch after a close.
    pub fn on_history(&mut self, result: ApiResult<Vec<ChatMessage>>) {
        match result {
            Ok(history) => self.replace_messages(history),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "failed to fetch chat history");
            }
        }
    }

    /// Result of a fallback chat request.
    pub fn on_answer(&mut self, result: ApiResult<String>) {
        self.pending_answers = self.pending_answers.saturating_sub(1);
        match result {
            Ok(answer) => self.push_message(ChatMessage::bot(answer)),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "fallback chat request failed");
            }
        }
    }

    /// Send the current input.
    ///
    /// The user message is shown immediately. The first message of a session
    /// is remembered in `store`. Delivery goes over the channel when it is open
    /// and otherwise becomes one `Command::Ask`. The input is cleared without
    /// waiting for the reply.
    pub fn send_message(
        &mut self,
        store: &mut SessionStore,
        format: OutboundFormat,
        now_ms: i64,
    ) -> Vec<Command> {
        if self.input.is_blank() || self.session_id.is_empty() {
            return vec![];
        }
        let input = self.input.value().to_string();

        let first_message = self.messages.is_empty();
        self.push_message(ChatMessage::user(input.clone()));

        if first_message
            && let Err(e) = store.record_first_message(&self.session_id, &input, now_ms)
        {
            tracing::warn!(session_id = %self.session_id, error = %e, "failed to store session record");
        }

        let sent = self.is_channel_open()
            && self
                .channel
                .as_ref()
                .is_some_and(|channel| channel.send(format.encode(&input)));

        let commands = if sent {
            vec![]
        } else {
            self.pending_answers += 1;
            vec![Command::Ask {
                mount: self.mount,
                session_id: self.session_id.clone(),
                query: input,
            }]
        };

        self.input.clear();
        commands
    }

    /// Ask the backend to delete this session. Navigation happens when the call completes.
    pub fn reset(&mut self) -> Vec<Command> {
        if self.resetting {
            return vec![];
        }
        self.resetting = true;
        vec![Command::DeleteSession {
            session_id: self.session_id.clone(),
        }]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
            return ConversationAction::Reset;
        }
        match key.code {
            KeyCode::Enter => ConversationAction::Send,
            KeyCode::Esc => ConversationAction::Exit,
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(PAGE_SCROLL);
                ConversationAction::None
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(PAGE_SCROLL);
                ConversationAction::None
            }
            KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                ConversationAction::None
            }
            KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                ConversationAction::None
            }
            _ => {
                self.input.handle_key(key);
                ConversationAction::None
            }
        }
    }
}
