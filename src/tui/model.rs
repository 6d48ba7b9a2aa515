// ABOUTME: ChatApp — the Elm-style TUI model that owns both screens and the session store.
// ABOUTME: update() applies a Msg and returns Commands for the runtime; view() draws the active screen.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;

use crate::api::OutboundFormat;
use crate::channel::{MountId, channel_url};
use crate::store::{SessionStore, now_millis};
use crate::tui::conversation::{ConversationAction, ConversationScreen};
use crate::tui::launcher::{LauncherAction, LauncherScreen};
use crate::tui::state::{Command, Msg};
use crate::tui::ui;

/// Notice shown when a new session could not be created.
pub const CREATE_FAILED_NOTICE: &str = "could not start a new chat (see log)";

/// The screen currently mounted.
#[derive(Debug)]
pub enum Screen {
    Launcher(LauncherScreen),
    Conversation(ConversationScreen),
}

/// Initialization data passed to ChatApp::init.
pub struct Flags {
    pub store: SessionStore,
    pub socket_base: String,
    pub outbound_format: OutboundFormat,
    pub freshness_window: Duration,
    /// Open this session directly instead of the launcher.
    pub initial_session: Option<String>,
    /// Wall clock in epoch milliseconds.
    pub clock: fn() -> i64,
}

/// The top-level TUI application state.
pub struct ChatApp {
    pub screen: Screen,
    pub store: SessionStore,
    /// Dim, non-blocking status message; cleared on the next key press.
    pub notice: Option<String>,
    socket_base: String,
    outbound_format: OutboundFormat,
    freshness_window: Duration,
    next_mount: MountId,
    clock: fn() -> i64,
}

impl ChatApp {
    pub fn init(flags: Flags) -> (Self, Vec<Command>) {
        let mut app = ChatApp {
            screen: Screen::Launcher(LauncherScreen::default()),
            store: flags.store,
            notice: None,
            socket_base: flags.socket_base,
            outbound_format: flags.outbound_format,
            freshness_window: flags.freshness_window,
            next_mount: 0,
            clock: flags.clock,
        };

        let commands = match flags.initial_session {
            Some(session_id) if !session_id.trim().is_empty() => {
                app.open_conversation(session_id.trim().to_string())
            }
            _ => {
                app.open_launcher();
                vec![]
            }
        };
        (app, commands)
    }

    /// Flags with the default clock.
    pub fn flags(
        store: SessionStore,
        socket_base: String,
        outbound_format: OutboundFormat,
        freshness_window: Duration,
        initial_session: Option<String>,
    ) -> Flags {
        Flags {
            store,
            socket_base,
            outbound_format,
            freshness_window,
            initial_session,
            clock: now_millis,
        }
    }

    pub fn launcher(&self) -> Option<&LauncherScreen> {
        match &self.screen {
            Screen::Launcher(launcher) => Some(launcher),
            Screen::Conversation(_) => None,
        }
    }

    pub fn conversation(&self) -> Option<&ConversationScreen> {
        match &self.screen {
            Screen::Conversation(conversation) => Some(conversation),
            Screen::Launcher(_) => None,
        }
    }

    fn conversation_for(&mut self, mount: MountId) -> Option<&mut ConversationScreen> {
        match &mut self.screen {
            Screen::Conversation(conversation) if conversation.mount == mount => {
                Some(conversation)
            }
            _ => None,
        }
    }

    /// Mount the launcher with the fresh sessions from the store.
    pub fn open_launcher(&mut self) {
        self.store.reload();
        let sessions = self
            .store
            .fresh_records((self.clock)(), self.freshness_window);
        tracing::debug!(count = sessions.len(), "launcher activated");
        // A create request still in flight survives a reload.
        let creating = matches!(&self.screen, Screen::Launcher(launcher) if launcher.creating);
        let mut launcher = LauncherScreen::new(sessions);
        launcher.creating = creating;
        // Replacing the screen drops any conversation, closing its channel.
        self.screen = Screen::Launcher(launcher);
    }

    /// Mount a conversation for `session_id` and ask for its channel.
    pub fn open_conversation(&mut self, session_id: String) -> Vec<Command> {
        self.next_mount += 1;
        let mount = self.next_mount;
        let url = channel_url(&self.socket_base, &session_id);
        tracing::info!(%session_id, mount, "opening conversation");
        self.screen = Screen::Conversation(ConversationScreen::new(session_id, mount));
        vec![Command::Connect { mount, url }]
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Paste(text) => {
                if let Screen::Conversation(conversation) = &mut self.screen {
                    conversation.input.insert_str(&text);
                }
                vec![]
            }
            Msg::ChannelReady { mount, handle } => {
                match self.conversation_for(mount) {
                    Some(conversation) => conversation.attach_channel(handle),
                    None => tracing::debug!(mount, "dropping channel for unmounted screen"),
                }
                vec![]
            }
            Msg::Channel { mount, event } => match self.conversation_for(mount) {
                Some(conversation) => conversation.on_channel_event(event),
                None => vec![],
            },
            Msg::SessionCreated(result) => self.on_session_created(result),
            Msg::HistoryFetched { mount, result } => {
                if let Some(conversation) = self.conversation_for(mount) {
                    conversation.on_history(result);
                }
                vec![]
            }
            Msg::AnswerReceived { mount, result } => {
                match self.conversation_for(mount) {
                    Some(conversation) => conversation.on_answer(result),
                    None => tracing::debug!(mount, "discarding answer for unmounted screen"),
                }
                vec![]
            }
            Msg::SessionDeleted { session_id, result } => {
                self.on_session_deleted(session_id, result);
                vec![]
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Command::Quit];
        }
        self.notice = None;

        match &mut self.screen {
            Screen::Launcher(launcher) => match launcher.handle_key(key) {
                LauncherAction::None => vec![],
                LauncherAction::StartNewChat => self.start_new_chat(),
                LauncherAction::Open(session_id) => self.open_conversation(session_id),
                LauncherAction::Reload => {
                    self.open_launcher();
                    vec![]
                }
                LauncherAction::Quit => vec![Command::Quit],
            },
            Screen::Conversation(conversation) => match conversation.handle_key(key) {
                ConversationAction::None => vec![],
                ConversationAction::Send => {
                    let now = (self.clock)();
                    conversation.send_message(&mut self.store, self.outbound_format, now)
                }
                ConversationAction::Reset => conversation.reset(),
                ConversationAction::Exit => {
                    self.open_launcher();
                    vec![]
                }
            },
        }
    }

    /// Request a new session from the backend; navigation happens on success.
    pub fn start_new_chat(&mut self) -> Vec<Command> {
        match &mut self.screen {
            Screen::Launcher(launcher) if !launcher.creating => {
                launcher.creating = true;
                vec![Command::CreateSession]
            }
            _ => vec![],
        }
    }

    fn on_session_created(&mut self, result: crate::api::ApiResult<String>) -> Vec<Command> {
        let Screen::Launcher(launcher) = &mut self.screen else {
            return vec![];
        };
        launcher.creating = false;
        match result {
            Ok(session_id) => self.open_conversation(session_id),
            Err(e) => {
                tracing::warn!(error = %e, "failed to create session");
                self.notice = Some(CREATE_FAILED_NOTICE.to_string());
                vec![]
            }
        }
    }

    /// The delete call finished (either way): forget the session locally and
    /// return to the launcher if the reset screen is still up.
    fn on_session_deleted(&mut self, session_id: String, result: crate::api::ApiResult<()>) {
        if let Err(e) = result {
            tracing::warn!(%session_id, error = %e, "failed to delete session on backend");
        }
        if let Err(e) = self.store.remove(&session_id) {
            tracing::warn!(%session_id, error = %e, "failed to remove session record");
        }
        let navigate = match &self.screen {
            Screen::Conversation(conversation) => {
                conversation.resetting && conversation.session_id == session_id
            }
            Screen::Launcher(_) => true,
        };
        if navigate {
            self.open_launcher();
        }
    }

    pub fn view(&mut self, frame: &mut Frame) {
        let notice = self.notice.as_deref();
        match &mut self.screen {
            Screen::Launcher(launcher) => ui::render_launcher(frame, launcher, notice),
            Screen::Conversation(conversation) => {
                ui::render_conversation(frame, conversation, notice)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ChatMessage};
    use crate::channel::{ChannelEvent, ChannelHandle, ChannelState};
    use tokio::sync::mpsc::error::TryRecvError;

    const NOW: i64 = 1_700_000_000_000;
    const DAY: Duration = Duration::from_millis(86_400_000);

    fn fixed_clock() -> i64 {
        NOW
    }

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Msg {
        Msg::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn test_app(tmp: &tempfile::TempDir, initial_session: Option<&str>) -> (ChatApp, Vec<Command>) {
        let store = SessionStore::load(tmp.path().join("chat_sessions.json")).unwrap();
        ChatApp::init(Flags {
            store,
            socket_base: "ws://test/ws".to_string(),
            outbound_format: OutboundFormat::Raw,
            freshness_window: DAY,
            initial_session: initial_session.map(str::to_string),
            clock: fixed_clock,
        })
    }

    fn type_str(app: &mut ChatApp, text: &str) {
        for c in text.chars() {
            app.update(key(KeyCode::Char(c)));
        }
    }

    fn transport_error() -> ApiError {
        ApiError::Status {
            url: "http://test/session".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    #[test]
    fn init_shows_launcher_with_fresh_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::load(tmp.path().join("chat_sessions.json")).unwrap();
            store.record_first_message("fresh", "hi", NOW - 1_000).unwrap();
            store.record_first_message("stale", "old", NOW - 86_400_000).unwrap();
        }
        let (app, commands) = test_app(&tmp, None);
        assert!(commands.is_empty());
        let launcher = app.launcher().expect("launcher mounted");
        assert_eq!(launcher.sessions.len(), 1);
        assert_eq!(launcher.sessions[0].session_id, "fresh");
        assert_eq!(app.store.len(), 2, "stale record stays on disk");
    }

    #[test]
    fn init_with_session_opens_conversation() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, commands) = test_app(&tmp, Some("abc"));
        assert_eq!(
            commands,
            vec![Command::Connect {
                mount: 1,
                url: "ws://test/ws/abc".to_string(),
            }]
        );
        assert_eq!(app.conversation().unwrap().session_id, "abc");
    }

    #[test]
    fn start_new_chat_navigates_on_success() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, None);

        assert_eq!(app.update(key(KeyCode::Char('n'))), vec![Command::CreateSession]);
        assert!(app.update(key(KeyCode::Char('n'))).is_empty(), "one request at a time");

        let commands = app.update(Msg::SessionCreated(Ok("new-id".to_string())));
        assert!(matches!(commands.as_slice(), [Command::Connect { url, .. }] if url == "ws://test/ws/new-id"));
        assert_eq!(app.conversation().unwrap().session_id, "new-id");
    }

    #[test]
    fn reload_while_creating_keeps_single_request() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, None);

        assert_eq!(app.update(key(KeyCode::Char('n'))), vec![Command::CreateSession]);
        assert!(app.update(key(KeyCode::Char('r'))).is_empty());
        assert!(app.launcher().unwrap().creating);
        assert!(app.update(key(KeyCode::Char('n'))).is_empty());

        app.update(Msg::SessionCreated(Ok("new-id".to_string())));
        assert_eq!(app.conversation().unwrap().session_id, "new-id");
    }

    #[test]
    fn failed_creation_stays_on_launcher() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, None);
        app.update(key(KeyCode::Char('n')));
        let commands = app.update(Msg::SessionCreated(Err(transport_error())));
        assert!(commands.is_empty());
        let launcher = app.launcher().expect("still on launcher");
        assert!(!launcher.creating);
        assert_eq!(app.notice.as_deref(), Some(CREATE_FAILED_NOTICE));

        app.update(key(KeyCode::Down));
        assert!(app.notice.is_none(), "notice clears on next key");
    }

    #[test]
    fn selecting_a_session_opens_it() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::load(tmp.path().join("chat_sessions.json")).unwrap();
            store.record_first_message("one", "a", NOW - 2_000).unwrap();
            store.record_first_message("two", "b", NOW - 1_000).unwrap();
        }
        let (mut app, _) = test_app(&tmp, None);
        app.update(key(KeyCode::Down));
        let commands = app.update(key(KeyCode::Enter));
        assert!(matches!(commands.as_slice(), [Command::Connect { .. }]));
        assert_eq!(app.conversation().unwrap().session_id, "two");
    }

    #[test]
    fn fresh_session_hello_over_open_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        let (handle, mut outbound) = ChannelHandle::pair();
        app.update(Msg::ChannelReady { mount: 1, handle });
        app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Opened,
        });

        type_str(&mut app, "hello");
        let commands = app.update(key(KeyCode::Enter));

        assert!(commands.is_empty(), "no fallback call while the channel is open");
        assert_eq!(outbound.try_recv().unwrap(), "hello");
        let conversation = app.conversation().unwrap();
        assert_eq!(conversation.messages, vec![ChatMessage::user("hello")]);
        let record = app.store.get("s1").unwrap();
        assert_eq!(record.first_message, "hello");
        assert_eq!(record.timestamp, NOW);
    }

    #[test]
    fn closed_channel_hi_hey_scenario() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        let refetch = app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Closed,
        });
        assert_eq!(
            refetch,
            vec![Command::FetchHistory {
                mount: 1,
                session_id: "s1".to_string()
            }]
        );
        app.update(Msg::HistoryFetched {
            mount: 1,
            result: Ok(vec![]),
        });

        type_str(&mut app, "hi");
        let commands = app.update(key(KeyCode::Enter));
        assert_eq!(
            commands,
            vec![Command::Ask {
                mount: 1,
                session_id: "s1".to_string(),
                query: "hi".to_string(),
            }]
        );

        app.update(Msg::AnswerReceived {
            mount: 1,
            result: Ok("hey".to_string()),
        });
        assert_eq!(
            app.conversation().unwrap().messages,
            vec![ChatMessage::user("hi"), ChatMessage::bot("hey")]
        );
    }

    #[test]
    fn late_results_for_unmounted_screen_are_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Closed,
        });
        type_str(&mut app, "hi");
        app.update(key(KeyCode::Enter));

        app.update(key(KeyCode::Esc));
        assert!(app.launcher().is_some());

        // Re-open the same session: new mount id.
        let commands = app.open_conversation("s1".to_string());
        assert!(matches!(commands.as_slice(), [Command::Connect { mount: 2, .. }]));

        app.update(Msg::AnswerReceived {
            mount: 1,
            result: Ok("late".to_string()),
        });
        app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Frame(r#"{"role":"bot","message":"stale"}"#.to_string()),
        });
        let conversation = app.conversation().unwrap();
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.channel_state, ChannelState::Connecting);
    }

    #[test]
    fn channel_for_unmounted_screen_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.update(key(KeyCode::Esc));
        let (handle, mut outbound) = ChannelHandle::pair();
        app.update(Msg::ChannelReady { mount: 1, handle });
        // The handle was dropped, so its task would see the queue close.
        assert_eq!(outbound.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn exit_closes_channel_and_has_no_side_effects() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        let (handle, mut outbound) = ChannelHandle::pair();
        app.update(Msg::ChannelReady { mount: 1, handle });
        app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Opened,
        });

        let commands = app.update(key(KeyCode::Esc));
        assert!(commands.is_empty());
        assert!(app.launcher().is_some());
        assert_eq!(
            outbound.try_recv(),
            Err(TryRecvError::Disconnected),
            "unmount releases the channel"
        );
    }

    #[test]
    fn reset_deletes_then_removes_record_and_navigates() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.store.record_first_message("s1", "mine", NOW).unwrap();
        app.store.record_first_message("other", "theirs", NOW).unwrap();

        let commands = app.update(ctrl('r'));
        assert_eq!(
            commands,
            vec![Command::DeleteSession {
                session_id: "s1".to_string()
            }]
        );
        assert!(app.store.contains("s1"), "record stays until the delete completes");

        app.update(Msg::SessionDeleted {
            session_id: "s1".to_string(),
            result: Ok(()),
        });
        assert!(!app.store.contains("s1"));
        assert!(app.store.contains("other"));
        let launcher = app.launcher().expect("navigated to launcher");
        assert_eq!(launcher.sessions.len(), 1);
        assert_eq!(launcher.sessions[0].session_id, "other");
    }

    #[test]
    fn reset_navigates_even_if_delete_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.store.record_first_message("s1", "mine", NOW).unwrap();
        app.update(ctrl('r'));
        app.update(Msg::SessionDeleted {
            session_id: "s1".to_string(),
            result: Err(transport_error()),
        });
        assert!(!app.store.contains("s1"));
        assert!(app.launcher().is_some());
    }

    #[test]
    fn paste_goes_into_conversation_input() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.update(Msg::Paste("multi\nline".to_string()));
        assert_eq!(app.conversation().unwrap().input.value(), "multi line");
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, None);
        assert_eq!(app.update(ctrl('c')), vec![Command::Quit]);
        app.open_conversation("s1".to_string());
        assert_eq!(app.update(ctrl('c')), vec![Command::Quit]);
    }

    #[test]
    fn view_does_not_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut app, _) = test_app(&tmp, Some("s1"));
        app.update(Msg::Channel {
            mount: 1,
            event: ChannelEvent::Frame(
                r#"{"history":[{"role":"user","message":"a"},{"role":"bot","message":"b"}]}"#
                    .to_string(),
            ),
        });
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.view(frame)).unwrap();

        app.update(key(KeyCode::Esc));
        terminal.draw(|frame| app.view(frame)).unwrap();
    }
}
