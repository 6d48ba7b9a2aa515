// ABOUTME: App orchestrator — wires config, session store, backend, and channel into the TUI.
// ABOUTME: Drives the terminal event loop and runs ChatApp commands as tokio tasks.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::api::{ChatBackend, HttpBackend};
use crate::channel::{self, ChannelHandle};
use crate::config::Config;
use crate::store::SessionStore;
use crate::tui::model::ChatApp;
use crate::tui::state::{Command, Msg};

/// Top-level application that orchestrates all subsystems.
pub struct App {
    config: Config,
    store_path: PathBuf,
    initial_session: Option<String>,
}

impl App {
    pub fn new(config: Config, store_path: PathBuf, initial_session: Option<String>) -> Self {
        Self {
            config,
            store_path,
            initial_session,
        }
    }

    /// Run the application until the user quits.
    pub async fn run(self) -> anyhow::Result<()> {
        let backend: Arc<dyn ChatBackend> =
            Arc::new(HttpBackend::new(self.config.server.http_base.clone()));
        let store = SessionStore::load(&self.store_path)?;
        tracing::info!(
            http_base = %self.config.server.http_base,
            socket_base = %self.config.server.socket_base,
            store = %self.store_path.display(),
            "starting sessionchat"
        );

        let (model, commands) = ChatApp::init(ChatApp::flags(
            store,
            self.config.server.socket_base.clone(),
            self.config.server.outbound_format,
            self.config.sessions.freshness_window(),
            self.initial_session,
        ));

        let mut terminal = ratatui::init();
        set_bracketed_paste(&mut std::io::stdout(), true);

        let result = event_loop(&mut terminal, model, commands, backend).await;

        set_bracketed_paste(&mut std::io::stdout(), false);
        ratatui::restore();
        result
    }
}

/// Toggle bracketed paste on `out`. Returns false (and logs) if the terminal refused.
fn set_bracketed_paste(out: &mut impl Write, enabled: bool) -> bool {
    let result = if enabled {
        crossterm::execute!(out, EnableBracketedPaste)
    } else {
        crossterm::execute!(out, DisableBracketedPaste)
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(enabled, error = %e, "could not toggle bracketed paste");
            false
        }
    }
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    mut model: ChatApp,
    initial: Vec<Command>,
    backend: Arc<dyn ChatBackend>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
    let mut events = EventStream::new();

    if run_commands(initial, &backend, &tx) {
        return Ok(());
    }
    terminal.draw(|frame| model.view(frame))?;

    loop {
        let msg = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Some(Msg::Key(key)),
                Some(Ok(Event::Paste(text))) => Some(Msg::Paste(text)),
                Some(Ok(_)) => None,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(msg) = rx.recv() => Some(msg),
        };

        if let Some(msg) = msg {
            let commands = model.update(msg);
            if run_commands(commands, &backend, &tx) {
                return Ok(());
            }
        }
        terminal.draw(|frame| model.view(frame))?;
    }
}

/// Start every command. Returns true if one of them was `Quit`.
fn run_commands(
    commands: Vec<Command>,
    backend: &Arc<dyn ChatBackend>,
    tx: &mpsc::UnboundedSender<Msg>,
) -> bool {
    let mut quit = false;
    for command in commands {
        if command == Command::Quit {
            quit = true;
        } else {
            spawn_command(command, backend.clone(), tx.clone());
        }
    }
    quit
}

/// Run one command in the background and report its outcome as a `Msg`.
///
/// `Connect` sends `ChannelReady` before the connection task starts, so the
/// handle always reaches the model ahead of the channel's own events.
pub fn spawn_command(
    command: Command,
    backend: Arc<dyn ChatBackend>,
    tx: mpsc::UnboundedSender<Msg>,
) {
    match command {
        Command::CreateSession => {
            tokio::spawn(async move {
                let result = backend.create_session().await;
                let _ = tx.send(Msg::SessionCreated(result));
            });
        }
        Command::Connect { mount, url } => {
            let (handle, outbound) = ChannelHandle::pair();
            let _ = tx.send(Msg::ChannelReady { mount, handle });
            channel::spawn(url, outbound, move |event| {
                let _ = tx.send(Msg::Channel { mount, event });
            });
        }
        Command::FetchHistory { mount, session_id } => {
            tokio::spawn(async move {
                let result = backend.fetch_history(&session_id).await;
                let _ = tx.send(Msg::HistoryFetched { mount, result });
            });
        }
        Command::Ask {
            mount,
            session_id,
            query,
        } => {
            tokio::spawn(async move {
                let result = backend.ask(&session_id, &query).await;
                let _ = tx.send(Msg::AnswerReceived { mount, result });
            });
        }
        Command::DeleteSession { session_id } => {
            tokio::spawn(async move {
                let result = backend.delete_session(&session_id).await;
                let _ = tx.send(Msg::SessionDeleted { session_id, result });
            });
        }
        Command::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::api::{ApiError, ApiResult, ChatMessage};
    use crate::channel::ChannelEvent;

    /// Records every call and answers from canned values.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn result<T>(&self, value: T) -> ApiResult<T> {
            if self.fail {
                Err(ApiError::Status {
                    url: "http://fake".to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
            } else {
                Ok(value)
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn create_session(&self) -> ApiResult<String> {
            self.calls.lock().unwrap().push("create".to_string());
            self.result("fresh-session".to_string())
        }

        async fn fetch_history(&self, session_id: &str) -> ApiResult<Vec<ChatMessage>> {
            self.calls.lock().unwrap().push(format!("history {}", session_id));
            self.result(vec![ChatMessage::user("a"), ChatMessage::bot("b")])
        }

        async fn ask(&self, session_id: &str, query: &str) -> ApiResult<String> {
            self.calls.lock().unwrap().push(format!("ask {} {}", session_id, query));
            self.result(format!("echo {}", query))
        }

        async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
            self.calls.lock().unwrap().push(format!("delete {}", session_id));
            self.result(())
        }
    }

    fn setup(fail: bool) -> (Arc<FakeBackend>, mpsc::UnboundedSender<Msg>, mpsc::UnboundedReceiver<Msg>) {
        let backend = Arc::new(FakeBackend {
            fail,
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        (backend, tx, rx)
    }

    #[tokio::test]
    async fn ask_reports_answer_for_mount() {
        let (backend, tx, mut rx) = setup(false);
        spawn_command(
            Command::Ask {
                mount: 4,
                session_id: "s1".to_string(),
                query: "hi".to_string(),
            },
            backend.clone(),
            tx,
        );
        match rx.recv().await.unwrap() {
            Msg::AnswerReceived { mount, result } => {
                assert_eq!(mount, 4);
                assert_eq!(result.unwrap(), "echo hi");
            }
            other => panic!("expected AnswerReceived, got {:?}", other),
        }
        assert_eq!(backend.calls(), vec!["ask s1 hi".to_string()]);
    }

    #[tokio::test]
    async fn create_session_reports_id() {
        let (backend, tx, mut rx) = setup(false);
        spawn_command(Command::CreateSession, backend, tx);
        match rx.recv().await.unwrap() {
            Msg::SessionCreated(result) => assert_eq!(result.unwrap(), "fresh-session"),
            other => panic!("expected SessionCreated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_delete_still_reports_completion() {
        let (backend, tx, mut rx) = setup(true);
        spawn_command(
            Command::DeleteSession {
                session_id: "gone".to_string(),
            },
            backend,
            tx,
        );
        match rx.recv().await.unwrap() {
            Msg::SessionDeleted { session_id, result } => {
                assert_eq!(session_id, "gone");
                assert!(result.is_err());
            }
            other => panic!("expected SessionDeleted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn history_fetch_reports_messages() {
        let (backend, tx, mut rx) = setup(false);
        spawn_command(
            Command::FetchHistory {
                mount: 2,
                session_id: "s9".to_string(),
            },
            backend.clone(),
            tx,
        );
        match rx.recv().await.unwrap() {
            Msg::HistoryFetched { mount, result } => {
                assert_eq!(mount, 2);
                assert_eq!(result.unwrap().len(), 2);
            }
            other => panic!("expected HistoryFetched, got {:?}", other),
        }
        assert_eq!(backend.calls(), vec!["history s9".to_string()]);
    }

    #[tokio::test]
    async fn connect_delivers_handle_before_events() {
        let (backend, tx, mut rx) = setup(false);
        spawn_command(
            Command::Connect {
                mount: 1,
                url: "ws://127.0.0.1:9/ws/s1".to_string(),
            },
            backend,
            tx,
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            Msg::ChannelReady { mount: 1, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            Msg::Channel {
                mount: 1,
                event: ChannelEvent::Closed
            }
        ));
    }

    /// Writer that rejects everything, like a closed terminal.
    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn bracketed_paste_writes_escape_sequences() {
        let mut out = Vec::new();
        assert!(set_bracketed_paste(&mut out, true));
        assert!(set_bracketed_paste(&mut out, false));
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?2004h"), "got {:?}", written);
        assert!(written.contains("\x1b[?2004l"), "got {:?}", written);
    }

    #[test]
    fn bracketed_paste_failure_is_not_fatal() {
        assert!(!set_bracketed_paste(&mut BrokenTerminal, true));
        assert!(!set_bracketed_paste(&mut BrokenTerminal, false));
    }

    #[tokio::test]
    async fn quit_stops_without_spawning() {
        let (backend, tx, mut rx) = setup(false);
        let dyn_backend: Arc<dyn ChatBackend> = backend.clone();
        assert!(run_commands(vec![Command::Quit], &dyn_backend, &tx));
        drop(tx);
        assert!(rx.recv().await.is_none());
        assert!(backend.calls().is_empty());
    }
}
