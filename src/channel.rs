// ABOUTME: Real-time channel — one WebSocket per mounted conversation, driven by a tokio task.
// ABOUTME: Reports Opened / Frame / Closed events; dropping the handle closes the socket.

use std::panic::AssertUnwindSafe;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::api::http::trim_base;

/// Identifies one mounted conversation screen. Async results carry it so
/// anything arriving after the screen is gone can be dropped.
pub type MountId = u64;

/// Connection state as seen by the conversation screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "live",
            ChannelState::Closed => "offline",
        }
    }
}

/// Something that happened on the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    /// Text of one inbound frame, not yet parsed.
    Frame(String),
    /// The socket is gone (normal close, error, or failed connect). Sent once.
    Closed,
}

/// Owning handle to a channel. Dropping it ends the connection, including one
/// still in its handshake.
#[derive(Debug)]
pub struct ChannelHandle {
    outbound: mpsc::UnboundedSender<String>,
}

impl ChannelHandle {
    /// A handle plus the receiving end of its outbound queue.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound }, rx)
    }

    /// Queue a text frame. Returns false if the connection task has ended.
    pub fn send(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }

    pub fn is_alive(&self) -> bool {
        !self.outbound.is_closed()
    }
}

/// Channel address for a session: `{socket_base}/{session_id}`.
pub fn channel_url(socket_base: &str, session_id: &str) -> String {
    format!("{}/{}", trim_base(socket_base.to_string()), session_id)
}

/// Spawn the connection task for `url`. Outbound frames are read from
/// `outbound`; every event is passed to `on_event`.
pub fn spawn<F>(url: String, outbound: mpsc::UnboundedReceiver<String>, on_event: F) -> JoinHandle<()>
where
    F: Fn(ChannelEvent) + Send + 'static,
{
    tokio::spawn(run(url, outbound, on_event))
}

/// Install the process-wide TLS provider used by `wss://` connections.
/// Safe to call repeatedly; only the first call has an effect.
pub fn install_crypto_provider() {
    // Err means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

async fn run<F>(url: String, mut outbound: mpsc::UnboundedReceiver<String>, on_event: F)
where
    F: Fn(ChannelEvent) + Send + 'static,
{
    install_crypto_provider();

    // Nothing is queued before Opened, so recv() here only ever sees the drop.
    let dropped = async { while outbound.recv().await.is_some() {} };
    let connect = AssertUnwindSafe(tokio_tungstenite::connect_async(url.as_str())).catch_unwind();

    let ws = tokio::select! {
        result = connect => match result {
            Ok(Ok((ws, _))) => ws,
            Ok(Err(e)) => {
                tracing::warn!(%url, error = %e, "channel connect failed");
                on_event(ChannelEvent::Closed);
                return;
            }
            Err(_) => {
                tracing::error!(%url, "channel connect panicked");
                on_event(ChannelEvent::Closed);
                return;
            }
        },
        _ = dropped => {
            tracing::debug!(%url, "channel dropped while connecting");
            on_event(ChannelEvent::Closed);
            return;
        }
    };
    tracing::info!(%url, "channel open");
    on_event(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(text) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        tracing::warn!(%url, error = %e, "channel send failed");
                        break;
                    }
                }
                None => {
                    // Handle dropped: the owning screen is gone.
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => on_event(ChannelEvent::Frame(text.as_str().to_string())),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(%url, ?frame, "channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(%url, error = %e, "channel read failed");
                    break;
                }
                None => break,
            },
        }
    }
    on_event(ChannelEvent::Closed);
}
