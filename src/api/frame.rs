// ABOUTME: Real-time channel frame codec — parses inbound JSON frames and encodes outbound text.
// ABOUTME: Inbound frames either replace the history or append one message.

use serde::{Deserialize, Serialize};

use crate::api::types::ChatMessage;

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    /// Authoritative full history; replaces whatever is displayed.
    History { history: Vec<ChatMessage> },
    /// One incremental message to append.
    Message(ChatMessage),
}

/// Parse a text frame received on the channel.
pub fn parse_frame(text: &str) -> serde_json::Result<Frame> {
    serde_json::from_str(text)
}

/// How user input is written to the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundFormat {
    /// The input text as-is.
    #[default]
    Raw,
    /// `{"role":"user","message":...}`, same shape as inbound messages.
    Envelope,
}

impl OutboundFormat {
    /// Encode user input for sending over the channel.
    pub fn encode(self, input: &str) -> String {
        match self {
            OutboundFormat::Raw => input.to_string(),
            OutboundFormat::Envelope => {
                serde_json::json!({ "role": "user", "message": input }).to_string()
            }
        }
    }
}
