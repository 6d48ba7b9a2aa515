// ABOUTME: Wire types shared by the HTTP API and the real-time channel.
// ABOUTME: ChatMessage/Role plus the request and response bodies of each endpoint.

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A single exchanged message, as carried on the wire and shown on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub message: String,
}

impl ChatMessage {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            message: message.into(),
        }
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            message: message.into(),
        }
    }
}

/// Response of `POST /session`.
#[derive(Debug, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

/// Response of `GET /history/{session_id}`.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ChatMessage>,
}

/// Body of `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub query: &'a str,
}

/// Response of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}
