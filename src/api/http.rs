// ABOUTME: HTTP backend client — session creation, history, fallback chat, and deletion.
// ABOUTME: Implements ChatBackend over reqwest; no timeouts and no retries.

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

use crate::api::types::{ChatAnswer, ChatMessage, ChatRequest, HistoryResponse, SessionCreated};

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The request/response half of the chat backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask the backend for a fresh session identifier.
    async fn create_session(&self) -> ApiResult<String>;

    /// Fetch the full message history of a session.
    async fn fetch_history(&self, session_id: &str) -> ApiResult<Vec<ChatMessage>>;

    /// Send one message synchronously and return the bot's answer.
    async fn ask(&self, session_id: &str, query: &str) -> ApiResult<String>;

    /// Delete a session on the backend.
    async fn delete_session(&self, session_id: &str) -> ApiResult<()>;
}

/// `ChatBackend` over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base: trim_base(base.into()),
        }
    }

    /// Join a path onto the base address.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn check(url: &str, sent: Result<Response, reqwest::Error>) -> ApiResult<Response> {
        let response = sent.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(url: &str, response: Response) -> ApiResult<T> {
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create_session(&self) -> ApiResult<String> {
        let url = self.url("session");
        let response = Self::check(&url, self.client.post(&url).send().await)?;
        let created: SessionCreated = Self::decode(&url, response).await?;
        Ok(created.session_id)
    }

    async fn fetch_history(&self, session_id: &str) -> ApiResult<Vec<ChatMessage>> {
        let url = self.url(&format!("history/{}", session_id));
        let response = Self::check(&url, self.client.get(&url).send().await)?;
        let body: HistoryResponse = Self::decode(&url, response).await?;
        Ok(body.history)
    }

    async fn ask(&self, session_id: &str, query: &str) -> ApiResult<String> {
        let url = self.url("chat");
        let body = ChatRequest { session_id, query };
        let response = Self::check(&url, self.client.post(&url).json(&body).send().await)?;
        let answer: ChatAnswer = Self::decode(&url, response).await?;
        Ok(answer.answer)
    }

    async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        let url = self.url(&format!("session/{}", session_id));
        Self::check(&url, self.client.delete(&url).send().await)?;
        Ok(())
    }
}

/// Strip trailing slashes so paths join with exactly one separator.
pub fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}
