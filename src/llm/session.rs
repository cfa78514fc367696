//! Stateful session backend
//!
//! The remote session keeps the conversation history, so each call sends a
//! single message: the tool preamble on the first call only, followed by the
//! newest text item of the transcript.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{ContentItem, newest_text};
use crate::{Error, Result};

use super::Backend;

/// Opaque identifier of a remote session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport for a session-based chat endpoint
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Create a new remote session
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be created
    async fn create_session(&self) -> Result<SessionHandle>;

    /// Send one message to the session and return the reply text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] if the handle is no longer valid, and
    /// transport errors otherwise
    async fn chat(&self, session: &SessionHandle, message: &str) -> Result<String>;
}

/// HTTP client for an agent endpoint's session API
pub struct HttpSessionClient {
    client: Client,
    endpoint: String,
    agent_endpoint_id: String,
    api_key: Option<String>,
}

impl HttpSessionClient {
    #[must_use]
    pub fn new(endpoint: String, agent_endpoint_id: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent_endpoint_id,
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/agentEndpoints/{}/{path}",
            self.endpoint,
            urlencoding::encode(&self.agent_endpoint_id)
        )
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    display_name: String,
    description: String,
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionChatRequest<'a> {
    session_id: &'a str,
    user_message: &'a str,
    should_stream: bool,
}

#[derive(Deserialize)]
struct SessionChatResponse {
    message: SessionMessage,
}

#[derive(Deserialize)]
struct SessionMessage {
    content: SessionContent,
}

#[derive(Deserialize)]
struct SessionContent {
    text: String,
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn create_session(&self) -> Result<SessionHandle> {
        let id = Uuid::new_v4();
        let request = CreateSessionRequest {
            display_name: format!("display_name_for_{id}"),
            description: format!("description_for_{id}"),
        };

        let response = self.post(self.url("sessions")).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "session creation failed");
            return Err(Error::Session(format!(
                "failed to create session {status}: {body}"
            )));
        }

        let created: CreateSessionResponse = response.json().await?;
        tracing::debug!(session = %created.id, "created session");
        Ok(SessionHandle(created.id))
    }

    async fn chat(&self, session: &SessionHandle, message: &str) -> Result<String> {
        let request = SessionChatRequest {
            session_id: session.as_str(),
            user_message: message,
            should_stream: false,
        };

        let response = self
            .post(self.url("actions/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session chat request failed");
                e
            })?;

        let status = response.status();
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Err(Error::Session(format!(
                "session {session} is no longer valid ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "session chat API error");
            return Err(Error::Backend(format!(
                "session chat API error {status}: {body}"
            )));
        }

        let reply: SessionChatResponse = response.json().await?;
        Ok(reply.message.content.text)
    }
}

/// Backend pinned to one remote session for its whole lifetime
///
/// When several items were appended since the last call, only the newest
/// text item is sent; earlier ones are not replayed.
pub struct SessionBackend<C = HttpSessionClient> {
    client: C,
    session: SessionHandle,
    sent: u64,
}

impl<C: SessionClient> SessionBackend<C> {
    /// Create the remote session and pin it
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be created
    pub async fn connect(client: C) -> Result<Self> {
        let session = client.create_session().await?;
        Ok(Self {
            client,
            session,
            sent: 0,
        })
    }

    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Messages successfully delivered so far
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The single message for the next call
    #[must_use]
    pub fn outgoing_message(&self, transcript: &[ContentItem], preamble: Option<&str>) -> String {
        let mut message = String::new();

        if let (0, Some(preamble)) = (self.sent, preamble) {
            message.push_str(preamble);
        }

        if let Some(text) = newest_text(transcript) {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(text);
        }

        message
    }
}

#[async_trait]
impl<C: SessionClient> Backend for SessionBackend<C> {
    async fn send(
        &mut self,
        transcript: &[ContentItem],
        preamble: Option<&str>,
    ) -> Result<Vec<String>> {
        let message = self.outgoing_message(transcript, preamble);
        tracing::debug!(session = %self.session, message = %message, "sending session message");

        let reply = self.client.chat(&self.session, &message).await?;
        self.sent += 1;

        tracing::debug!(reply = %reply, "received session reply");
        Ok(vec![reply])
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSession;

    #[async_trait]
    impl SessionClient for FixedSession {
        async fn create_session(&self) -> Result<SessionHandle> {
            Ok(SessionHandle::new("s-1"))
        }

        async fn chat(&self, _session: &SessionHandle, message: &str) -> Result<String> {
            Ok(format!("echo: {message}"))
        }
    }

    #[tokio::test]
    async fn preamble_only_on_first_message() {
        let mut backend = SessionBackend::connect(FixedSession).await.unwrap();
        assert_eq!(backend.session().as_str(), "s-1");

        let transcript = vec![ContentItem::user("hello")];
        assert_eq!(
            backend.outgoing_message(&transcript, Some("TOOLS")),
            "TOOLS\nhello"
        );

        let reply = backend.send(&transcript, Some("TOOLS")).await.unwrap();
        assert_eq!(reply, ["echo: TOOLS\nhello"]);
        assert_eq!(backend.sent(), 1);

        assert_eq!(backend.outgoing_message(&transcript, Some("TOOLS")), "hello");
    }

    #[tokio::test]
    async fn only_newest_text_is_sent() {
        let backend = SessionBackend::connect(FixedSession).await.unwrap();
        let transcript = vec![
            ContentItem::user("older"),
            ContentItem::user("newer"),
        ];
        assert_eq!(backend.outgoing_message(&transcript, None), "newer");
        assert_eq!(backend.outgoing_message(&[], None), "");
    }

    #[test]
    fn session_request_uses_camel_case() {
        let body = serde_json::to_value(SessionChatRequest {
            session_id: "s",
            user_message: "hi",
            should_stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"sessionId": "s", "userMessage": "hi", "shouldStream": false})
        );
    }
}
