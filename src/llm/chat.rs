//! Stateless chat-completion backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::content::ContentItem;
use crate::{Error, Result};

use super::Backend;

/// Generation parameters; unset fields are omitted from the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// How the transcript is laid out in a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatFormat {
    /// One message per transcript item
    #[default]
    Messages,
    /// All texts joined with newlines into one user message, for backends
    /// that take a single prompt
    Flattened,
}

/// A message on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

/// Transport for chat-completion requests
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// Submit a request and return the reply segments in order
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    async fn complete(&self, request: &ChatRequest) -> Result<Vec<String>>;
}

/// OpenAI-compatible `/chat/completions` client
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpChatClient {
    /// Create a client for the given base URL (e.g. `https://host/v1`)
    #[must_use]
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<ReplyContent>,
}

/// Reply content is either a single string or a list of parts
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyContent {
    Text(String),
    Parts(Vec<ReplyPart>),
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

impl ReplyContent {
    fn into_segments(self) -> Vec<String> {
        match self {
            Self::Text(text) => vec![text],
            Self::Parts(parts) => parts.into_iter().filter_map(|p| p.text).collect(),
        }
    }
}

#[async_trait]
impl ChatCompletionClient for HttpChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<Vec<String>> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "chat request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Backend(format!("chat API error {status}: {body}")));
        }

        let result: ChatCompletionResponse = response.json().await?;
        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Backend("chat reply contained no choices".to_string()))?;

        Ok(choice
            .message
            .content
            .map(ReplyContent::into_segments)
            .unwrap_or_default())
    }
}

/// Backend that rebuilds the full message list on every call
pub struct StatelessBackend<C = HttpChatClient> {
    client: C,
    model: String,
    format: ChatFormat,
    uppercase_roles: bool,
    sampling: SamplingParams,
}

impl<C: ChatCompletionClient> StatelessBackend<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            format: ChatFormat::default(),
            uppercase_roles: false,
            sampling: SamplingParams::default(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: ChatFormat) -> Self {
        self.format = format;
        self
    }

    /// Send role names in upper case, as some backends require
    #[must_use]
    pub fn with_uppercase_roles(mut self, uppercase: bool) -> Self {
        self.uppercase_roles = uppercase;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    fn role_name(&self, role: &str) -> String {
        if self.uppercase_roles {
            role.to_ascii_uppercase()
        } else {
            role.to_string()
        }
    }

    /// Preamble first (as a system message), then every text item in order
    #[must_use]
    pub fn build_request(&self, transcript: &[ContentItem], preamble: Option<&str>) -> ChatRequest {
        let mut messages: Vec<ChatMessage> = Vec::with_capacity(transcript.len() + 1);

        if let Some(preamble) = preamble {
            messages.push(ChatMessage {
                role: self.role_name("system"),
                content: preamble.to_string(),
            });
        }

        messages.extend(transcript.iter().filter_map(|item| {
            item.as_text().map(|text| ChatMessage {
                role: self.role_name(item.role.as_str()),
                content: text.to_string(),
            })
        }));

        if self.format == ChatFormat::Flattened {
            let joined = messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            messages = vec![ChatMessage {
                role: self.role_name("user"),
                content: joined,
            }];
        }

        ChatRequest {
            model: self.model.clone(),
            messages,
            sampling: self.sampling.clone(),
        }
    }
}

#[async_trait]
impl<C: ChatCompletionClient> Backend for StatelessBackend<C> {
    async fn send(
        &mut self,
        transcript: &[ContentItem],
        preamble: Option<&str>,
    ) -> Result<Vec<String>> {
        let request = self.build_request(transcript, preamble);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        let segments = self.client.complete(&request).await?;
        tracing::debug!(?segments, "received chat reply");
        Ok(segments)
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Role;

    struct Unreachable;

    #[async_trait]
    impl ChatCompletionClient for Unreachable {
        async fn complete(&self, _request: &ChatRequest) -> Result<Vec<String>> {
            Err(Error::Backend("unreachable".to_string()))
        }
    }

    fn transcript() -> Vec<ContentItem> {
        vec![
            ContentItem::text(Role::Developer, "be brief"),
            ContentItem::user("what is 2 plus 3"),
        ]
    }

    #[test]
    fn preamble_leads_the_message_list() {
        let backend = StatelessBackend::new(Unreachable, "m");
        let request = backend.build_request(&transcript(), Some("TOOLS"));
        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "developer", "user"]);
        assert_eq!(request.messages[0].content, "TOOLS");
        assert_eq!(request.messages[2].content, "what is 2 plus 3");
    }

    #[test]
    fn uppercase_roles() {
        let backend = StatelessBackend::new(Unreachable, "m").with_uppercase_roles(true);
        let request = backend.build_request(&transcript(), None);
        assert_eq!(request.messages[0].role, "DEVELOPER");
        assert_eq!(request.messages[1].role, "USER");
    }

    #[test]
    fn flattened_joins_with_newlines() {
        let backend = StatelessBackend::new(Unreachable, "m").with_format(ChatFormat::Flattened);
        let request = backend.build_request(&transcript(), Some("TOOLS"));
        assert_eq!(
            request.messages,
            vec![ChatMessage {
                role: "user".into(),
                content: "TOOLS\nbe brief\nwhat is 2 plus 3".into(),
            }]
        );
    }

    #[test]
    fn unset_sampling_fields_are_omitted() {
        let backend = StatelessBackend::new(Unreachable, "m").with_sampling(SamplingParams {
            temperature: Some(0.5),
            seed: Some(7),
            ..SamplingParams::default()
        });
        let body = serde_json::to_value(backend.build_request(&[], None)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "m", "messages": [], "temperature": 0.5, "seed": 7})
        );
    }

    #[test]
    fn reply_parts_become_segments() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"a"},{"type":"image"},{"type":"text","text":"b"}]}}]}"#,
        )
        .unwrap();
        let segments = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(ReplyContent::into_segments)
            .unwrap();
        assert_eq!(segments, ["a", "b"]);

        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"5"}}]}"#).unwrap();
        let segments = parsed.choices.into_iter().next().unwrap().message.content.unwrap();
        assert_eq!(segments.into_segments(), ["5"]);
    }
}
