//! Backend adapters
//!
//! Two strategies exchange a transcript for reply segments:
//! - [`StatelessBackend`] re-sends the whole transcript to a chat-completion API
//! - [`SessionBackend`] sends only the newest item to a remote session that
//!   keeps the history server-side
//!
//! The orchestration loop only sees the [`Backend`] trait.

mod chat;
mod session;

pub use chat::{
    ChatCompletionClient, ChatFormat, ChatMessage, ChatRequest, HttpChatClient, SamplingParams,
    StatelessBackend,
};
pub use session::{HttpSessionClient, SessionBackend, SessionClient, SessionHandle};

use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::content::ContentItem;
use crate::Result;

/// One backend exchange
#[async_trait]
pub trait Backend: Send {
    /// Send the working transcript and return the reply segments
    ///
    /// `preamble` is the tool instruction text for the current registry; the
    /// strategy decides whether and when it is delivered.
    ///
    /// # Errors
    ///
    /// Returns transport, status and session errors unchanged
    async fn send(
        &mut self,
        transcript: &[ContentItem],
        preamble: Option<&str>,
    ) -> Result<Vec<String>>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Box<B> {
    async fn send(
        &mut self,
        transcript: &[ContentItem],
        preamble: Option<&str>,
    ) -> Result<Vec<String>> {
        (**self).send(transcript, preamble).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the configured backend
///
/// A session backend creates its remote session here, once.
///
/// # Errors
///
/// Returns error if the session cannot be created
pub async fn connect(config: &BackendConfig) -> Result<Box<dyn Backend>> {
    match config {
        BackendConfig::Chat(chat) => {
            let client = HttpChatClient::new(chat.endpoint.clone(), chat.api_key.clone());
            let backend = StatelessBackend::new(client, chat.model.clone())
                .with_format(chat.format)
                .with_uppercase_roles(chat.uppercase_roles)
                .with_sampling(chat.sampling.clone());
            tracing::info!(endpoint = %chat.endpoint, model = %chat.model, "using chat backend");
            Ok(Box::new(backend))
        }
        BackendConfig::Session(session) => {
            let client = HttpSessionClient::new(
                session.endpoint.clone(),
                session.agent_endpoint_id.clone(),
                session.api_key.clone(),
            );
            let backend = SessionBackend::connect(client).await?;
            tracing::info!(
                endpoint = %session.endpoint,
                session = %backend.session(),
                "using session backend"
            );
            Ok(Box::new(backend))
        }
    }
}
