//! Host-framework bridge
//!
//! Translates a hosting agent framework's conversation items into a
//! transcript, runs one turn, and turns the outcome into an event the host
//! understands: either reply text or a call the host must execute itself.
//! Calls handed to the host are remembered in a per-conversation
//! [`CallLedger`] so their results can be replayed on later turns.

mod ledger;

pub use ledger::CallLedger;

use serde::Deserialize;

use crate::agent::{result_statement, run_turn};
use crate::content::{ContentItem, Role};
use crate::llm::Backend;
use crate::protocol::{self, TOOL_CALL_PREFIX};
use crate::tools::Tool;
use crate::{Error, Result};

/// A conversation item as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostItem {
    /// A chat message, possibly with several text parts
    Message { role: Role, content: Vec<String> },
    /// Output of a call previously handed to the host; `output` is JSON with
    /// a `text` field
    FunctionCallOutput { call_id: String, output: String },
}

/// Outcome of a turn, as delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Plain assistant reply; a reply of several segments is joined with
    /// newlines, in order
    Text(String),
    /// A call the host must execute
    ToolCall {
        call_id: String,
        name: String,
        /// JSON object keyed by parameter name
        arguments: String,
    },
}

#[derive(Deserialize)]
struct FunctionOutput {
    text: String,
}

/// Build a transcript from host items
///
/// A function-call output is replayed as the assistant's call followed by the
/// result statement. Outputs whose id is not in the ledger are skipped.
///
/// # Errors
///
/// Returns error if a known output is not JSON with a `text` field
pub fn build_transcript(items: &[HostItem], ledger: &CallLedger) -> Result<Vec<ContentItem>> {
    let mut transcript = Vec::with_capacity(items.len());

    for item in items {
        match item {
            HostItem::Message { role, content } => {
                transcript.extend(
                    content
                        .iter()
                        .map(|text| ContentItem::text(*role, text.as_str())),
                );
            }
            HostItem::FunctionCallOutput { call_id, output } => {
                let Some(call) = ledger.lookup(call_id) else {
                    tracing::debug!(call_id = %call_id, "skipping output of unknown call");
                    continue;
                };
                let output: FunctionOutput = serde_json::from_str(output)?;
                transcript.push(ContentItem::assistant(call));
                transcript.push(ContentItem::system(result_statement(call, &output.text)));
            }
        }
    }

    Ok(transcript)
}

/// One hosted conversation: a backend, its ledger, and tools of its own
pub struct Conversation<B> {
    backend: B,
    ledger: CallLedger,
    tools: Vec<Tool>,
}

impl<B: Backend> Conversation<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ledger: CallLedger::new(),
            tools: Vec::new(),
        }
    }

    /// Tools offered on every turn, ahead of the host's
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub const fn ledger(&self) -> &CallLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CallLedger {
        &mut self.ledger
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one turn for the host
    ///
    /// Returns `None` when the backend produced no reply at all.
    ///
    /// # Errors
    ///
    /// Returns every error of [`run_turn`], and [`Error::UnknownTool`] when a
    /// call left for the host matches no advertised tool by name and arity
    pub async fn respond(
        &mut self,
        items: &[HostItem],
        host_tools: &[Tool],
    ) -> Result<Option<TurnEvent>> {
        let tools: Vec<Tool> = self.tools.iter().chain(host_tools).cloned().collect();
        let transcript = build_transcript(items, &self.ledger)?;

        let segments = run_turn(&mut self.backend, &transcript, &tools).await?;

        match segments.as_slice() {
            [] => Ok(None),
            [only] if only.starts_with(TOOL_CALL_PREFIX) => {
                self.host_call(only, &tools).map(Some)
            }
            _ => Ok(Some(TurnEvent::Text(segments.join("\n")))),
        }
    }

    fn host_call(&mut self, reply: &str, tools: &[Tool]) -> Result<TurnEvent> {
        let invocation = protocol::parse_invocation(reply)?.ok_or_else(|| {
            Error::ProtocolViolation(format!("expected a tool-call, got: {reply}"))
        })?;

        let tool = tools
            .iter()
            .find(|t| {
                !t.is_executable()
                    && t.name == invocation.name
                    && t.parameters.len() == invocation.arguments.len()
            })
            .ok_or_else(|| Error::UnknownTool {
                name: invocation.name.clone(),
                call: invocation.call_text.clone(),
            })?;

        let arguments: serde_json::Map<String, serde_json::Value> = tool
            .parameters
            .iter()
            .zip(&invocation.arguments)
            .map(|(param, value)| {
                let json = if param.is_string() {
                    serde_json::Value::String(value.to_string())
                } else {
                    value.to_json()
                };
                (param.name.clone(), json)
            })
            .collect();

        let call_id = self.ledger.record(reply);
        tracing::info!(call_id = %call_id, tool = %tool.name, "handing tool call to host");

        Ok(TurnEvent::ToolCall {
            call_id,
            name: invocation.name,
            arguments: serde_json::to_string(&arguments)?,
        })
    }
}
