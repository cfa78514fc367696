//! Parley - Text-protocol tool calling for chat backends
//!
//! This library lets a model that has no native function-calling API use
//! tools anyway:
//! - A preamble tells the model which tools exist and how to call them
//! - Replies are scanned for a single `TOOL-CALL: name(args)` line
//! - Executable tools run locally and their results are fed back
//! - Calls to advertised-only tools are handed back to the caller
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Host framework                       │
//! │        bridge::Conversation  │  CallLedger          │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               agent::run_turn                        │
//! │   tools::describe  │  protocol  │  tools::dispatch  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                llm::Backend                          │
//! │   StatelessBackend (chat)  │  SessionBackend        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod bridge;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod protocol;
pub mod tools;
pub mod voice;

pub use agent::run_turn;
pub use bridge::{CallLedger, Conversation, HostItem, TurnEvent};
pub use config::Config;
pub use content::{Content, ContentItem, Role};
pub use error::{Error, Result};
pub use llm::{Backend, SessionBackend, StatelessBackend};
pub use protocol::{Invocation, Literal};
pub use tools::{Parameter, Tool};
pub use voice::{AudioCache, AudioKey};
