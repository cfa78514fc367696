//! Error types for Parley

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a conversational turn
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The tool-call marker appeared more than once in a reply segment,
    /// or somewhere other than the start of the segment
    #[error("unexpectedly received a reply with an embedded tool-call: {0}")]
    EmbeddedInvocation(String),

    /// More than one invocation segment, or an invocation mixed with prose
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Call text is not a valid `name(literal, ...)` expression
    #[error("invalid tool-call: {text}")]
    InvalidInvocation {
        /// Offending call text
        text: String,
        /// What the parser tripped over
        reason: String,
    },

    /// Parsed function name is not in the registry
    #[error("unknown function name: {name} in tool-call reply: {call}")]
    UnknownTool {
        /// Function name from the call
        name: String,
        /// Raw call text
        call: String,
    },

    /// A tool callable failed
    #[error("tool error: {0}")]
    Tool(String),

    /// Backend API returned an error status or an unusable reply
    #[error("backend error: {0}")]
    Backend(String),

    /// Session handle could not be created or is no longer valid
    #[error("session error: {0}")]
    Session(String),

    /// Audio cache error
    #[error("cache error: {0}")]
    Cache(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error means the backend broke the single-call protocol
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::EmbeddedInvocation(_) | Self::ProtocolViolation(_))
    }
}
