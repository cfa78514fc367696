//! Conversation content model
//!
//! A transcript is an ordered slice of [`ContentItem`]s. Insertion order is the
//! conversation order and is replayed verbatim to stateless backends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Speaker role of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
    Developer,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::Developer => "developer",
        }
    }

    /// Parse a role name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "system" => Some(Self::System),
            "assistant" => Some(Self::Assistant),
            "developer" => Some(Self::Developer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a content item
///
/// Only text payloads are sent to backends. Opaque payloads (images, audio
/// frames, structured host data) ride along in the transcript and are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
    Opaque {
        mime_type: String,
        data: serde_json::Value,
    },
}

/// One role-tagged item of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub role: Role,
    #[serde(flatten)]
    pub content: Content,
}

impl ContentItem {
    /// Create a text item
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text { text: text.into() },
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Text payload, if this is a text item
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            Content::Text { text } => Some(text),
            Content::Opaque { .. } => None,
        }
    }
}

/// Newest text item of a transcript, scanning backward
#[must_use]
pub fn newest_text(transcript: &[ContentItem]) -> Option<&str> {
    transcript.iter().rev().find_map(ContentItem::as_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in [Role::User, Role::System, Role::Assistant, Role::Developer] {
            assert_eq!(Role::from_name(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_name("SYSTEM"), Some(Role::System));
        assert_eq!(Role::from_name("tool"), None);
    }

    #[test]
    fn newest_text_skips_opaque_items() {
        let transcript = vec![
            ContentItem::user("first"),
            ContentItem::user("second"),
            ContentItem {
                role: Role::User,
                content: Content::Opaque {
                    mime_type: "image/png".into(),
                    data: serde_json::Value::Null,
                },
            },
        ];
        assert_eq!(newest_text(&transcript), Some("second"));
        assert_eq!(newest_text(&[]), None);
    }

    #[test]
    fn serializes_with_flat_kind_tag() {
        let item = ContentItem::assistant("hi");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "kind": "text", "text": "hi"})
        );
    }
}
