//! Plain-text tool-call protocol
//!
//! A backend asks for a function call by replying with a segment that starts
//! with [`TOOL_CALL_PREFIX`] followed by `name(literal, ...)`. A turn is either
//! all prose or exactly one call; anything in between is rejected.

mod literal;

pub use literal::{Literal, parse_call, parse_literal};

use crate::{Error, Result};

/// Marker that flags an invocation segment
pub const TOOL_CALL_PREFIX: &str = "TOOL-CALL:";

/// A parsed request to call a tool with literal arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Function name
    pub name: String,
    /// Positional arguments in source order
    pub arguments: Vec<Literal>,
    /// Call expression with the marker and surrounding whitespace stripped
    pub call_text: String,
}

impl Invocation {
    /// Render the call in the documented syntax, without the marker
    #[must_use]
    pub fn to_call_text(&self) -> String {
        let args: Vec<String> = self.arguments.iter().map(Literal::to_source).collect();
        format!("{}({})", self.name, args.join(","))
    }

    /// Render the call as a full invocation segment
    #[must_use]
    pub fn to_segment(&self) -> String {
        format!("{TOOL_CALL_PREFIX} {}", self.to_call_text())
    }
}

/// Check one reply segment for an invocation
///
/// Returns `false` for plain text and `true` for a well-placed marker.
///
/// # Errors
///
/// Returns [`Error::EmbeddedInvocation`] if the marker occurs twice, or
/// anywhere other than the very first character of the segment (leading
/// whitespace included).
pub fn is_invocation(segment: &str) -> Result<bool> {
    if !segment.contains(TOOL_CALL_PREFIX) {
        return Ok(false);
    }

    if !segment.starts_with(TOOL_CALL_PREFIX) || segment[1..].contains(TOOL_CALL_PREFIX) {
        return Err(Error::EmbeddedInvocation(segment.to_string()));
    }

    Ok(true)
}

/// Find the single invocation segment of a turn, if any
///
/// # Errors
///
/// Returns [`Error::EmbeddedInvocation`] for a malformed segment and
/// [`Error::ProtocolViolation`] when more than one segment is a call or a
/// call shares the turn with prose.
pub fn find_invocation(segments: &[String]) -> Result<Option<&str>> {
    let mut calls = 0usize;
    for segment in segments {
        if is_invocation(segment)? {
            calls += 1;
        }
    }

    if calls > 1 || (calls == 1 && segments.len() > 1) {
        return Err(Error::ProtocolViolation(format!(
            "unexpected number of reply segments for a tool-call: {calls} call(s) in {} segment(s)",
            segments.len()
        )));
    }

    if calls == 0 {
        return Ok(None);
    }

    Ok(segments.first().map(String::as_str))
}

/// Parse a reply segment into an [`Invocation`]
///
/// Returns `None` when the segment is plain text.
///
/// # Errors
///
/// Returns [`Error::EmbeddedInvocation`] for a misplaced or repeated marker
/// and [`Error::InvalidInvocation`] when the call is not `name(literals...)`.
pub fn parse_invocation(segment: &str) -> Result<Option<Invocation>> {
    if !is_invocation(segment)? {
        return Ok(None);
    }

    let call_text = segment[TOOL_CALL_PREFIX.len()..].trim();
    let (name, arguments) = parse_call(call_text).map_err(|reason| Error::InvalidInvocation {
        text: call_text.to_string(),
        reason,
    })?;

    Ok(Some(Invocation {
        name,
        arguments,
        call_text: call_text.to_string(),
    }))
}
