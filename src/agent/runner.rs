//! Shared tool-calling turn runner

use crate::content::ContentItem;
use crate::llm::Backend;
use crate::protocol::{self, Invocation};
use crate::tools::{self, Dispatch, Tool};
use crate::{Error, Result};

/// Result of dispatching one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// The tool ran; holds its result coerced to text
    Completed(String),
    /// The tool is advertised only; the caller must run the call
    Deferred,
}

/// System statement fed back to the backend after a tool call
#[must_use]
pub fn result_statement(reply: &str, result: &str) -> String {
    format!("The function result of {reply} is: {result}")
}

/// Resolve and run an invocation against the registry
///
/// # Errors
///
/// Returns [`Error::UnknownTool`] if no tool has the invocation's name, and
/// any error raised by the tool itself
pub async fn dispatch(tools: &[Tool], invocation: &Invocation) -> Result<Dispatched> {
    let tool = tools::resolve(tools, &invocation.name).ok_or_else(|| Error::UnknownTool {
        name: invocation.name.clone(),
        call: invocation.call_text.clone(),
    })?;

    match &tool.dispatch {
        Dispatch::Advertised => {
            tracing::debug!(tool = %tool.name, "tool is advertised only, deferring call to caller");
            Ok(Dispatched::Deferred)
        }
        Dispatch::Executable(function) => {
            tracing::info!(tool = %tool.name, call = %invocation.call_text, "calling tool");
            let result = function.call(&invocation.arguments).await?;
            Ok(Dispatched::Completed(result.to_string()))
        }
    }
}

/// Run one conversational turn to completion
///
/// Calls the backend until it replies with prose or with a call to an
/// advertised-only tool, running executable tools in between. Each tool call
/// appends an assistant echo of the call and a system result statement to a
/// working copy of `transcript`; the caller's transcript is never modified.
///
/// There is no bound on the number of tool rounds. Callers that need one
/// must impose it around this function.
///
/// # Errors
///
/// Returns protocol errors as soon as a reply breaks the single-call rule,
/// and backend and tool errors unchanged
pub async fn run_turn<B>(
    backend: &mut B,
    transcript: &[ContentItem],
    tools: &[Tool],
) -> Result<Vec<String>>
where
    B: Backend + ?Sized,
{
    let preamble = tools::describe(tools);
    let mut working = transcript.to_vec();
    let mut rounds = 0u32;

    loop {
        let segments = backend.send(&working, preamble.as_deref()).await?;

        let Some(reply) = protocol::find_invocation(&segments)? else {
            tracing::debug!(backend = backend.name(), rounds, "turn complete");
            return Ok(segments);
        };

        let Some(invocation) = protocol::parse_invocation(reply)? else {
            return Ok(segments);
        };

        match dispatch(tools, &invocation).await? {
            Dispatched::Deferred => return Ok(segments),
            Dispatched::Completed(result) => {
                let statement = result_statement(reply, &result);
                working.push(ContentItem::assistant(reply));
                working.push(ContentItem::system(statement));
                rounds += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Literal;

    fn invocation(name: &str) -> Invocation {
        Invocation {
            name: name.to_string(),
            arguments: vec![Literal::Int(2), Literal::Int(3)],
            call_text: format!("{name}(2,3)"),
        }
    }

    #[tokio::test]
    async fn dispatch_runs_executable_tool() {
        let tools = vec![Tool::from_fn("add", "Add.", |args: &[Literal]| {
            Ok(Literal::Int(args.iter().filter_map(Literal::as_i64).sum()))
        })];
        assert_eq!(
            dispatch(&tools, &invocation("add")).await.unwrap(),
            Dispatched::Completed("5".to_string())
        );
    }

    #[tokio::test]
    async fn dispatch_defers_advertised_tool() {
        let tools = vec![Tool::advertised("add", "Add.")];
        assert_eq!(
            dispatch(&tools, &invocation("add")).await.unwrap(),
            Dispatched::Deferred
        );
    }

    #[tokio::test]
    async fn dispatch_unknown_tool() {
        let err = dispatch(&[], &invocation("sub")).await.unwrap_err();
        match err {
            Error::UnknownTool { name, call } => {
                assert_eq!(name, "sub");
                assert_eq!(call, "sub(2,3)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn result_statement_wording() {
        assert_eq!(
            result_statement("TOOL-CALL: add(2,3)", "5"),
            "The function result of TOOL-CALL: add(2,3) is: 5"
        );
    }
}
