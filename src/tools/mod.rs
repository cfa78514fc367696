//! Tool registry and description codec
//!
//! A registry is an ordered slice of [`Tool`]s supplied fresh for each turn.
//! Each tool is either executable (holds a [`ToolFunction`]) or advertised
//! only, in which case a call to it is handed back to the caller.

mod builtin;
mod schema;

pub use builtin::demo_tools;
pub use schema::advertised_tool;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::{Literal, TOOL_CALL_PREFIX};
use crate::Result;

/// Parameter type tag for string arguments
pub const STRING_TYPE: &str = "string";

/// A positional tool parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    /// Open type tag (`"string"`, `"number"`, ...), only used for quoting
    pub type_tag: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            type_tag: type_tag.into(),
        }
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.type_tag == STRING_TYPE
    }
}

/// Callable behind an executable tool
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// Invoke with positional literal arguments
    ///
    /// # Errors
    ///
    /// Returns error if the call fails; the failure ends the turn
    async fn call(&self, arguments: &[Literal]) -> Result<Literal>;
}

/// Adapter for plain synchronous closures
struct FnTool<F>(F);

#[async_trait]
impl<F> ToolFunction for FnTool<F>
where
    F: Fn(&[Literal]) -> Result<Literal> + Send + Sync,
{
    async fn call(&self, arguments: &[Literal]) -> Result<Literal> {
        (self.0)(arguments)
    }
}

/// How a tool is dispatched
#[derive(Clone)]
pub enum Dispatch {
    /// Run in-process
    Executable(Arc<dyn ToolFunction>),
    /// Described to the backend only; an outer layer runs the call
    Advertised,
}

/// An invocable capability
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub dispatch: Dispatch,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("executable", &self.is_executable())
            .finish()
    }
}

impl Tool {
    /// Create an advertised-only tool with no parameters
    pub fn advertised(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            dispatch: Dispatch::Advertised,
        }
    }

    /// Create an executable tool from a synchronous closure
    pub fn from_fn<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Literal]) -> Result<Literal> + Send + Sync + 'static,
    {
        Self::advertised(name, description).with_function(Arc::new(FnTool(f)))
    }

    /// Attach a callable, making the tool executable
    #[must_use]
    pub fn with_function(mut self, function: Arc<dyn ToolFunction>) -> Self {
        self.dispatch = Dispatch::Executable(function);
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        self.parameters.push(Parameter::new(name, description, type_tag));
        self
    }

    #[must_use]
    pub const fn is_executable(&self) -> bool {
        matches!(self.dispatch, Dispatch::Executable(_))
    }

    /// Prototype as shown to the backend: `name(p1,p2)`
    #[must_use]
    pub fn prototype(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Render the instruction preamble for a registry
///
/// Returns `None` for an empty registry. The wording is fixed; backends are
/// tuned against it.
#[must_use]
pub fn describe(tools: &[Tool]) -> Option<String> {
    if tools.is_empty() {
        return None;
    }

    let mut text = String::from("You are an assistant with access to the following functions:\n\n");

    for (i, tool) in tools.iter().enumerate() {
        text.push_str(&format!(
            "{}. The function prototype is: {} and the function description is: {}\n",
            i + 1,
            tool.prototype(),
            tool.description
        ));
    }

    text.push_str(&format!(
        "\nAlways indicate when you want to call a function by writing: \"{TOOL_CALL_PREFIX} function_name(parameters)\"\n"
    ));
    text.push_str("Do not combine function calls and text responses in the same output: either only function calls or only text responses.\n");
    text.push_str("For any string parameters, be sure to enclose each of them in double quotes.");

    Some(text)
}

/// Find a tool by exact, case-sensitive name; the first match wins
#[must_use]
pub fn resolve<'a>(tools: &'a [Tool], name: &str) -> Option<&'a Tool> {
    let mut matches = tools.iter().filter(|t| t.name == name);
    let found = matches.next()?;
    if matches.next().is_some() {
        tracing::debug!(tool = %name, "duplicate tool name, using first registration");
    }
    Some(found)
}
