//! Conversion of JSON-schema function definitions into advertised tools
//!
//! Host frameworks (MCP servers, agent SDKs) describe their functions with a
//! JSON schema. Those functions run outside this process, so they become
//! advertised-only tools.

use serde_json::Value;

use super::{Parameter, Tool};

/// Type tag used when a property declares no type
const UNTYPED: &str = "any";

/// Build an advertised-only tool from a JSON-schema function definition
///
/// Parameters follow the order of `schema.properties`. A property's `title`
/// is its description, falling back to its name. An empty description falls
/// back to the tool name.
#[must_use]
pub fn advertised_tool(name: &str, description: Option<&str>, schema: &Value) -> Tool {
    let description = match description {
        Some(d) if !d.is_empty() => d,
        _ => name,
    };

    let parameters = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .map(|(key, property)| {
                    let title = property
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(key.as_str());
                    let type_tag = property
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or(UNTYPED);
                    Parameter::new(key.as_str(), title, type_tag)
                })
                .collect()
        })
        .unwrap_or_default();

    Tool {
        parameters,
        ..Tool::advertised(name, description)
    }
}
