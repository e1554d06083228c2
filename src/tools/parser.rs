//! Extraction of tagged tool calls from model output
//!
//! Models running without native function calling are instructed to emit
//!
//! ```text
//! <tool_call>
//! {"name": "shell", "args": {"command": "ls"}}
//! </tool_call>
//! ```
//!
//! Anything that does not fit this shape is treated as plain text. A bad
//! payload is never an error: the reply simply becomes the final answer.

use serde_json::Value;

pub const TOOL_CALL_START: &str = "<tool_call>";
pub const TOOL_CALL_END: &str = "</tool_call>";

const EMPTY_ARGS: &str = "{}";

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// Compact JSON encoding of the arguments object
    pub args_json: String,
}

impl ToolCall {
    /// Arguments as a JSON value
    pub fn args(&self) -> Value {
        serde_json::from_str(&self.args_json).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Find the first tool call in `text`.
///
/// Only the first `<tool_call>` block is considered; later blocks in the
/// same reply are ignored.
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    let start = text.find(TOOL_CALL_START)? + TOOL_CALL_START.len();
    let end = start + text[start..].find(TOOL_CALL_END)?;
    let payload = text[start..end].trim();

    let value: Value = serde_json::from_str(payload).ok()?;
    let object = value.as_object()?;

    let name = object.get("name")?.as_str()?;
    if name.is_empty() {
        return None;
    }

    let args_json = match object.get("args") {
        None | Some(Value::Null) => EMPTY_ARGS.to_string(),
        Some(args) => serde_json::to_string(args).ok()?,
    };

    Some(ToolCall {
        name: name.to_string(),
        args_json,
    })
}
