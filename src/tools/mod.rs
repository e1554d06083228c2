//! Tool execution boundary
//!
//! The agent loop only sees [`ToolExecutor`]: a name plus a JSON argument
//! string in, result text out. [`ToolRegistry`] is the stock executor,
//! dispatching to individual [`Tool`] implementations.

mod parser;
mod read_file;
mod shell;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

pub use parser::{parse_tool_call, ToolCall, TOOL_CALL_END, TOOL_CALL_START};
pub use read_file::ReadFileTool;
pub use shell::ShellTool;

/// Description of a tool, rendered into the agent system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON example of the accepted `args` object
    pub parameters: String,
}

/// Executes tool calls on behalf of the agent loop.
///
/// Failures are reported inside the returned text; the loop feeds whatever
/// comes back to the model as-is.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, args_json: &str) -> String;

    /// Tools to advertise in the system prompt
    fn tools(&self) -> Vec<ToolSpec> {
        Vec::new()
    }
}

/// Result of a single tool run
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A single named action the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Example `args` object
    fn parameters(&self) -> serde_json::Value;

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult>;
}

/// Registry of available tools
#[derive(Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the built-in tools
    pub fn new(shell_timeout_secs: u64) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ShellTool::with_timeout(shell_timeout_secs)));
        registry.register(Arc::new(ReadFileTool));
        registry
    }

    pub fn empty() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Keep only the named tools
    pub fn retain(mut self, enabled: &[String]) -> Self {
        self.tools.retain(|name, _| enabled.iter().any(|e| e == name));
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(ShellTool::DEFAULT_TIMEOUT_SECS)
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, args_json: &str) -> String {
        let Some(tool) = self.get(name) else {
            warn!("Model requested unknown tool: {}", name);
            return format!("Error: unknown tool '{}'", name);
        };

        let params: serde_json::Value = match serde_json::from_str(args_json) {
            Ok(params) => params,
            Err(e) => return format!("Error: invalid arguments for {}: {}", name, e),
        };

        debug!("Executing tool {} params={}", name, args_json);
        match tool.execute(params).await {
            Ok(result) if result.is_error => format!("Error: {}", result.content),
            Ok(result) => result.content,
            Err(e) => {
                warn!("Tool {} failed: {:#}", name, e);
                format!("Error: {:#}", e)
            },
        }
    }

    fn tools(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters().to_string(),
            })
            .collect()
    }
}
