//! Kobold - an agent loop for local LLM inference servers
//!
//! The agent talks to an Ollama-compatible endpoint, watches replies for
//! `<tool_call>` blocks, runs the requested tool and feeds the result back
//! until the model answers in plain text or the loop cap is reached.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kobold::{Agent, AgentRuntimeConfig, ClientConfig, OllamaClient, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OllamaClient::new(&ClientConfig::default())?;
//!     let agent = Agent::new(
//!         AgentRuntimeConfig::default(),
//!         Arc::new(client),
//!         Arc::new(ToolRegistry::default()),
//!     );
//!
//!     let response = agent.chat("What's in the current directory?", &[], true).await?;
//!     for step in &response.steps {
//!         eprintln!("{}({}) took {}ms", step.tool, step.args, step.duration_ms);
//!     }
//!     println!("{}", response.text);
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod llm;
mod prompts;
mod tools;

// Re-export the public API
pub use config::{AgentRuntimeConfig, ClientConfig, Config, ToolsConfig};
pub use context::{estimate_message_tokens, estimate_tokens, usage_percent, ContextInfo};
pub use llm::{
    parse_model_names, Agent, AgentResponse, AgentStep, ChatReply, ChatTransport, LlmError,
    Message, OllamaClient, Role, TokenUsage, LOOP_LIMIT_MESSAGE,
};
pub use tools::{
    parse_tool_call, ReadFileTool, ShellTool, Tool, ToolCall, ToolExecutor, ToolRegistry,
    ToolResult, ToolSpec, TOOL_CALL_END, TOOL_CALL_START,
};
