//! Agent loop for handling conversations with tool execution
//!
//! Each `chat` call runs a bounded state machine:
//!
//! ```text
//! AwaitingReply -> ToolDetected -> (execute) -> AwaitingReply
//!               -> NoTool -> Done
//! ```
//!
//! The loop owns its message list and step trace; the only state shared
//! between invocations is the selected model name.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::client::ChatTransport;
use super::error::LlmError;
use super::types::{ChatReply, Message};
use crate::config::AgentRuntimeConfig;
use crate::context::ContextInfo;
use crate::prompts;
use crate::tools::{parse_tool_call, ToolExecutor};

/// Final text returned when the loop cap is hit before a plain answer
pub const LOOP_LIMIT_MESSAGE: &str =
    "Stopped after too many tool calls without a final answer (loop limit reached).";

/// One executed tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStep {
    pub tool: String,
    /// Compact JSON arguments as sent to the executor
    pub args: String,
    pub result: String,
    pub duration_ms: u64,
}

/// Outcome of a chat invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    pub text: String,
    pub steps: Vec<AgentStep>,
    /// Token accounting for the last exchange
    pub context: ContextInfo,
}

/// Agent driving a local model through tagged tool calls.
///
/// A single instance is meant to be shared (e.g. behind an `Arc`); `chat`
/// takes `&self` and concurrent invocations do not interfere.
///
/// Dropping a `chat` future cancels it: the in-flight request or tool call
/// is abandoned and no further iterations run.
pub struct Agent {
    config: AgentRuntimeConfig,
    transport: Arc<dyn ChatTransport>,
    tools: Arc<dyn ToolExecutor>,
    model: RwLock<String>,
}

impl Agent {
    pub fn new(
        config: AgentRuntimeConfig,
        transport: Arc<dyn ChatTransport>,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        let model = RwLock::new(config.model.clone());
        Self {
            config,
            transport,
            tools,
            model,
        }
    }

    /// Switch the model used by subsequent `chat` calls
    pub async fn set_model(&self, name: impl Into<String>) {
        let name = name.into();
        info!("Switching model to {}", name);
        *self.model.write().await = name;
    }

    /// Currently selected model
    pub async fn model(&self) -> String {
        self.model.read().await.clone()
    }

    /// Models installed on the inference server; empty if they can't be listed
    pub async fn available_models(&self) -> Vec<String> {
        self.transport.list_models().await
    }

    fn system_prompt(&self, agent_mode: bool) -> String {
        if agent_mode {
            prompts::agent_prompt(&self.tools.tools())
        } else {
            prompts::ASSISTANT_PROMPT.to_string()
        }
    }

    fn context_info(&self, messages: &[Message], reply: &ChatReply) -> ContextInfo {
        match reply.usage {
            Some(usage) => ContextInfo::from_usage(usage, self.config.context_window),
            None => ContextInfo::estimated(messages, &reply.content, self.config.context_window),
        }
    }

    /// Send `message` after `history` and run the tool loop to completion.
    ///
    /// With `agent_mode` off the first reply is returned verbatim. A transport
    /// failure aborts the whole invocation; steps recorded so far are dropped.
    pub async fn chat(
        &self,
        message: &str,
        history: &[Message],
        agent_mode: bool,
    ) -> Result<AgentResponse, LlmError> {
        let model = self.model().await;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt(agent_mode)));
        messages.extend_from_slice(history);
        messages.push(Message::user(message));

        let mut steps = Vec::new();

        for iteration in 1..=self.config.max_loops {
            debug!(
                "Agent iteration {}/{}: model={}, messages={}",
                iteration,
                self.config.max_loops,
                model,
                messages.len()
            );

            let reply = match self.transport.send_chat(&model, &messages).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("Chat request failed: {}", e);
                    return Err(e);
                },
            };

            let call = if agent_mode {
                parse_tool_call(&reply.content)
            } else {
                None
            };

            let Some(call) = call else {
                let context = self.context_info(&messages, &reply);
                info!(
                    "Agent finished after {} tool call(s). {}",
                    steps.len(),
                    context.format_log()
                );
                return Ok(AgentResponse {
                    text: reply.content,
                    steps,
                    context,
                });
            };

            info!("Tool call: {} args={}", call.name, call.args_json);
            messages.push(Message::assistant(reply.content));

            let started = Instant::now();
            let result = self.tools.execute(&call.name, &call.args_json).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            debug!("Tool {} finished in {}ms", call.name, duration_ms);

            messages.push(Message::tool_result(&result));
            steps.push(AgentStep {
                tool: call.name,
                args: call.args_json,
                result,
                duration_ms,
            });
        }

        info!("Agent hit loop limit ({} iterations)", self.config.max_loops);
        let context = ContextInfo::estimated(&messages, "", self.config.context_window);
        Ok(AgentResponse {
            text: LOOP_LIMIT_MESSAGE.to_string(),
            steps,
            context,
        })
    }
}
