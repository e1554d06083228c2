//! LLM transport and agent loop

mod agent;
mod client;
mod error;
mod types;

pub use agent::{Agent, AgentResponse, AgentStep, LOOP_LIMIT_MESSAGE};
pub use client::{parse_model_names, ChatTransport, OllamaClient};
pub use error::LlmError;
pub use types::{ChatReply, Message, Role, TokenUsage};
