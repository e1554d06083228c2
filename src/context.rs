//! Context window accounting
//!
//! Local servers do not always report token counts, so we fall back to a
//! character-based heuristic (roughly 3.5 characters per token). The numbers
//! are for display only and never drive the agent loop.

use serde::Serialize;

use crate::llm::{Message, TokenUsage};

/// Fixed per-message overhead for role markers and separators
const MESSAGE_OVERHEAD: usize = 4;

/// Fixed overhead for the chat template wrapping the whole list
const FORMAT_OVERHEAD: usize = 2;

/// Estimate the token count of a piece of text.
///
/// `ceil(chars / 3.5)`, and at least 1 for any non-empty text.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    if chars == 0 {
        return 0;
    }
    // ceil(chars / 3.5) == ceil(2 * chars / 7)
    ((chars * 2).div_ceil(7)).max(1)
}

/// Estimate the token count of a full message list
pub fn estimate_message_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| MESSAGE_OVERHEAD + estimate_tokens(&m.content) + estimate_tokens(m.role.as_str()))
        .sum::<usize>()
        + FORMAT_OVERHEAD
}

/// Fraction of the window used, clamped to `[0, 1]`
pub fn usage_percent(tokens: usize, window_size: usize) -> f64 {
    if window_size == 0 {
        return 0.0;
    }
    (tokens as f64 / window_size as f64).min(1.0)
}

/// Snapshot of context window consumption.
///
/// Fields are declared in key order so serialized output is sorted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextInfo {
    pub completion_tokens: usize,
    #[serde(rename = "context_window")]
    pub context_window_size: usize,
    pub is_estimated: bool,
    pub prompt_tokens: usize,
    pub total_tokens: usize,
    pub usage_percent: f64,
}

impl ContextInfo {
    pub fn new(
        prompt_tokens: usize,
        completion_tokens: usize,
        context_window_size: usize,
        is_estimated: bool,
    ) -> Self {
        let total_tokens = prompt_tokens + completion_tokens;
        Self {
            completion_tokens,
            context_window_size,
            is_estimated,
            prompt_tokens,
            total_tokens,
            usage_percent: usage_percent(total_tokens, context_window_size),
        }
    }

    /// Heuristic counts for a prompt and the reply it produced
    pub fn estimated(messages: &[Message], reply: &str, context_window_size: usize) -> Self {
        Self::new(
            estimate_message_tokens(messages),
            estimate_tokens(reply),
            context_window_size,
            true,
        )
    }

    /// Counts reported by the inference server
    pub fn from_usage(usage: TokenUsage, context_window_size: usize) -> Self {
        Self::new(
            usage.prompt_tokens,
            usage.completion_tokens,
            context_window_size,
            false,
        )
    }

    /// One-line summary for logs and the status line
    pub fn format_log(&self) -> String {
        format!(
            "Context: {}/{} tokens ({:.1}%{}), prompt: {}, completion: {}",
            self.total_tokens,
            self.context_window_size,
            self.usage_percent * 100.0,
            if self.is_estimated { ", estimated" } else { "" },
            self.prompt_tokens,
            self.completion_tokens
        )
    }
}
