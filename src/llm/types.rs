//! Message and payload types for the local inference API

use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    /// Create a user message carrying a tool result in the `<tool_result>` envelope
    pub fn tool_result(result: &str) -> Self {
        Self::user(format!("<tool_result>\n{}\n</tool_result>", result))
    }
}

/// Sampling options sent with every chat request
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
}

/// `POST /api/chat` request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    pub options: ChatOptions,
}

/// `POST /api/chat` response body
///
/// Only the fields we consume are declared; everything else the server
/// sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

impl ChatResponse {
    /// Provider-reported token counts, if the server sent both of them
    pub fn usage(&self) -> Option<TokenUsage> {
        match (self.prompt_eval_count, self.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt as usize,
                completion_tokens: completion as usize,
            }),
            _ => None,
        }
    }
}

/// `GET /api/tags` response body
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Authoritative token counts reported by the inference server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// A single reply from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl ChatReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        let usage = response.usage();
        Self {
            content: response.message.content,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_tool_result_envelope() {
        let msg = Message::tool_result("42");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "<tool_result>\n42\n</tool_result>");
    }

    #[test]
    fn test_serialize_request() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let request = ChatRequest {
            model: "llama3",
            messages: &messages,
            stream: false,
            options: ChatOptions { temperature: 0.5 },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "llama3",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ],
                "stream": false,
                "options": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn test_deserialize_chat_response() {
        let body = r#"{
            "model": "llama3",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "Paris"},
            "done": true,
            "prompt_eval_count": 26,
            "eval_count": 3
        }"#;

        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let reply = ChatReply::from(response);
        assert_eq!(reply.content, "Paris");
        assert_eq!(
            reply.usage,
            Some(TokenUsage {
                prompt_tokens: 26,
                completion_tokens: 3
            })
        );
    }

    #[test]
    fn test_partial_counts_are_not_usage() {
        let body = r#"{"message": {"content": "ok"}, "eval_count": 3}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.usage(), None);
    }

    #[test]
    fn test_missing_content_is_rejected() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"message": {"role": "assistant"}}"#).is_err());
        assert!(serde_json::from_str::<ChatResponse>(r#"{"message": {"content": 7}}"#).is_err());
        assert!(serde_json::from_str::<ChatResponse>(r#"{"done": true}"#).is_err());
    }
}
