//! Ollama-compatible chat client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::error::LlmError;
use super::types::*;
use crate::config::ClientConfig;

const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";

/// Request/response boundary to the inference backend
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the full conversation and return the model's reply
    async fn send_chat(&self, model: &str, messages: &[Message]) -> Result<ChatReply, LlmError>;

    /// Installed model names, sorted. Empty on any failure.
    async fn list_models(&self) -> Vec<String>;
}

/// Client for a local Ollama-style server
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
    temperature: f32,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, TAGS_PATH))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(LlmError::Status { status, body });
        }

        parse_model_names(&body)
    }
}

/// Decode a `/api/tags` body into lexicographically sorted model names
pub fn parse_model_names(body: &str) -> Result<Vec<String>, LlmError> {
    let tags: TagsResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Decode(e.to_string()))?;
    let mut names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
    names.sort();
    Ok(names)
}

#[async_trait]
impl ChatTransport for OllamaClient {
    async fn send_chat(&self, model: &str, messages: &[Message]) -> Result<ChatReply, LlmError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        debug!("POST {} model={} messages={}", CHAT_PATH, model, messages.len());
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, CHAT_PATH))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(parsed.into())
    }

    async fn list_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and hand back the raw request
    async fn serve_once(status_line: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn client(base_url: &str) -> OllamaClient {
        OllamaClient::new(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_model_names_sorted() {
        let names = parse_model_names(r#"{"models":[{"name":"b"},{"name":"a"}]}"#).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_model_names_rejects_bad_shape() {
        assert!(parse_model_names(r#"{"models":[{"id":"a"}]}"#).is_err());
        assert!(parse_model_names("not json").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_send_chat_success() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"message":{"role":"assistant","content":"hello there"},"done":true}"#,
        )
        .await;

        let reply = client(&url)
            .send_chat("llama3", &[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply.content, "hello there");
        assert_eq!(reply.usage, None);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/chat "));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["model"], "llama3");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert!((value["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_send_chat_non_200_carries_body() {
        let (url, _server) = serve_once("404 Not Found", r#"{"error":"model 'x' not found"}"#).await;

        let err = client(&url)
            .send_chat("x", &[Message::user("hi")])
            .await
            .unwrap_err();
        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("model 'x' not found"));
            },
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_chat_schema_mismatch() {
        let (url, _server) = serve_once("200 OK", r#"{"done":true}"#).await;

        let err = client(&url)
            .send_chat("llama3", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
    }

    #[tokio::test]
    async fn test_list_models_over_http() {
        let (url, server) =
            serve_once("200 OK", r#"{"models":[{"name":"qwen2"},{"name":"llama3"}]}"#).await;

        let names = client(&url).list_models().await;
        assert_eq!(names, vec!["llama3".to_string(), "qwen2".to_string()]);
        assert!(server.await.unwrap().starts_with("GET /api/tags "));
    }

    #[tokio::test]
    async fn test_list_models_fail_soft() {
        let (url, _server) = serve_once("500 Internal Server Error", "boom").await;
        assert!(client(&url).list_models().await.is_empty());

        // Nothing listening on this port once the listener is dropped
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert!(client(&format!("http://{}", addr)).list_models().await.is_empty());
    }
}
