//! Transport-level failures

use reqwest::StatusCode;

/// Errors surfaced by a chat transport.
///
/// Any of these aborts the current `chat` invocation; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The request never produced a response (unreachable, timeout, bad URL)
    #[error("request to inference endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with something other than 200
    #[error("inference endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A 200 response whose body did not match the expected schema
    #[error("malformed response from inference endpoint: {0}")]
    Decode(String),
}
