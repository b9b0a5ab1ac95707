//! Error types for rtlagent-llm

use thiserror::Error;

/// Errors talking to the completion backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON shape.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned no message content.
    #[error("backend returned an empty completion")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

impl From<LlmError> for rtlagent_core::RtlAgentError {
    fn from(err: LlmError) -> Self {
        rtlagent_core::RtlAgentError::Generation(err.to_string())
    }
}
