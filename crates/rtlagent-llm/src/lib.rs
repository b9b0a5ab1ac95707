//! rtlagent-llm: text-generation backends for RTL Agent.
//!
//! Provides an HTTP client for Ollama's chat API that implements the core
//! [`rtlagent_core::Generator`] trait.

pub mod error;
pub mod ollama;

pub use error::LlmError;
pub use ollama::{OllamaClient, OllamaConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Result type for rtlagent-llm operations.
pub type Result<T> = std::result::Result<T, LlmError>;
