//! Text-generation capability used to draft harnesses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Result;

pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Sampling parameters passed with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            params,
        }
    }
}

/// A request/response completion backend.
///
/// Implementations report transport or backend failures as
/// [`RtlAgentError::Generation`](crate::domain::RtlAgentError::Generation).
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String>;
}
