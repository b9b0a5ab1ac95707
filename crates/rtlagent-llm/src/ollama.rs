//! Client for an Ollama-style `/api/chat` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rtlagent_core::{GenerationRequest, Generator};

use crate::error::LlmError;
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Whole-request timeout. This is the only timeout in a run.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_HOST`, falling back to the local default.
    pub fn from_env() -> Self {
        match std::env::var("OLLAMA_HOST") {
            Ok(host) if !host.trim().is_empty() => Self::new(&host),
            _ => Self::default(),
        }
    }

    pub fn new(base_url: &str) -> Self {
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };
        OllamaConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

/// Non-streaming chat client.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("rtlagent/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(OllamaClient {
            config,
            http_client,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Whether the backend answers on its model-listing endpoint.
    pub async fn is_available(&self) -> bool {
        match self.http_client.get(self.config.url("/api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Send one system+user exchange and return the assistant text.
    pub async fn chat(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.params.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.params.temperature,
                num_predict: request.params.max_tokens,
            },
        };

        debug!(
            model = %request.params.model,
            prompt_chars = request.system.len() + request.user.len(),
            "sending chat request"
        );

        let response = self
            .http_client
            .post(self.config.url("/api/chat"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let content = parsed.message.map(|m| m.content).unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        info!(
            model = %request.params.model,
            completion_chars = content.len(),
            "chat completion received"
        );
        Ok(content)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn complete(&self, request: &GenerationRequest) -> rtlagent_core::Result<String> {
        Ok(self.chat(request).await?)
    }
}
