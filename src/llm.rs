use crate::types::{DigestError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One completion request: prompt text, bounded output size, and a
/// temperature setting (kept low for consistency over creativity).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for LLM backends that can answer a single prompt with a single
/// text blob.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Backend name for log lines.
    fn name(&self) -> &str;

    /// Perform one blocking completion call.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Anthropic messages-API client. The API key and model are passed in
/// explicitly; there is no ambient credential state.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            api_key,
            model,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(DigestError::LlmInvocation(
                "no API key configured".to_string(),
            ));
        }

        debug!(
            "Calling {} with a {}-char prompt",
            self.model,
            request.prompt.len()
        );

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| DigestError::LlmInvocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DigestError::LlmInvocation(format!(
                "API returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DigestError::LlmInvocation(e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.clone())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DigestError::LlmInvocation(
                "response carried no text content".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Canned-reply client for tests and local runs. Records the prompts it
/// was asked to complete.
pub struct MockLlmClient {
    reply: Result<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(DigestError::LlmInvocation(message.into())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("poisoned prompt log").clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.prompts
            .lock()
            .expect("poisoned prompt log")
            .push(request.prompt);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(DigestError::LlmInvocation(msg)) => {
                Err(DigestError::LlmInvocation(msg.clone()))
            }
            Err(_) => Err(DigestError::LlmInvocation("mock failure".to_string())),
        }
    }
}
