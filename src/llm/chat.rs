//! OpenAI-compatible chat completions client
//!
//! Defaults point at Groq's OpenAI endpoint, but any provider speaking the
//! `/chat/completions` dialect works.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::error::{Result, TaskpilotError};
use crate::llm::client::LlmClient;
use crate::llm::response::{api_error_message, parse_response};
use crate::llm::types::{CompletionRequest, CompletionResponse, Message, Usage};

/// Configuration for the chat client
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for ChatConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Chat completions API client
pub struct ChatClient {
    client: Client,
    api_key: String,
    config: ChatConfig,
    usage: Arc<Mutex<Usage>>,
}

impl ChatClient {
    /// Create a client from the `llm` config section
    ///
    /// Reads the API key from the config or from its environment variable
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| TaskpilotError::Config(format!("{} not set", config.api_key_env)))?;

        Self::with_api_key(api_key, ChatConfig::from(config))
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TaskpilotError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Build the request body for the chat completions API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let model = request.model.as_ref().unwrap_or(&self.config.model).clone();
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);
        let messages: Vec<Value> = request.messages.iter().map(Message::to_wire).collect();

        json!({
            "model": model,
            "messages": messages,
            "max_completion_tokens": max_tokens,
        })
    }

    /// Send a request to the chat completions API
    async fn send_request(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TaskpilotError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(TaskpilotError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TaskpilotError::Llm(format!(
                "API error {}: {}",
                status,
                api_error_message(&error_body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TaskpilotError::Llm(format!("Failed to parse response: {}", e)))
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LlmClient for ChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        log::debug!(
            "Sending {} messages to {} ({})",
            request.messages.len(),
            self.endpoint(),
            body["model"]
        );

        let raw = self.send_request(body).await?;
        let response = parse_response(&raw)?;

        {
            let mut total = self.usage.lock().unwrap_or_else(|e| e.into_inner());
            total.add(&response.usage);
        }

        if response.finish_reason.is_truncated() {
            log::warn!("Completion hit the token limit; reply may be cut off");
        }

        Ok(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
