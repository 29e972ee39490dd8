//! Tool execution context - shared HTTP client and tool settings

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::ToolsConfig;
use crate::error::{Result, TaskpilotError};

/// Execution context shared by every tool call in a run
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub http: Client,
    pub config: Arc<ToolsConfig>,
}

impl ToolContext {
    pub fn new(config: ToolsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms()))
            .build()
            .map_err(|e| TaskpilotError::Tool(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{name} is not configured")]
    MissingCredential { name: String },

    #[error("{0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Unknown tool: {0}")]
    Unknown(String),
}

impl ToolError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = ToolContext::new(ToolsConfig::default()).unwrap();
        assert_eq!(ctx.config.search.max_results, 5);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ToolError::missing("SERPAPI_API_KEY").to_string(),
            "SERPAPI_API_KEY is not configured"
        );
        assert_eq!(
            ToolError::Api {
                status: 404,
                body: "city not found".to_string()
            }
            .to_string(),
            "API error 404: city not found"
        );
        assert_eq!(
            ToolError::NotFound("Location not found: Atlantis".to_string()).to_string(),
            "Location not found: Atlantis"
        );
    }
}
